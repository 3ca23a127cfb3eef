use clap::Parser;

use incremental_pathfinding::config::Config;
use incremental_pathfinding::simulation::Simulation;

fn main() {
    tracing_subscriber::fmt::init();
    let config = Config::parse();

    println!("Starting incremental replanning simulation...");
    println!("Grid size: {}x{}", config.rows, config.cols);
    println!("Walls: {}", config.num_walls);
    println!(
        "Action set: {}",
        if config.diagonal { "diagonal" } else { "cardinal" }
    );
    if config.edit_interval > 0 {
        println!("World edit every {} iterations", config.edit_interval);
    } else {
        println!("World edits disabled");
    }
    println!();

    match Simulation::new(config) {
        Ok(mut simulation) => {
            let stats = simulation.run();
            println!("=== FINAL RESULTS ===");
            println!("{}", stats);
        }
        Err(e) => {
            eprintln!("Failed to set up simulation: {}", e);
            std::process::exit(1);
        }
    }
}
