use clap::Parser;

/// Command-line options for the headless simulation driver.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, default_value_t = 15)]
    pub rows: usize,

    #[arg(long, default_value_t = 20)]
    pub cols: usize,

    #[arg(long, default_value_t = 40)]
    pub num_walls: usize,

    /// Toggle a random cell every this many iterations (0 disables edits).
    #[arg(long, default_value_t = 3)]
    pub edit_interval: usize,

    /// Seed for world generation; random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Use the 8-connected action set instead of the cardinal one.
    #[arg(long, default_value_t = false)]
    pub diagonal: bool,

    /// Skip the per-move grid rendering.
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}
