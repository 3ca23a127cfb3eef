use pathfinding::prelude::astar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use tracing::info;

use crate::config::Config;
use crate::grid::Position;
use crate::planner::{ActionSet, Planner, PlannerConfig, PlannerError};
use crate::statistics::Statistics;

/// Headless driver: walks an agent across a randomly generated world while
/// cells toggle around it, exercising incremental replanning the way an
/// interactive front end would.
#[derive(Debug)]
pub struct Simulation {
    planner: Planner,
    config: Config,
    actions: ActionSet,
    start: Position,
    goal: Position,
    walls: FxHashSet<Position>,
    dynamic_edits: FxHashSet<Position>,
    rng: StdRng,
    stats: Statistics,
}

impl Simulation {
    pub fn new(config: Config) -> Result<Self, PlannerError> {
        let (rows, cols) = (config.rows, config.cols);
        if rows == 0 || cols == 0 {
            return Err(PlannerError::InvalidDimensions { rows, cols });
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // Start in the upper-left quadrant, goal in the lower-right.
        let start = Position::new(
            rng.gen_range(0..(rows / 2).max(1)),
            rng.gen_range(0..(cols / 2).max(1)),
        );
        let goal = Position::new(rng.gen_range(rows / 2..rows), rng.gen_range(cols / 2..cols));

        let mut walls = FxHashSet::default();
        let mut placed = 0;
        let mut attempts = 0;
        while placed < config.num_walls && attempts < config.num_walls * 3 {
            let cell = Position::new(rng.gen_range(0..rows), rng.gen_range(0..cols));
            if cell != start && cell != goal && !walls.contains(&cell) {
                walls.insert(cell);
                placed += 1;
            }
            attempts += 1;
        }

        let actions = if config.diagonal {
            ActionSet::Diagonal
        } else {
            ActionSet::Cardinal
        };
        let mut planner_config = PlannerConfig::new((rows, cols), start, goal);
        planner_config.action_set = actions;
        let mut planner = Planner::new(planner_config)?;
        for &wall in &walls {
            planner.block(wall);
        }

        Ok(Simulation {
            planner,
            config,
            actions,
            start,
            goal,
            walls,
            dynamic_edits: FxHashSet::default(),
            rng,
            stats: Statistics::default(),
        })
    }

    /// Runs the agent until it reaches the goal, gets permanently stuck, or
    /// the iteration cap trips. Returns the collected statistics.
    pub fn run(&mut self) -> &Statistics {
        self.stats.optimal_path_length = self.optimal_path_length();
        let (rows, cols) = self.planner.dimensions();
        let iteration_cap = rows * cols * 8;

        if !self.config.quiet {
            self.print_grid();
        }

        for iteration in 0..iteration_cap {
            if self.planner.current() == self.goal {
                break;
            }

            if self.config.edit_interval > 0
                && iteration > 0
                && iteration % self.config.edit_interval == 0
            {
                self.perturb();
            }

            let before = self.planner.current();
            if self.planner.step() == before {
                // Stuck. Dynamic obstacles are transient; sweep them and
                // retry. Static walls stay, so a second failure is final.
                if self.dynamic_edits.is_empty() {
                    break;
                }
                self.clear_dynamic_edits();
                continue;
            }
            self.stats.total_moves += 1;

            if !self.config.quiet {
                self.print_grid();
            }
        }

        self.stats.reached_goal = self.planner.current() == self.goal;
        self.stats.calculate_efficiency();
        &self.stats
    }

    /// Toggles a random non-wall cell through the planner.
    fn perturb(&mut self) {
        let (rows, cols) = self.planner.dimensions();
        let cell = Position::new(self.rng.gen_range(0..rows), self.rng.gen_range(0..cols));
        if self.walls.contains(&cell) || cell == self.goal || cell == self.planner.current() {
            return;
        }
        if self.planner.is_blocked(cell) {
            self.planner.clear(cell);
            self.dynamic_edits.remove(&cell);
        } else {
            self.planner.block(cell);
            self.dynamic_edits.insert(cell);
        }
        self.stats.world_edits += 1;
    }

    fn clear_dynamic_edits(&mut self) {
        info!(
            count = self.dynamic_edits.len(),
            "agent stuck, sweeping dynamic obstacles"
        );
        for cell in std::mem::take(&mut self.dynamic_edits) {
            self.planner.clear(cell);
        }
    }

    /// Moves on the optimal path over the static walls, by A* search.
    fn optimal_path_length(&self) -> usize {
        let (rows, cols) = self.planner.dimensions();
        let actions = self.actions;
        let result = astar(
            &self.start,
            |&s| {
                actions
                    .offsets()
                    .iter()
                    .filter_map(|&offset| s.offset(offset))
                    .filter(|n| n.row < rows && n.col < cols && !self.walls.contains(n))
                    .map(|n| (n, 1u32))
                    .collect::<Vec<_>>()
            },
            |&s| actions.heuristic(s, self.goal),
            |&s| s == self.goal,
        );
        result.map_or(0, |(path, _)| path.len().saturating_sub(1))
    }

    /// Prints the world. Legend: S=Start, G=Goal, A=Agent, #=Blocked,
    /// *=Path, .=Free.
    fn print_grid(&self) {
        let (rows, cols) = self.planner.dimensions();
        let path: FxHashSet<Position> = self.planner.path().into_iter().collect();

        print!("   ");
        for col in 0..cols {
            print!("{:2}", col % 10);
        }
        println!();

        for row in 0..rows {
            print!("{:2} ", row);
            for col in 0..cols {
                let cell = Position::new(row, col);
                let ch = if cell == self.planner.current() {
                    'A'
                } else if cell == self.start {
                    'S'
                } else if cell == self.goal {
                    'G'
                } else if self.planner.is_blocked(cell) {
                    '#'
                } else if path.contains(&cell) {
                    '*'
                } else {
                    '.'
                };
                print!("{} ", ch);
            }
            println!();
        }
        println!();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config(rows: usize, cols: usize, num_walls: usize, edit_interval: usize) -> Config {
        Config {
            rows,
            cols,
            num_walls,
            edit_interval,
            seed: Some(7),
            diagonal: false,
            quiet: true,
        }
    }

    #[test]
    fn quiet_world_walks_the_optimal_path() {
        let mut simulation = Simulation::new(config(8, 8, 0, 0)).unwrap();
        let stats = simulation.run().clone();
        assert!(stats.reached_goal);
        assert_eq!(stats.total_moves, stats.optimal_path_length);
        assert_eq!(stats.world_edits, 0);
        assert!((stats.route_efficiency - 1.0).abs() < 1e-9);
    }

    #[test]
    fn walls_avoid_start_and_goal() {
        let simulation = Simulation::new(config(10, 10, 25, 0)).unwrap();
        assert!(simulation.walls.len() <= 25);
        assert!(!simulation.walls.contains(&simulation.start));
        assert!(!simulation.walls.contains(&simulation.goal));
        for &wall in &simulation.walls {
            assert!(simulation.planner.is_blocked(wall));
        }
    }

    #[test]
    fn churning_run_terminates() {
        let mut simulation = Simulation::new(config(10, 10, 12, 3)).unwrap();
        let stats = simulation.run().clone();
        if stats.reached_goal {
            assert!(stats.total_moves >= stats.optimal_path_length);
        }
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let err = Simulation::new(config(0, 8, 0, 0)).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidDimensions { .. }));
    }

    #[test]
    fn diagonal_runs_use_fewer_moves() {
        let mut cardinal = Simulation::new(config(9, 9, 0, 0)).unwrap();
        let cardinal_moves = cardinal.run().total_moves;

        let mut diag_config = config(9, 9, 0, 0);
        diag_config.diagonal = true;
        let mut diagonal = Simulation::new(diag_config).unwrap();
        let diagonal_moves = diagonal.run().total_moves;

        assert!(diagonal_moves <= cardinal_moves);
    }
}
