use std::fmt;

/// Outcome counters for one simulation run.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub total_moves: usize,
    pub world_edits: usize,
    /// Moves on the optimal path over the static walls, before any churn.
    pub optimal_path_length: usize,
    pub route_efficiency: f64,
    pub reached_goal: bool,
}

impl Statistics {
    pub fn calculate_efficiency(&mut self) {
        if self.total_moves > 0 && self.optimal_path_length > 0 {
            self.route_efficiency = self.total_moves as f64 / self.optimal_path_length as f64;
        } else {
            self.route_efficiency = 0.0;
        }
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Moves: {}", self.total_moves)?;
        writeln!(f, "World Edits: {}", self.world_edits)?;
        writeln!(f, "Optimal Path Length: {}", self.optimal_path_length)?;
        writeln!(f, "Reached Goal: {}", self.reached_goal)?;
        writeln!(f, "Route Efficiency: {:.3}", self.route_efficiency)?;

        if self.route_efficiency > 1.0 {
            writeln!(
                f,
                "Extra moves due to world churn: {}",
                self.total_moves.saturating_sub(self.optimal_path_length)
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn efficiency_is_moves_over_optimal() {
        let mut stats = Statistics {
            total_moves: 12,
            optimal_path_length: 8,
            ..Statistics::default()
        };
        stats.calculate_efficiency();
        assert!((stats.route_efficiency - 1.5).abs() < 1e-9);
    }

    #[test]
    fn efficiency_defaults_to_zero_without_data() {
        let mut stats = Statistics::default();
        stats.calculate_efficiency();
        assert_eq!(stats.route_efficiency, 0.0);
    }
}
