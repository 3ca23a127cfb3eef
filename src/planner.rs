use thiserror::Error;
use tracing::{debug, trace};

use crate::grid::{Grid, Position, INFINITY};
use crate::queue::{Key, OpenList};

/// Implements the D* Lite algorithm from the 2002 paper by S. Koenig and
/// M. Likhachev, specialized to uniform-cost grid worlds. The planner keeps
/// the optimal path from the agent's current cell to a fixed goal and
/// repairs it incrementally when cells are blocked or cleared, instead of
/// replanning from scratch.
#[derive(Debug)]
pub struct Planner {
    grid: Grid,
    queue: OpenList,
    start: Position,
    current: Position,
    goal: Position,
    km: u32,
    actions: ActionSet,
}

/// Neighborhood presets. Each pairing ships with a heuristic that is
/// consistent for its move set under unit step cost; an offset list without
/// a matching heuristic would break the key monotonicity the queue relies
/// on, so arbitrary sets are not accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionSet {
    /// 4-connected cardinal moves, Manhattan heuristic.
    #[default]
    Cardinal,
    /// 8-connected moves, Chebyshev heuristic.
    Diagonal,
}

const CARDINAL: [(i32, i32); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];
const DIAGONAL: [(i32, i32); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

impl ActionSet {
    pub fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            ActionSet::Cardinal => &CARDINAL,
            ActionSet::Diagonal => &DIAGONAL,
        }
    }

    /// Estimated distance between two cells under this move set.
    pub fn heuristic(self, a: Position, b: Position) -> u32 {
        let dr = a.row.abs_diff(b.row) as u32;
        let dc = a.col.abs_diff(b.col) as u32;
        match self {
            ActionSet::Cardinal => dr + dc,
            ActionSet::Diagonal => dr.max(dc),
        }
    }
}

/// Construction options for [`Planner`].
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Grid extent as (rows, cols); both at least 1.
    pub dimensions: (usize, usize),
    /// Initial agent position.
    pub start: Position,
    /// Fixed destination.
    pub goal: Position,
    pub action_set: ActionSet,
}

impl PlannerConfig {
    pub fn new(dimensions: (usize, usize), start: Position, goal: Position) -> Self {
        PlannerConfig {
            dimensions,
            start,
            goal,
            action_set: ActionSet::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlannerError {
    #[error("grid dimensions must be at least 1x1, got {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },
    #[error("{role} cell {cell:?} is outside the {rows}x{cols} grid")]
    OutOfBounds {
        role: &'static str,
        cell: Position,
        rows: usize,
        cols: usize,
    },
}

/// Adds a step cost to a path cost, clamping at [`INFINITY`] so that
/// unreachable stays unreachable.
fn add_cost(g: u32, cost: u32) -> u32 {
    if g >= INFINITY || cost >= INFINITY {
        INFINITY
    } else {
        g + cost
    }
}

impl Planner {
    /// Builds the planner and computes the initial path, so a valid path
    /// exists before any query.
    pub fn new(config: PlannerConfig) -> Result<Self, PlannerError> {
        let (rows, cols) = config.dimensions;
        if rows == 0 || cols == 0 {
            return Err(PlannerError::InvalidDimensions { rows, cols });
        }
        let grid = Grid::new(rows, cols);
        for (role, cell) in [("start", config.start), ("goal", config.goal)] {
            if !grid.contains(cell) {
                return Err(PlannerError::OutOfBounds {
                    role,
                    cell,
                    rows,
                    cols,
                });
            }
        }

        let mut planner = Planner {
            grid,
            queue: OpenList::new(),
            start: config.start,
            current: config.start,
            goal: config.goal,
            km: 0,
            actions: config.action_set,
        };
        planner.grid.set_rhs(planner.goal, 0);
        let h = planner.actions.heuristic(planner.start, planner.goal);
        planner.queue.push(planner.goal, Key::new(h, 0));
        planner.compute_shortest_path();
        Ok(planner)
    }

    pub fn current(&self) -> Position {
        self.current
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.grid.rows(), self.grid.cols())
    }

    pub fn is_blocked(&self, s: Position) -> bool {
        self.grid.is_blocked(s)
    }

    /// Blocks a cell if it is currently free. Out-of-bounds cells, the
    /// goal, and the agent's current cell are left untouched.
    pub fn block(&mut self, s: Position) {
        if self.grid.contains(s) && !self.grid.is_blocked(s) {
            self.toggle(s);
        }
    }

    /// Clears a cell if it is currently blocked.
    pub fn clear(&mut self, s: Position) {
        if self.grid.contains(s) && self.grid.is_blocked(s) {
            self.toggle(s);
        }
    }

    /// Flips the occupancy of a cell and repairs the path. No-op when the
    /// cell is out of bounds, the goal, or the agent's current cell.
    pub fn toggle(&mut self, s: Position) {
        if !self.grid.contains(s) || s == self.goal || s == self.current {
            return;
        }

        // Re-anchor the heuristic at the agent before the world changes.
        // The km increment keeps every queued key a lower bound on its
        // recomputed value, so the queue never needs rebuilding.
        self.km = self
            .km
            .saturating_add(self.actions.heuristic(self.start, self.current));
        self.start = self.current;

        let blocked = !self.grid.is_blocked(s);
        self.grid.set_blocked(s, blocked);
        debug!(row = s.row, col = s.col, blocked, "cell toggled");

        self.update_vertex(s);
        // Blocked neighbors included: the edge-cost change reaches them too.
        for neighbor in self.adjacent(s) {
            self.update_vertex(neighbor);
        }
        self.compute_shortest_path();
    }

    /// Replaces the occupancy map wholesale by toggling every differing
    /// cell. A dimension mismatch is a no-op.
    pub fn replace_map(&mut self, new_map: &[Vec<bool>]) {
        if new_map.len() != self.grid.rows()
            || new_map.iter().any(|row| row.len() != self.grid.cols())
        {
            return;
        }
        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                let s = Position::new(row, col);
                if self.grid.is_blocked(s) != new_map[row][col] {
                    self.toggle(s);
                }
            }
        }
    }

    /// The optimal path from the agent's current cell towards the goal.
    /// Always begins with the current cell; ends early when no progress is
    /// possible.
    pub fn path(&self) -> Vec<Position> {
        let mut path = vec![self.current];
        let mut s = self.current;
        while s != self.goal {
            let next = self.next_from(s);
            if next == s {
                break;
            }
            s = next;
            path.push(s);
        }
        path
    }

    /// Next cell on the optimal path, or the current cell when no neighbor
    /// improves on it.
    pub fn peek_next(&self) -> Position {
        self.next_from(self.current)
    }

    /// Advances the agent one cell along the optimal path and returns its
    /// new position. The heuristic anchor is untouched; it only moves on
    /// world edits.
    pub fn step(&mut self) -> Position {
        self.current = self.next_from(self.current);
        self.current
    }

    fn next_from(&self, s: Position) -> Position {
        if s == self.goal {
            return s;
        }
        let mut best = s;
        for neighbor in self.neighbors(s) {
            if self.grid.g(neighbor) < self.grid.g(best) {
                best = neighbor;
            }
        }
        best
    }

    fn calculate_key(&self, s: Position) -> Key {
        let min = self.grid.g(s).min(self.grid.rhs(s));
        if min >= INFINITY {
            return Key::INFINITE;
        }
        Key::new(
            min.saturating_add(self.actions.heuristic(self.start, s))
                .saturating_add(self.km),
            min,
        )
    }

    fn cost(&self, a: Position, b: Position) -> u32 {
        if self.grid.is_blocked(a) || self.grid.is_blocked(b) {
            INFINITY
        } else {
            1
        }
    }

    /// One-step lookahead cost to the goal through the best free neighbor.
    fn compute_rhs(&self, s: Position) -> u32 {
        let mut rhs = INFINITY;
        for neighbor in self.neighbors(s) {
            rhs = rhs.min(add_cost(self.grid.g(neighbor), self.cost(s, neighbor)));
        }
        rhs
    }

    /// In-bounds, unblocked neighbors of `s` under the active action set.
    fn neighbors(&self, s: Position) -> Vec<Position> {
        let mut neighbors = Vec::with_capacity(self.actions.offsets().len());
        for &offset in self.actions.offsets() {
            let Some(next) = s.offset(offset) else {
                continue;
            };
            if self.grid.contains(next) && !self.grid.is_blocked(next) {
                neighbors.push(next);
            }
        }
        neighbors
    }

    /// In-bounds neighbors regardless of occupancy.
    fn adjacent(&self, s: Position) -> Vec<Position> {
        let mut neighbors = Vec::with_capacity(self.actions.offsets().len());
        for &offset in self.actions.offsets() {
            let Some(next) = s.offset(offset) else {
                continue;
            };
            if self.grid.contains(next) {
                neighbors.push(next);
            }
        }
        neighbors
    }

    fn update_vertex(&mut self, s: Position) {
        if s != self.goal {
            let rhs = self.compute_rhs(s);
            self.grid.set_rhs(s, rhs);
        }
        if self.grid.g(s) != self.grid.rhs(s) {
            self.queue.update(s, self.calculate_key(s));
        } else {
            self.queue.remove(s);
        }
    }

    fn compute_shortest_path(&mut self) {
        let mut expansions = 0usize;
        while let Ok((k_old, u)) = self.queue.top() {
            if k_old >= self.calculate_key(self.start)
                && self.grid.rhs(self.start) == self.grid.g(self.start)
            {
                break;
            }
            self.queue.remove(u);

            let k_new = self.calculate_key(u);
            if k_old < k_new {
                // Queued under an old anchor; requeue with the fresh key.
                self.queue.push(u, k_new);
                continue;
            }

            if self.grid.g(u) > self.grid.rhs(u) {
                let rhs = self.grid.rhs(u);
                self.grid.set_g(u, rhs);
            } else {
                self.grid.set_g(u, INFINITY);
                self.update_vertex(u);
            }
            for neighbor in self.neighbors(u) {
                self.update_vertex(neighbor);
            }
            expansions += 1;
            trace!(row = u.row, col = u.col, "expanded vertex");
        }
        debug!(expansions, "shortest path computation converged");
    }
}
