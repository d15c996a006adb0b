//! Backwards-induction threshold solver.
//!
//! This module searches, for every two-player score state, the stopping
//! threshold that maximizes player 1's chance to win, given that the
//! opponent plays their own best threshold from the mirrored state.
//!
//! # Overview
//!
//! 1. States on a fixed score grid are grouped by combined score and solved
//!    highest sum first, so the positions a turn can lead to are already
//!    known when a state is evaluated.
//! 2. For each candidate threshold, the [`Evaluator`] simulates many hand
//!    pairs. Hands that end the game score 1, 0 or 0.5; the rest take the
//!    win probability of the rounded state they lead to.
//! 3. The best threshold and its win probability are written to the
//!    [`StrategyTable`] and never revised.
//!
//! # Example
//!
//! ```ignore
//! use flip7_solver::games::flip7::Flip7;
//! use flip7_solver::induction::{GameState, InductionSolver, SolverConfig};
//!
//! let mut solver = InductionSolver::new(Flip7, SolverConfig::fast().with_seed(7));
//! let stats = solver.solve()?;
//! println!("Solved {} states in {:.2}s", stats.states_solved, stats.elapsed_seconds);
//!
//! let even = solver.table().get(&GameState::new(0, 0)).unwrap();
//! println!("Opening threshold: {}", even.threshold);
//! ```

pub mod config;
pub mod evaluator;
pub mod game;
pub mod solver;
pub mod state;
pub mod storage;

// Re-export main types for convenient access
pub use config::{
    ConfigError, SelfLoopPolicy, SolverConfig, SolverStats, DEFAULT_OPPONENT_THRESHOLD,
    UNRESOLVED_WIN_PROBABILITY, WIN_THRESHOLD,
};
pub use evaluator::{resolve, Evaluation, Evaluator, Matchup, Outcome};
pub use game::TurnGame;
pub use solver::{ordered_levels, BestResponse, InductionSolver, SolveProgress};
pub use state::{round_to_10, GameState, ParseStateError};
pub use storage::{StrategyEntry, StrategyExport, StrategyTable};
