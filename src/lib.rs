//! # Flip 7 Solver
//!
//! Finds the win-maximizing stopping threshold for two-player Flip 7 at
//! every combination of the players' scores.
//!
//! ## Features
//!
//! - **Hand Simulator**: Plays one turn of Flip 7 under a threshold strategy
//! - **Monte Carlo Evaluator**: Estimates win probability for a threshold pair
//! - **Backwards Induction**: Solves the score grid from the end of the game back
//! - **Reproducible**: Every random stream is derived from one seed
//! - **Result Files**: JSON-lines hand samples and a JSON strategy table
//!
//! ## Quick Start
//!
//! ```ignore
//! use flip7_solver::games::flip7::{Flip7, StrategyFile};
//! use flip7_solver::induction::{InductionSolver, SolverConfig};
//!
//! // 1. Create a solver
//! let mut solver = InductionSolver::new(Flip7, SolverConfig::default().with_seed(42));
//!
//! // 2. Solve the grid
//! solver.solve()?;
//!
//! // 3. Save the table
//! StrategyFile::from_solver(&solver).save("data/multisim_results.json")?;
//! ```
//!
//! ## Modules
//!
//! - [`induction`]: Generic backwards-induction solver
//! - [`games`]: Game implementations (Flip 7)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │               Backwards-Induction Driver (Generic)              │
//! │  - Descending-sum state order  - Best-response search           │
//! │  - Strategy table (memo)       - Monte Carlo evaluator          │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ implements TurnGame trait
//!                               ▼
//!                        ┌─────────────┐
//!                        │   Flip 7    │
//!                        │ deck / hand │
//!                        └─────────────┘
//! ```

#![warn(missing_docs)]

/// Backwards-induction solver module.
///
/// This is the core module containing the state ordering, the evaluator
/// and the strategy table.
pub mod induction;

/// Game implementations module.
///
/// Contains the Flip 7 card model, hand simulator and result files.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use induction::{
    GameState, InductionSolver, SolverConfig, SolverStats, StrategyEntry, StrategyTable, TurnGame,
};
