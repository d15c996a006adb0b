//! Game implementations for the induction solver.
//!
//! Each game implements [`TurnGame`](crate::induction::TurnGame) so the
//! generic driver can search its threshold strategies.
//!
//! ## Available Games
//!
//! - [`flip7`]: Flip 7, the push-your-luck card game this crate is built for

pub mod flip7;
