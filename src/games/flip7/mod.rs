//! Flip 7.
//!
//! A push-your-luck card game: each turn a player flips cards from an
//! 88-card deck, banking the sum of distinct number cards (plus modifiers
//! and a doubler) when they stand, and losing the turn's points when a
//! number repeats. Seven cards without a repeat earns a 15-point bonus.
//!
//! The module provides:
//! - [`card`]: cards and the shuffled deck
//! - [`hand`]: the single-turn simulator and scoring
//! - [`output`]: sample files and the solved strategy table on disk
//!
//! [`Flip7`] plugs the simulator into the induction solver.

pub mod card;
pub mod hand;
pub mod output;

use rand::Rng;

use crate::induction::TurnGame;

pub use card::{Card, Deck, DECK_SIZE};
pub use hand::{
    play_hand, score_cards, simulate_batch, simulate_hand, Hand, SimulationRecord, TurnState,
    FLIP_SEVEN_BONUS, MAX_HAND_SIZE,
};
pub use output::{
    LoadedStrategy, Parameters, SampleLoad, SampleStore, SampleSummary, StoreError, StrategyFile,
    DATA_DIR,
};

/// Flip 7 with the "hit until score >= X unless holding Second Chance" strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flip7;

impl TurnGame for Flip7 {
    fn play_turn<R: Rng + ?Sized>(&self, threshold: u32, rng: &mut R) -> u32 {
        simulate_hand(threshold, rng).total_value
    }

    fn name(&self) -> &'static str {
        "Flip 7"
    }
}
