//! Turn-game trait for the induction solver.
//!
//! The solver never looks inside a turn: it only needs the score a player
//! banks when following a threshold strategy. Any game whose turns reduce to
//! "play until a threshold, then bank points" can implement `TurnGame`.

use rand::Rng;

/// A game whose turns are played with a single-integer threshold strategy.
///
/// # Example
/// ```ignore
/// #[derive(Clone)]
/// struct MyGame;
///
/// impl TurnGame for MyGame {
///     fn play_turn<R: Rng + ?Sized>(&self, threshold: u32, rng: &mut R) -> u32 {
///         // ... simulate one turn, return the banked score
///     }
/// }
/// ```
pub trait TurnGame: Clone + Send + Sync {
    /// Play one turn with the given stopping threshold and return the score banked.
    ///
    /// Each call must use fresh game material (a new deck); turns share
    /// nothing but the random source.
    fn play_turn<R: Rng + ?Sized>(&self, threshold: u32, rng: &mut R) -> u32;

    /// Short human-readable game name.
    fn name(&self) -> &'static str {
        "turn game"
    }
}
