//! Monte Carlo strategy evaluation.
//!
//! Estimates player 1's win probability from a score state when both
//! players follow fixed thresholds for one turn each, using the strategy
//! table for positions where nobody has won yet.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use super::config::{SelfLoopPolicy, SolverConfig};
use super::game::TurnGame;
use super::state::GameState;
use super::storage::StrategyTable;

/// Hand pairs per seeded stream.
///
/// Fixed so that results depend only on the seed, not on the thread count.
pub const SAMPLES_PER_STREAM: usize = 512;

/// One evaluation request: raw scores and both players' thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matchup {
    /// Player 1's running total.
    pub p1_score: u32,
    /// Player 2's running total.
    pub p2_score: u32,
    /// Player 1's stopping threshold.
    pub p1_threshold: u32,
    /// Player 2's stopping threshold.
    pub p2_threshold: u32,
}

impl Matchup {
    /// Matchup from a grid state.
    pub fn at(state: GameState, p1_threshold: u32, p2_threshold: u32) -> Self {
        Self {
            p1_score: state.p1,
            p2_score: state.p2,
            p1_threshold,
            p2_threshold,
        }
    }
}

/// How a pair of post-turn totals settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Player 1 wins outright.
    Win,
    /// Player 2 wins outright.
    Loss,
    /// Both crossed with equal totals.
    Tie,
    /// Nobody crossed; the game continues from these totals.
    Continue,
}

impl Outcome {
    /// Player 1's payoff for a settled outcome (`None` for `Continue`).
    pub fn payoff(&self) -> Option<f64> {
        match self {
            Outcome::Win => Some(1.0),
            Outcome::Loss => Some(0.0),
            Outcome::Tie => Some(0.5),
            Outcome::Continue => None,
        }
    }
}

/// Settle post-turn totals against the win threshold.
pub fn resolve(new_p1: u32, new_p2: u32, win_threshold: u32) -> Outcome {
    let p1_won = new_p1 >= win_threshold;
    let p2_won = new_p2 >= win_threshold;

    match (p1_won, p2_won) {
        (true, true) => match new_p1.cmp(&new_p2) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Equal => Outcome::Tie,
            std::cmp::Ordering::Less => Outcome::Loss,
        },
        (true, false) => Outcome::Win,
        (false, true) => Outcome::Loss,
        (false, false) => Outcome::Continue,
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Estimated win probability for player 1.
    pub win_probability: f64,
    /// Hand pairs simulated.
    pub samples: usize,
    /// Continuation lookups that missed the table.
    pub unresolved: u64,
    /// Samples whose continuation was the evaluated state itself.
    pub self_loops: u64,
}

/// Per-stream accumulator.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    total: f64,
    unresolved: u64,
    self_loops: u64,
}

impl Tally {
    fn merge(self, other: Tally) -> Tally {
        Tally {
            total: self.total + other.total,
            unresolved: self.unresolved + other.unresolved,
            self_loops: self.self_loops + other.self_loops,
        }
    }
}

/// Monte Carlo evaluator bound to a game, a configuration and a table.
pub struct Evaluator<'a, G: TurnGame> {
    game: &'a G,
    config: &'a SolverConfig,
    table: &'a StrategyTable,
}

impl<'a, G: TurnGame> Evaluator<'a, G> {
    /// Create an evaluator reading continuation values from `table`.
    pub fn new(game: &'a G, config: &'a SolverConfig, table: &'a StrategyTable) -> Self {
        Self { game, config, table }
    }

    /// Estimate player 1's win probability over `n_samples` hand pairs.
    ///
    /// Each sample plays one turn for each player from the matchup's scores.
    /// Settled games contribute 1.0, 0.5 or 0.0. Unsettled games contribute
    /// the table's value at the rounded continuation state, or
    /// `unresolved_win_probability` when that state is not in the table.
    /// Samples that round back to the matchup's own state are handled
    /// according to the configured [`SelfLoopPolicy`].
    ///
    /// Samples are split into streams of [`SAMPLES_PER_STREAM`]. Stream `k`
    /// is seeded with `seed + k`. Streams run in parallel and are reduced
    /// in stream order, so the estimate is fully determined by `seed`.
    ///
    /// # Arguments
    /// * `matchup` - Scores and thresholds for both players
    /// * `n_samples` - Hand pairs to simulate
    /// * `seed` - Base seed for the sample streams
    ///
    /// # Returns
    /// The estimate together with sample, memo-miss and self-loop counts.
    pub fn evaluate(&self, matchup: &Matchup, n_samples: usize, seed: u64) -> Evaluation {
        let origin = self.config.round_state(matchup.p1_score, matchup.p2_score);
        let streams = n_samples.div_ceil(SAMPLES_PER_STREAM);

        let tallies: Vec<Tally> = (0..streams)
            .into_par_iter()
            .map(|stream| {
                let start = stream * SAMPLES_PER_STREAM;
                let count = SAMPLES_PER_STREAM.min(n_samples - start);
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(stream as u64));
                self.run_stream(matchup, origin, count, &mut rng)
            })
            .collect();

        let tally = tallies.into_iter().fold(Tally::default(), Tally::merge);

        Evaluation {
            win_probability: self.finish(&tally, n_samples),
            samples: n_samples,
            unresolved: tally.unresolved,
            self_loops: tally.self_loops,
        }
    }

    fn finish(&self, tally: &Tally, n_samples: usize) -> f64 {
        if n_samples == 0 {
            return self.config.unresolved_win_probability;
        }

        match self.config.self_loop_policy {
            SelfLoopPolicy::Unresolved => tally.total / n_samples as f64,
            SelfLoopPolicy::FixedPoint => {
                let escaped = n_samples as u64 - tally.self_loops;
                if escaped == 0 {
                    // The state never progresses; nothing to anchor a value to.
                    self.config.unresolved_win_probability
                } else {
                    tally.total / escaped as f64
                }
            }
        }
    }

    fn run_stream(
        &self,
        matchup: &Matchup,
        origin: GameState,
        count: usize,
        rng: &mut StdRng,
    ) -> Tally {
        let memo = self.table.entries();
        let mut tally = Tally::default();

        for _ in 0..count {
            let new_p1 = matchup.p1_score + self.game.play_turn(matchup.p1_threshold, rng);
            let new_p2 = matchup.p2_score + self.game.play_turn(matchup.p2_threshold, rng);

            let outcome = resolve(new_p1, new_p2, self.config.win_threshold);
            if let Some(payoff) = outcome.payoff() {
                tally.total += payoff;
                continue;
            }

            let next = self.config.round_state(new_p1, new_p2);
            if next == origin {
                tally.self_loops += 1;
                if self.config.self_loop_policy == SelfLoopPolicy::FixedPoint {
                    continue;
                }
            }

            match memo.get(&next) {
                Some(entry) => tally.total += entry.win_probability,
                None => {
                    tally.unresolved += 1;
                    tally.total += self.config.unresolved_win_probability;
                }
            }
        }

        tally
    }
}
