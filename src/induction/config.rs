//! Configuration options for the backwards-induction solver.
//!
//! This module provides the immutable parameter block handed to every
//! component (simulator grid, evaluator sample counts, driver defaults),
//! plus the statistics gathered while solving.

use serde::{Deserialize, Serialize};

use super::state::GameState;

/// Score needed to win the game.
pub const WIN_THRESHOLD: u32 = 200;

/// Threshold assumed for an opponent whose mirrored state is not solved yet.
pub const DEFAULT_OPPONENT_THRESHOLD: u32 = 25;

/// Win probability used when a continuation state has no memo entry.
pub const UNRESOLVED_WIN_PROBABILITY: f64 = 0.5;

/// How the evaluator treats samples whose continuation is the state being solved.
///
/// A turn where both players score little (both bust, or both stand at
/// zero) can round back to the same grid state. That state is never
/// finalized while it is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelfLoopPolicy {
    /// Read the memo like any other continuation; the miss yields the
    /// unresolved default.
    Unresolved,
    /// Solve `V = S / n + (k / n) * V` for the state's own value, where `k`
    /// samples looped back and `S` is the sum of the other contributions.
    FixedPoint,
}

/// Configuration for the induction solver.
///
/// # Example
/// ```
/// use flip7_solver::induction::SolverConfig;
///
/// let config = SolverConfig::default();
/// assert_eq!(config.thresholds.len(), 21);
/// assert_eq!(config.score_steps().len(), 20);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Candidate stopping thresholds, ascending.
    pub thresholds: Vec<u32>,

    /// Width of one score bucket on the state grid.
    pub score_step: u32,

    /// Highest score bucket; rounded scores are capped here.
    pub max_score: u32,

    /// Hand pairs simulated per (state, threshold) evaluation.
    pub samples_per_strategy: usize,

    /// Score needed to win.
    pub win_threshold: u32,

    /// Opponent threshold used before the mirrored state is solved.
    pub default_opponent_threshold: u32,

    /// Continuation value for a memo miss.
    pub unresolved_win_probability: f64,

    /// Treatment of continuations that land on the state being solved.
    pub self_loop_policy: SelfLoopPolicy,

    /// Number of worker threads.
    ///
    /// Set to `None` to use the global rayon pool (all available cores).
    pub num_threads: Option<usize>,

    /// Random seed for reproducibility.
    ///
    /// If `None`, the solver seeds itself from entropy.
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            thresholds: (0..=100).step_by(5).collect(),
            score_step: 10,
            max_score: 190,
            samples_per_strategy: 10_000,
            win_threshold: WIN_THRESHOLD,
            default_opponent_threshold: DEFAULT_OPPONENT_THRESHOLD,
            unresolved_win_probability: UNRESOLVED_WIN_PROBABILITY,
            self_loop_policy: SelfLoopPolicy::Unresolved,
            num_threads: None,
            seed: None,
        }
    }
}

impl SolverConfig {
    /// Create a new SolverConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a coarse configuration for quick runs and tests.
    ///
    /// Same grid, a tenth of the samples and every other threshold.
    pub fn fast() -> Self {
        Self {
            thresholds: (0..=100).step_by(10).collect(),
            samples_per_strategy: 1_000,
            ..Default::default()
        }
    }

    /// Builder method: set the candidate thresholds.
    pub fn with_thresholds(mut self, thresholds: Vec<u32>) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Builder method: set the samples per evaluation.
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples_per_strategy = samples;
        self
    }

    /// Builder method: set the score grid.
    pub fn with_score_grid(mut self, step: u32, max_score: u32) -> Self {
        self.score_step = step;
        self.max_score = max_score;
        self
    }

    /// Builder method: set the self-loop policy.
    pub fn with_self_loop_policy(mut self, policy: SelfLoopPolicy) -> Self {
        self.self_loop_policy = policy;
        self
    }

    /// Builder method: set number of threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Score buckets of the grid: `0, step, ..., max_score`.
    pub fn score_steps(&self) -> Vec<u32> {
        if self.score_step == 0 {
            return vec![0];
        }
        (0..=self.max_score).step_by(self.score_step as usize).collect()
    }

    /// Round a raw score down to its bucket, capped at `max_score`.
    pub fn round_score(&self, score: u32) -> u32 {
        if self.score_step == 0 {
            return 0;
        }
        ((score / self.score_step) * self.score_step).min(self.max_score)
    }

    /// Grid state a pair of raw scores falls into.
    pub fn round_state(&self, p1: u32, p2: u32) -> GameState {
        GameState::new(self.round_score(p1), self.round_score(p2))
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thresholds.is_empty() {
            return Err(ConfigError::NoThresholds);
        }

        if self.thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::UnsortedThresholds);
        }

        if self.samples_per_strategy == 0 {
            return Err(ConfigError::NoSamples);
        }

        if self.score_step == 0 || self.max_score % self.score_step != 0 {
            return Err(ConfigError::InvalidScoreGrid(self.score_step, self.max_score));
        }

        if self.max_score >= self.win_threshold {
            return Err(ConfigError::GridReachesWin(self.max_score, self.win_threshold));
        }

        if !(0.0..=1.0).contains(&self.unresolved_win_probability) {
            return Err(ConfigError::InvalidProbability(self.unresolved_win_probability));
        }

        if self.num_threads == Some(0) {
            return Err(ConfigError::NoThreads);
        }

        Ok(())
    }
}

/// Errors that can occur when validating solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The candidate threshold list is empty.
    NoThresholds,
    /// Candidate thresholds are not strictly ascending.
    UnsortedThresholds,
    /// Zero samples per evaluation.
    NoSamples,
    /// Score step is zero or does not divide the top bucket.
    InvalidScoreGrid(u32, u32),
    /// The top score bucket is already a winning score.
    GridReachesWin(u32, u32),
    /// Unresolved continuation value is outside [0, 1].
    InvalidProbability(f64),
    /// A thread count of zero was requested.
    NoThreads,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoThresholds => write!(f, "No candidate thresholds configured"),
            ConfigError::UnsortedThresholds => {
                write!(f, "Candidate thresholds must be strictly ascending")
            }
            ConfigError::NoSamples => write!(f, "Samples per strategy must be positive"),
            ConfigError::InvalidScoreGrid(step, max) => {
                write!(f, "Score step {} does not evenly divide top bucket {}", step, max)
            }
            ConfigError::GridReachesWin(max, win) => {
                write!(f, "Top score bucket {} must be below the win threshold {}", max, win)
            }
            ConfigError::InvalidProbability(val) => {
                write!(f, "Unresolved win probability {} is out of range [0, 1]", val)
            }
            ConfigError::NoThreads => write!(f, "Thread count must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Statistics tracked during a solve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverStats {
    /// States finalized so far.
    pub states_solved: usize,

    /// Evaluator calls (one per state and candidate threshold).
    pub evaluations: u64,

    /// Hand pairs simulated across all evaluations.
    pub samples: u64,

    /// Continuation lookups that missed the memo.
    pub unresolved_lookups: u64,

    /// Samples that returned to the state being evaluated.
    pub self_loops: u64,

    /// Total time spent solving (in seconds).
    pub elapsed_seconds: f64,

    /// States finalized per second.
    pub states_per_second: f64,
}

impl SolverStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update states per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.states_per_second = self.states_solved as f64 / self.elapsed_seconds;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid() {
        let config = SolverConfig::default();
        assert_eq!(config.thresholds.first(), Some(&0));
        assert_eq!(config.thresholds.last(), Some(&100));
        assert_eq!(config.score_steps(), (0..200).step_by(10).collect::<Vec<u32>>());
        assert!(config.validate().is_ok());
        assert!(SolverConfig::fast().validate().is_ok());
    }

    #[test]
    fn test_round_score() {
        let config = SolverConfig::default();
        assert_eq!(config.round_score(0), 0);
        assert_eq!(config.round_score(9), 0);
        assert_eq!(config.round_score(10), 10);
        assert_eq!(config.round_score(187), 180);
        assert_eq!(config.round_score(199), 190);
        assert_eq!(config.round_score(450), 190);
        assert_eq!(config.round_state(35, 121), GameState::new(30, 120));
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let bad = SolverConfig::default().with_thresholds(vec![]);
        assert_eq!(bad.validate(), Err(ConfigError::NoThresholds));

        let bad = SolverConfig::default().with_thresholds(vec![10, 5]);
        assert_eq!(bad.validate(), Err(ConfigError::UnsortedThresholds));

        let bad = SolverConfig::default().with_samples(0);
        assert_eq!(bad.validate(), Err(ConfigError::NoSamples));

        let bad = SolverConfig::default().with_score_grid(0, 190);
        assert_eq!(bad.validate(), Err(ConfigError::InvalidScoreGrid(0, 190)));

        let bad = SolverConfig::default().with_score_grid(10, 200);
        assert_eq!(bad.validate(), Err(ConfigError::GridReachesWin(200, 200)));

        let bad = SolverConfig::default().with_threads(0);
        assert_eq!(bad.validate(), Err(ConfigError::NoThreads));

        let bad = SolverConfig {
            unresolved_win_probability: 1.5,
            ..Default::default()
        };
        assert_eq!(bad.validate(), Err(ConfigError::InvalidProbability(1.5)));
    }
}
