//! Backwards-induction driver.
//!
//! Solves every state of the score grid, highest combined score first, by
//! best-responding to the opponent's known threshold. Each candidate
//! threshold is scored with the Monte Carlo [`Evaluator`], reading the
//! already-finalized states as continuation values.
//!
//! A turn never lowers a score, so every continuation of `(p1, p2)` rounds
//! to a state with both coordinates at least as large. Descending sum order
//! therefore finalizes every continuation first, except the state itself
//! (both players scoring less than one bucket). See [`SelfLoopPolicy`].
//!
//! [`SelfLoopPolicy`]: crate::induction::SelfLoopPolicy

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::induction::config::{ConfigError, SolverConfig, SolverStats};
use crate::induction::evaluator::{Evaluation, Evaluator, Matchup};
use crate::induction::game::TurnGame;
use crate::induction::state::GameState;
use crate::induction::storage::{StrategyEntry, StrategyTable};

/// Best response found at one state.
#[derive(Debug, Clone, PartialEq)]
pub struct BestResponse {
    /// Winning threshold and its estimated win probability.
    pub entry: StrategyEntry,
    /// Threshold the opponent was assumed to play.
    pub opponent_threshold: u32,
    /// Every candidate's evaluation, in threshold order.
    pub candidates: Vec<(u32, Evaluation)>,
}

/// Progress report passed to [`InductionSolver::solve_with_callback`].
#[derive(Debug, Clone)]
pub struct SolveProgress {
    /// The state just finalized.
    pub state: GameState,
    /// Its entry.
    pub entry: StrategyEntry,
    /// States finalized so far.
    pub solved: usize,
    /// States in the grid.
    pub total: usize,
}

/// Group grid states into levels of equal score sum, highest sum first.
///
/// Within a level, states are ordered by ascending `p1`.
pub fn ordered_levels(config: &SolverConfig) -> Vec<Vec<GameState>> {
    let steps = config.score_steps();
    let mut states: Vec<GameState> = steps
        .iter()
        .flat_map(|&p1| steps.iter().map(move |&p2| GameState::new(p1, p2)))
        .collect();

    states.sort_by(|a, b| b.sum().cmp(&a.sum()).then(a.p1.cmp(&b.p1)));

    let mut levels: Vec<Vec<GameState>> = Vec::new();
    for state in states {
        match levels.last_mut() {
            Some(level) if level[0].sum() == state.sum() => level.push(state),
            _ => levels.push(vec![state]),
        }
    }
    levels
}

/// The backwards-induction solver.
///
/// # Type Parameters
/// - `G`: The game type implementing the `TurnGame` trait
///
/// # Example
/// ```ignore
/// use flip7_solver::induction::{InductionSolver, SolverConfig};
/// use flip7_solver::games::flip7::Flip7;
///
/// let mut solver = InductionSolver::new(Flip7, SolverConfig::default().with_seed(42));
/// solver.solve()?;
///
/// let entry = solver.table().get(&GameState::new(0, 0));
/// ```
pub struct InductionSolver<G: TurnGame> {
    /// The game being solved.
    game: G,

    /// Configuration for the solver.
    config: SolverConfig,

    /// Finalized states.
    table: StrategyTable,

    /// Statistics tracking.
    stats: SolverStats,

    /// Master random source; every evaluation seed is drawn from it.
    rng: StdRng,

    /// Dedicated worker pool when a thread count is configured.
    pool: Option<rayon::ThreadPool>,
}

impl<G: TurnGame> InductionSolver<G> {
    /// Create a new solver for the given game.
    pub fn new(game: G, config: SolverConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let pool = config.num_threads.and_then(|threads| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| log::warn!("falling back to the global thread pool: {}", e))
                .ok()
        });

        let capacity = config.score_steps().len().pow(2);

        Self {
            game,
            config,
            table: StrategyTable::with_capacity(capacity),
            stats: SolverStats::new(),
            rng,
            pool,
        }
    }

    /// Solve every grid state.
    pub fn solve(&mut self) -> Result<&SolverStats, ConfigError> {
        self.solve_with_callback(|_| {})
    }

    /// Solve every grid state, calling `callback` after each one is finalized.
    ///
    /// States are visited level by level in [`ordered_levels`] order, so
    /// every continuation with a larger score sum is already in the table
    /// when a state is evaluated. States already present in the table are
    /// kept as they are.
    ///
    /// # Arguments
    /// * `callback` - Called with a [`SolveProgress`] after every state
    ///
    /// # Returns
    /// The accumulated statistics, or the configuration error that stopped
    /// the solve before any state was evaluated.
    pub fn solve_with_callback<F>(&mut self, mut callback: F) -> Result<&SolverStats, ConfigError>
    where
        F: FnMut(&SolveProgress),
    {
        self.config.validate()?;

        let start_time = Instant::now();
        let levels = ordered_levels(&self.config);
        let total: usize = levels.iter().map(Vec::len).sum();

        log::info!(
            "solving {} states in {} levels ({} thresholds x {} samples)",
            total,
            levels.len(),
            self.config.thresholds.len(),
            self.config.samples_per_strategy
        );

        for level in &levels {
            log::debug!("level sum {} ({} states)", level[0].sum(), level.len());

            for &state in level {
                if self.table.contains(&state) {
                    continue;
                }

                let response = self.solve_state(state);
                self.record(&response);

                log::debug!(
                    "{} -> threshold {} (p1 wins {:.4}, opponent {})",
                    state,
                    response.entry.threshold,
                    response.entry.win_probability,
                    response.opponent_threshold
                );

                let finalized = self.table.finalize(state, response.entry);
                debug_assert!(finalized, "state {} finalized twice", state);
                self.stats.states_solved += 1;

                callback(&SolveProgress {
                    state,
                    entry: response.entry,
                    solved: self.stats.states_solved,
                    total,
                });
            }
        }

        self.stats.elapsed_seconds = start_time.elapsed().as_secs_f64();
        self.stats.update_rate();

        log::info!(
            "solved {} states in {:.2}s ({} unresolved lookups)",
            self.stats.states_solved,
            self.stats.elapsed_seconds,
            self.stats.unresolved_lookups
        );

        Ok(&self.stats)
    }

    /// Best-respond at one state against the opponent's known threshold.
    ///
    /// Does not write to the table.
    pub fn solve_state(&mut self, state: GameState) -> BestResponse {
        let opponent_threshold = self.opponent_threshold(state);
        let seed = self.rng.gen();
        self.best_response(state, opponent_threshold, seed)
    }

    /// Threshold the opponent plays at `state`: their own solution at the
    /// mirrored state, or the configured default while that is unsolved.
    pub fn opponent_threshold(&self, state: GameState) -> u32 {
        self.table
            .best_threshold(&state.mirrored())
            .unwrap_or(self.config.default_opponent_threshold)
    }

    /// Evaluate every candidate threshold at `state` and keep the best.
    ///
    /// Candidates run in parallel, on the dedicated pool when one was
    /// configured. Candidate `i` is evaluated with seed `seed + (i << 32)`,
    /// so the result is determined by `seed` alone.
    ///
    /// # Arguments
    /// * `state` - Grid state to solve for player 1
    /// * `opponent_threshold` - Threshold player 2 plays this turn
    /// * `seed` - Base seed for the candidate evaluations
    ///
    /// # Returns
    /// The highest-probability threshold with every candidate's evaluation.
    /// A candidate replaces the current best only with a strictly higher
    /// estimate, so ties go to the lowest threshold.
    pub fn best_response(&self, state: GameState, opponent_threshold: u32, seed: u64) -> BestResponse {
        let evaluator = Evaluator::new(&self.game, &self.config, &self.table);
        let samples = self.config.samples_per_strategy;

        let run = || {
            self.config
                .thresholds
                .par_iter()
                .enumerate()
                .map(|(i, &threshold)| {
                    let matchup = Matchup::at(state, threshold, opponent_threshold);
                    let candidate_seed = seed.wrapping_add((i as u64) << 32);
                    (threshold, evaluator.evaluate(&matchup, samples, candidate_seed))
                })
                .collect::<Vec<_>>()
        };

        let candidates = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        let mut best = StrategyEntry {
            threshold: self.config.thresholds.first().copied().unwrap_or(0),
            win_probability: -1.0,
        };
        for (threshold, evaluation) in &candidates {
            if evaluation.win_probability > best.win_probability {
                best = StrategyEntry {
                    threshold: *threshold,
                    win_probability: evaluation.win_probability,
                };
            }
        }

        BestResponse {
            entry: best,
            opponent_threshold,
            candidates,
        }
    }

    fn record(&mut self, response: &BestResponse) {
        for (_, evaluation) in &response.candidates {
            self.stats.evaluations += 1;
            self.stats.samples += evaluation.samples as u64;
            self.stats.unresolved_lookups += evaluation.unresolved;
            self.stats.self_loops += evaluation.self_loops;
        }
    }

    /// Get reference to the solved table.
    pub fn table(&self) -> &StrategyTable {
        &self.table
    }

    /// Get current statistics.
    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    /// Get reference to the game.
    pub fn game(&self) -> &G {
        &self.game
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Consume the solver and return its table.
    pub fn into_table(self) -> StrategyTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::flip7::Flip7;
    use crate::induction::evaluator::tests::{CoinGame, ExactGame};

    fn small_config() -> SolverConfig {
        SolverConfig::default()
            .with_score_grid(50, 150)
            .with_thresholds(vec![0, 10, 20, 50])
            .with_samples(600)
            .with_seed(3)
    }

    #[test]
    fn test_ordered_levels() {
        let config = SolverConfig::default();
        let levels = ordered_levels(&config);
        let flat: Vec<GameState> = levels.iter().flatten().copied().collect();

        assert_eq!(flat.len(), 400);
        assert_eq!(levels.len(), 39);
        assert_eq!(levels[0], vec![GameState::new(190, 190)]);
        assert_eq!(
            levels[1],
            vec![GameState::new(180, 190), GameState::new(190, 180)]
        );
        assert_eq!(levels.last(), Some(&vec![GameState::new(0, 0)]));
        assert!(flat.windows(2).all(|w| w[0].sum() >= w[1].sum()));
    }

    #[test]
    fn test_continuations_are_solved_first() {
        // Every continuation of a state has coordinates at least as large,
        // so it sits at an earlier position (or is the state itself).
        let config = SolverConfig::default();
        let flat: Vec<GameState> = ordered_levels(&config).into_iter().flatten().collect();
        let position = |s: &GameState| flat.iter().position(|x| x == s).unwrap();

        for (i, state) in flat.iter().enumerate() {
            for gain in [0, 5, 10, 35, 80] {
                let next = config.round_state(state.p1 + gain, state.p2 + 10);
                if next != *state {
                    assert!(position(&next) < i, "{} -> {}", state, next);
                }
            }
        }
    }

    #[test]
    fn test_solve_fills_grid() {
        let mut solver = InductionSolver::new(Flip7, small_config());
        let mut seen = Vec::new();

        let stats = solver
            .solve_with_callback(|progress| seen.push(progress.state))
            .unwrap()
            .clone();

        assert_eq!(stats.states_solved, 16);
        assert_eq!(stats.evaluations, 16 * 4);
        assert_eq!(stats.samples, 16 * 4 * 600);
        assert_eq!(seen.len(), 16);
        assert_eq!(seen[0], GameState::new(150, 150));
        assert_eq!(seen[15], GameState::new(0, 0));

        for state in seen {
            let entry = solver.table().get(&state).unwrap();
            assert!([0, 10, 20, 50].contains(&entry.threshold));
            assert!((0.0..=1.0).contains(&entry.win_probability));
        }
    }

    #[test]
    fn test_solve_is_reproducible() {
        let mut a = InductionSolver::new(Flip7, small_config());
        let mut b = InductionSolver::new(Flip7, small_config().with_threads(2));
        a.solve().unwrap();
        b.solve().unwrap();

        assert_eq!(a.table().export(), b.table().export());
    }

    #[test]
    fn test_solve_rejects_invalid_config() {
        let mut solver = InductionSolver::new(Flip7, SolverConfig::default().with_samples(0));
        assert_eq!(solver.solve().err(), Some(ConfigError::NoSamples));
        assert!(solver.table().is_empty());
    }

    #[test]
    fn test_best_response_prefers_lowest_on_ties() {
        // Every threshold crosses 200 from 190, so all candidates score 1.0.
        let config = SolverConfig::default().with_thresholds(vec![10, 20, 30]).with_samples(50);
        let solver = InductionSolver::new(ExactGame, config);

        let response = solver.best_response(GameState::new(190, 0), 0, 1);
        assert_eq!(response.entry.threshold, 10);
        assert_eq!(response.entry.win_probability, 1.0);
        assert_eq!(response.candidates.len(), 3);
    }

    #[test]
    fn test_best_response_picks_maximum() {
        // Banking 20 from 180 wins; banking 10 lands on an unsolved state.
        let config = SolverConfig::default().with_thresholds(vec![0, 10, 20]).with_samples(50);
        let solver = InductionSolver::new(ExactGame, config);

        let response = solver.best_response(GameState::new(180, 100), 0, 1);
        assert_eq!(response.entry.threshold, 20);
        assert_eq!(response.entry.win_probability, 1.0);
        assert_eq!(response.candidates[1].1.win_probability, 0.5);
    }

    #[test]
    fn test_opponent_threshold_uses_mirrored_state() {
        let solver = InductionSolver::new(CoinGame, SolverConfig::default());
        let state = GameState::new(40, 120);

        assert_eq!(solver.opponent_threshold(state), 25);

        solver.table().finalize(
            GameState::new(120, 40),
            StrategyEntry { threshold: 15, win_probability: 0.9 },
        );
        assert_eq!(solver.opponent_threshold(state), 15);
    }

    #[test]
    fn test_symmetric_state_is_even() {
        let config = SolverConfig::default().with_samples(20_000);
        let table = StrategyTable::new();
        let evaluator = Evaluator::new(&Flip7, &config, &table);

        // Both stand on zero: every sample loops back to the unsolved state.
        let eval = evaluator.evaluate(&Matchup::at(GameState::new(190, 190), 0, 0), 20_000, 8);
        assert!((eval.win_probability - 0.5).abs() < 0.02);

        let eval = evaluator.evaluate(&Matchup::at(GameState::new(190, 190), 25, 25), 20_000, 8);
        assert!((eval.win_probability - 0.5).abs() < 0.03, "{}", eval.win_probability);
    }

    #[test]
    fn test_best_response_monotonic_in_own_score() {
        // Hands do not depend on the starting score, so with a shared seed
        // each sample's payoff can only improve as p1 grows.
        let config = SolverConfig::default().with_samples(2_000);
        let solver = InductionSolver::new(Flip7, config);

        let mut previous = 0.0;
        for p1 in (100..=190).step_by(10) {
            let response = solver.best_response(GameState::new(p1, 120), 25, 17);
            assert!(
                response.entry.win_probability >= previous,
                "p1={} dropped to {}",
                p1,
                response.entry.win_probability
            );
            previous = response.entry.win_probability;
        }
        assert!(previous > 0.8);
    }
}
