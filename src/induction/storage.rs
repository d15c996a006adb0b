//! Storage for solved states.
//!
//! This module provides the thread-safe memo table that maps each finalized
//! grid state to its best threshold and win probability.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use super::state::GameState;

/// Result for one finalized state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyEntry {
    /// Win-maximizing stopping threshold for player 1.
    pub threshold: u32,
    /// Player 1's estimated win probability under that threshold.
    pub win_probability: f64,
}

/// Thread-safe strategy table.
///
/// Evaluators read it concurrently while the driver is between writes.
/// Entries are write-once: a state, once finalized, is never revised.
#[derive(Debug, Default)]
pub struct StrategyTable {
    entries: RwLock<FxHashMap<GameState, StrategyEntry>>,
}

impl StrategyTable {
    /// Create new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(FxHashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            )),
        }
    }

    /// Read access to all entries.
    ///
    /// Hold the guard across a batch of lookups instead of locking per lookup.
    pub fn entries(&self) -> RwLockReadGuard<'_, FxHashMap<GameState, StrategyEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the entry for a state, if finalized.
    pub fn get(&self, state: &GameState) -> Option<StrategyEntry> {
        self.entries().get(state).copied()
    }

    /// Best threshold for a state, if finalized.
    pub fn best_threshold(&self, state: &GameState) -> Option<u32> {
        self.get(state).map(|e| e.threshold)
    }

    /// Win probability for a state, if finalized.
    pub fn win_probability(&self, state: &GameState) -> Option<f64> {
        self.get(state).map(|e| e.win_probability)
    }

    /// Finalize a state.
    ///
    /// Returns `false` and leaves the table unchanged if the state already
    /// has an entry.
    pub fn finalize(&self, state: GameState, entry: StrategyEntry) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&state) {
            return false;
        }
        entries.insert(state, entry);
        true
    }

    /// Check if a state has been finalized.
    pub fn contains(&self, state: &GameState) -> bool {
        self.entries().contains_key(state)
    }

    /// Number of finalized states.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether no state has been finalized.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Export to serializable format, keyed by `"p1,p2"`.
    pub fn export(&self) -> StrategyExport {
        let entries = self.entries();
        let mut export = StrategyExport::default();

        for (state, entry) in entries.iter() {
            export.optimal_strategies.insert(state.key(), entry.threshold);
            export.win_probs.insert(state.key(), entry.win_probability);
        }

        export
    }

    /// Build a table from exported data.
    ///
    /// Keys that fail to parse, or that appear in only one of the two maps,
    /// are skipped and returned so callers can report them.
    pub fn import(data: &StrategyExport) -> (Self, Vec<String>) {
        let table = Self::with_capacity(data.optimal_strategies.len());
        let mut skipped = Vec::new();

        for (key, &threshold) in &data.optimal_strategies {
            let parsed = key.parse::<GameState>();
            match (parsed, data.win_probs.get(key)) {
                (Ok(state), Some(&win_probability)) => {
                    table.finalize(state, StrategyEntry { threshold, win_probability });
                }
                _ => skipped.push(key.clone()),
            }
        }

        skipped.extend(
            data.win_probs
                .keys()
                .filter(|key| !data.optimal_strategies.contains_key(*key))
                .cloned(),
        );

        (table, skipped)
    }
}

impl Clone for StrategyTable {
    fn clone(&self) -> Self {
        Self {
            entries: RwLock::new(self.entries().clone()),
        }
    }
}

/// Serializable export format for the table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyExport {
    /// Best threshold per state key.
    pub optimal_strategies: BTreeMap<String, u32>,
    /// Win probability per state key.
    pub win_probs: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(threshold: u32, win_probability: f64) -> StrategyEntry {
        StrategyEntry { threshold, win_probability }
    }

    #[test]
    fn test_finalize_is_write_once() {
        let table = StrategyTable::new();
        let state = GameState::new(100, 50);

        assert!(table.finalize(state, entry(20, 0.7)));
        assert!(!table.finalize(state, entry(40, 0.1)));

        assert_eq!(table.get(&state), Some(entry(20, 0.7)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_lookups() {
        let table = StrategyTable::new();
        table.finalize(GameState::new(10, 20), entry(35, 0.4));

        assert_eq!(table.best_threshold(&GameState::new(10, 20)), Some(35));
        assert_eq!(table.win_probability(&GameState::new(10, 20)), Some(0.4));
        assert_eq!(table.best_threshold(&GameState::new(20, 10)), None);
        assert!(!table.contains(&GameState::new(20, 10)));
    }

    #[test]
    fn test_export_import() {
        let table = StrategyTable::new();
        table.finalize(GameState::new(190, 0), entry(0, 0.95));
        table.finalize(GameState::new(0, 190), entry(60, 0.05));

        let export = table.export();
        assert_eq!(export.optimal_strategies.get("190,0"), Some(&0));
        assert_eq!(export.win_probs.get("0,190"), Some(&0.05));

        let (restored, skipped) = StrategyTable::import(&export);
        assert!(skipped.is_empty());
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get(&GameState::new(0, 190)), Some(entry(60, 0.05)));
    }

    #[test]
    fn test_import_skips_malformed_keys() {
        let mut export = StrategyExport::default();
        export.optimal_strategies.insert("10,10".into(), 30);
        export.win_probs.insert("10,10".into(), 0.5);
        export.optimal_strategies.insert("ten,10".into(), 30);
        export.win_probs.insert("ten,10".into(), 0.5);
        export.optimal_strategies.insert("20,20".into(), 30);
        export.win_probs.insert("30,30".into(), 0.5);

        let (table, mut skipped) = StrategyTable::import(&export);
        skipped.sort();

        assert_eq!(table.len(), 1);
        assert_eq!(skipped, vec!["20,20", "30,30", "ten,10"]);
    }
}
