//! Result files for Flip 7.
//!
//! Two kinds of files live in the data directory:
//! - `sim_results_{X}.jsonl`: one simulated hand per line at threshold X
//! - `multisim_results.json`: the solved strategy table and its parameters

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::hand::SimulationRecord;
use crate::induction::{GameState, InductionSolver, SolverConfig, StrategyExport, StrategyTable, TurnGame};

/// Default data directory.
pub const DATA_DIR: &str = "data";

/// File name of the strategy table.
pub const STRATEGY_FILE_NAME: &str = "multisim_results.json";

const SAMPLE_PREFIX: &str = "sim_results_";
const SAMPLE_SUFFIX: &str = ".jsonl";

/// Errors from reading or writing result files.
#[derive(Debug)]
pub enum StoreError {
    /// The requested file does not exist yet.
    ResultsNotFound(PathBuf),
    /// A file-system operation failed.
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// A record or table entry could not be parsed.
    Malformed {
        /// File involved.
        path: PathBuf,
        /// Line number (1-based) or 0 for whole-file documents.
        line: usize,
        /// Parser message.
        message: String,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Error for a failed read; a missing file means no results yet.
    fn read(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            StoreError::ResultsNotFound(path.to_path_buf())
        } else {
            Self::io(path, source)
        }
    }

    /// Whether this error only means "nothing has been produced yet".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::ResultsNotFound(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::ResultsNotFound(path) => {
                write!(f, "No results found at {}", path.display())
            }
            StoreError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            StoreError::Malformed { path, line, message } => {
                write!(f, "{}:{}: malformed record: {}", path.display(), line, message)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Records read back from a sample file.
#[derive(Debug, Clone, Default)]
pub struct SampleLoad {
    /// Records that parsed.
    pub records: Vec<SimulationRecord>,
    /// Lines that did not parse and were skipped.
    pub skipped: usize,
}

/// Append-only per-threshold sample files.
#[derive(Debug, Clone)]
pub struct SampleStore {
    dir: PathBuf,
}

impl Default for SampleStore {
    fn default() -> Self {
        Self::new(DATA_DIR)
    }
}

impl SampleStore {
    /// Store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the sample file for threshold `x`.
    pub fn sample_path(&self, x: u32) -> PathBuf {
        self.dir.join(format!("{}{}{}", SAMPLE_PREFIX, x, SAMPLE_SUFFIX))
    }

    /// Append records to the file for threshold `x`, creating it if needed.
    ///
    /// Each record is written as one JSON line. Existing lines are never
    /// rewritten, so repeated runs at the same threshold accumulate.
    ///
    /// # Returns
    /// The path of the sample file.
    ///
    /// # Errors
    /// `StoreError::Io` with the offending path if the directory or file
    /// cannot be created or written.
    pub fn append(&self, x: u32, records: &[SimulationRecord]) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;

        let path = self.sample_path(x);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        let mut writer = BufWriter::new(file);

        for record in records {
            serde_json::to_writer(&mut writer, record).map_err(|e| StoreError::Io {
                path: path.clone(),
                source: e.into(),
            })?;
            writer.write_all(b"\n").map_err(|e| StoreError::io(&path, e))?;
        }
        writer.flush().map_err(|e| StoreError::io(&path, e))?;

        Ok(path)
    }

    /// Read every record for threshold `x`, skipping malformed lines.
    ///
    /// Blank lines are ignored. Lines that do not parse are logged and
    /// counted in [`SampleLoad::skipped`].
    ///
    /// # Errors
    /// - `StoreError::ResultsNotFound` if no samples exist for `x`
    /// - `StoreError::Io` for any other read failure
    pub fn load(&self, x: u32) -> Result<SampleLoad, StoreError> {
        let path = self.sample_path(x);
        let file = File::open(&path).map_err(|e| StoreError::read(&path, e))?;
        let mut load = SampleLoad::default();

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StoreError::read(&path, e))?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<SimulationRecord>(&line) {
                Ok(record) => load.records.push(record),
                Err(e) => {
                    let err = StoreError::Malformed {
                        path: path.clone(),
                        line: index + 1,
                        message: e.to_string(),
                    };
                    log::warn!("skipping {}", err);
                    load.skipped += 1;
                }
            }
        }

        Ok(load)
    }

    /// Thresholds that have a sample file, ascending.
    ///
    /// A missing data directory means no thresholds.
    pub fn available_thresholds(&self) -> Result<Vec<u32>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut thresholds = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let name = entry.file_name();
            let parsed = name
                .to_str()
                .and_then(|n| n.strip_prefix(SAMPLE_PREFIX))
                .and_then(|n| n.strip_suffix(SAMPLE_SUFFIX))
                .and_then(|n| n.parse::<u32>().ok());
            if let Some(x) = parsed {
                thresholds.push(x);
            }
        }

        thresholds.sort_unstable();
        Ok(thresholds)
    }
}

/// Aggregate statistics over one threshold's samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    /// Threshold the hands were played at.
    pub threshold: u32,
    /// Number of hands.
    pub hands: usize,
    /// Mean score.
    pub mean: f64,
    /// Median score.
    pub median: f64,
    /// Fraction of hands that busted.
    pub bust_rate: f64,
    /// Fraction of hands that earned the seven-card bonus.
    pub flip_seven_rate: f64,
}

impl SampleSummary {
    /// Summarize a set of records; `None` when there are none.
    pub fn from_records(threshold: u32, records: &[SimulationRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let hands = records.len();
        let mut scores: Vec<u32> = records.iter().map(|r| r.total_value).collect();
        scores.sort_unstable();

        let mid = hands / 2;
        let median = if hands % 2 == 0 {
            (scores[mid - 1] as f64 + scores[mid] as f64) / 2.0
        } else {
            scores[mid] as f64
        };

        let total: u64 = scores.iter().map(|&s| s as u64).sum();
        let busts = records.iter().filter(|r| r.is_bust).count();
        let sevens = records.iter().filter(|r| r.is_flip_seven_bonus).count();

        Some(Self {
            threshold,
            hands,
            mean: total as f64 / hands as f64,
            median,
            bust_rate: busts as f64 / hands as f64,
            flip_seven_rate: sevens as f64 / hands as f64,
        })
    }
}

/// Parameters a strategy table was solved with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Candidate thresholds.
    pub x_values: Vec<u32>,
    /// Score grid.
    pub score_steps: Vec<u32>,
    /// Samples per evaluation.
    pub sims_per_strategy: usize,
    /// Score needed to win.
    pub win_threshold: u32,
}

impl From<&SolverConfig> for Parameters {
    fn from(config: &SolverConfig) -> Self {
        Self {
            x_values: config.thresholds.clone(),
            score_steps: config.score_steps(),
            sims_per_strategy: config.samples_per_strategy,
            win_threshold: config.win_threshold,
        }
    }
}

/// On-disk strategy table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyFile {
    /// Best threshold per `"p1,p2"` key.
    pub optimal_strategies: BTreeMap<String, u32>,
    /// Win probability per `"p1,p2"` key.
    pub win_probs: BTreeMap<String, f64>,
    /// Solve parameters.
    pub parameters: Parameters,
    /// Entries dropped on load because their value did not parse.
    #[serde(skip)]
    pub skipped: Vec<String>,
}

/// Strategy file as read from disk, before entry values are checked.
#[derive(Deserialize)]
struct RawStrategyFile {
    optimal_strategies: BTreeMap<String, serde_json::Value>,
    win_probs: BTreeMap<String, serde_json::Value>,
    parameters: Parameters,
}

/// Keep the entries whose value converts, recording the keys of the rest.
fn convert_entries<T>(
    path: &Path,
    field: &str,
    raw: BTreeMap<String, serde_json::Value>,
    convert: impl Fn(&serde_json::Value) -> Option<T>,
    skipped: &mut Vec<String>,
) -> BTreeMap<String, T> {
    let mut entries = BTreeMap::new();
    for (key, value) in raw {
        match convert(&value) {
            Some(v) => {
                entries.insert(key, v);
            }
            None => {
                log::warn!(
                    "{}: skipping {} entry {:?} with value {}",
                    path.display(),
                    field,
                    key,
                    value
                );
                skipped.push(key);
            }
        }
    }
    entries
}

/// A strategy table read back from disk.
#[derive(Debug)]
pub struct LoadedStrategy {
    /// Finalized states.
    pub table: StrategyTable,
    /// Solve parameters.
    pub parameters: Parameters,
    /// Keys that could not be reconstructed.
    pub skipped: Vec<String>,
}

impl StrategyFile {
    /// Build from a table and the configuration it was solved with.
    pub fn new(table: &StrategyTable, config: &SolverConfig) -> Self {
        let StrategyExport {
            optimal_strategies,
            win_probs,
        } = table.export();

        Self {
            optimal_strategies,
            win_probs,
            parameters: Parameters::from(config),
            skipped: Vec::new(),
        }
    }

    /// Build from a finished solver.
    pub fn from_solver<G: TurnGame>(solver: &InductionSolver<G>) -> Self {
        Self::new(solver.table(), solver.config())
    }

    /// Default location inside a data directory.
    pub fn path_in(dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(STRATEGY_FILE_NAME)
    }

    /// Save as pretty JSON, creating the parent directory.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        fs::write(path, json).map_err(|e| StoreError::io(path, e))
    }

    /// Load a strategy table from JSON.
    ///
    /// The document structure must be intact: a file that is not JSON, or
    /// that lacks one of the top-level fields, is rejected as a whole.
    /// Individual table entries are checked one at a time, so a threshold
    /// that is not a `u32` or a win probability that is not a number only
    /// drops that entry.
    ///
    /// # Returns
    /// The file with every valid entry. Keys of dropped entries are listed
    /// in `skipped`.
    ///
    /// # Errors
    /// - `StoreError::ResultsNotFound` if the file does not exist
    /// - `StoreError::Malformed` if the document structure does not parse
    /// - `StoreError::Io` for any other read failure
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| StoreError::read(path, e))?;
        let raw: RawStrategyFile = serde_json::from_str(&json).map_err(|e| StoreError::Malformed {
            path: path.to_path_buf(),
            line: e.line(),
            message: e.to_string(),
        })?;

        let mut skipped = Vec::new();
        let optimal_strategies = convert_entries(
            path,
            "optimal_strategies",
            raw.optimal_strategies,
            |v| v.as_u64().and_then(|x| u32::try_from(x).ok()),
            &mut skipped,
        );
        let win_probs = convert_entries(
            path,
            "win_probs",
            raw.win_probs,
            serde_json::Value::as_f64,
            &mut skipped,
        );

        Ok(Self {
            optimal_strategies,
            win_probs,
            parameters: raw.parameters,
            skipped,
        })
    }

    /// Reconstruct the in-memory table with `GameState` keys.
    ///
    /// Entries already dropped by [`StrategyFile::load`] stay in the skipped
    /// list. Keys that do not parse as a state, or that have only one of
    /// the two values, are added to it.
    pub fn into_loaded(self) -> LoadedStrategy {
        let export = StrategyExport {
            optimal_strategies: self.optimal_strategies,
            win_probs: self.win_probs,
        };
        let (table, unmatched) = StrategyTable::import(&export);
        for key in &unmatched {
            log::warn!("skipping malformed strategy entry {:?}", key);
        }

        let mut skipped = self.skipped;
        for key in unmatched {
            if !skipped.contains(&key) {
                skipped.push(key);
            }
        }

        LoadedStrategy {
            table,
            parameters: self.parameters,
            skipped,
        }
    }

    /// Best threshold stored for `state`, looked up by key.
    pub fn threshold_at(&self, state: GameState) -> Option<u32> {
        self.optimal_strategies.get(&state.key()).copied()
    }
}
