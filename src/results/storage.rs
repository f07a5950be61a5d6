//! Results storage and retrieval
//!
//! Provides persistent storage for run results in JSON format.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::invoker::RoundAggregate;
use crate::models::RunSummary;

/// Stored run containing all round summaries
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredRun {
    /// Unique run ID
    pub id: String,

    /// Command line that was invoked
    pub command_line: String,

    /// Timestamp when the run started
    pub started_at: DateTime<Utc>,

    /// Timestamp when the run completed
    pub completed_at: DateTime<Utc>,

    /// Number of rounds
    pub rounds: u32,

    /// Round summaries
    pub summaries: Vec<RunSummary>,

    /// Aggregate statistics across rounds
    pub aggregate: Option<StoredAggregate>,

    /// Environment info
    pub environment: EnvironmentInfo,
}

/// Aggregate statistics in storable form
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredAggregate {
    pub rounds: u32,
    pub clean_rounds: u32,
    pub total_invocations: usize,
    pub passed: usize,
    pub pass_rate: f64,
    pub flaky: bool,
    pub total_duration_ms: u64,
}

impl From<&RoundAggregate> for StoredAggregate {
    fn from(aggregate: &RoundAggregate) -> Self {
        Self {
            rounds: aggregate.rounds,
            clean_rounds: aggregate.clean_rounds,
            total_invocations: aggregate.total_invocations,
            passed: aggregate.passed,
            pass_rate: aggregate.pass_rate,
            flaky: aggregate.is_flaky(),
            total_duration_ms: aggregate.total_duration_ms,
        }
    }
}

/// Environment information
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    /// Operating system
    pub os: String,

    /// Architecture
    pub arch: String,

    /// Tool version
    pub tool_version: String,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl StoredRun {
    /// Create a new stored run
    pub fn new(command_line: impl Into<String>) -> Self {
        Self {
            id: generate_run_id(),
            command_line: command_line.into(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            rounds: 0,
            summaries: Vec::new(),
            aggregate: None,
            environment: EnvironmentInfo::default(),
        }
    }

    /// Add a round summary
    pub fn add_round(&mut self, summary: RunSummary) {
        self.rounds = summary.round.max(self.rounds);
        self.summaries.push(summary);
        self.completed_at = Utc::now();
    }

    /// Record aggregate statistics
    pub fn set_aggregate(&mut self, aggregate: &RoundAggregate) {
        self.aggregate = Some(aggregate.into());
    }

    /// True iff every invocation in every round passed
    pub fn all_passed(&self) -> bool {
        !self.summaries.is_empty() && self.summaries.iter().all(|s| s.all_passed())
    }
}

/// Generate unique run ID
fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}

/// Results storage manager
pub struct ResultsStorage {
    /// Base directory for results
    base_dir: PathBuf,
}

impl ResultsStorage {
    /// Create a new results storage
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create with default directory
    pub fn default_dir() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flakecheck")
            .join("results");
        Ok(Self::new(base_dir))
    }

    /// Ensure storage directory exists
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.base_dir.join(format!("{run_id}.json"))
    }

    /// Save a run
    pub fn save(&self, run: &StoredRun) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.run_path(&run.id);

        let file = File::create(&path)
            .with_context(|| format!("Failed to create result file: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), run)
            .context("Failed to serialize run")?;

        info!("Saved run {} to {}", run.id, path.display());
        Ok(path)
    }

    /// List stored run IDs, most recent first
    pub fn list_runs(&self) -> Result<Vec<String>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<String> = fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    path.file_stem().map(|s| s.to_string_lossy().to_string())
                } else {
                    None
                }
            })
            .collect();

        // Run IDs are timestamp-prefixed, so lexicographic order is
        // chronological.
        ids.sort();
        ids.reverse();
        Ok(ids)
    }

    /// Load a run by ID
    pub fn load(&self, run_id: &str) -> Result<StoredRun> {
        let path = self.run_path(run_id);
        debug!("Loading run from {}", path.display());

        let file = File::open(&path)
            .with_context(|| format!("Failed to open result file: {}", path.display()))?;
        let run: StoredRun =
            serde_json::from_reader(BufReader::new(file)).context("Failed to parse run")?;

        Ok(run)
    }

    /// Load the most recent run, if any
    pub fn latest(&self) -> Result<Option<StoredRun>> {
        match self.list_runs()?.first() {
            Some(id) => Ok(Some(self.load(id)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvocationResult;
    use tempfile::tempdir;

    fn sample_run(id_suffix: &str) -> StoredRun {
        let mut run = StoredRun::new("sh -c true");
        run.id = format!("20260101_000000_{id_suffix}");
        run.add_round(RunSummary::new(
            1,
            "sh -c true",
            10,
            vec![
                InvocationResult::passed(0, 5),
                InvocationResult::passed(1, 8),
            ],
        ));
        run
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());

        let run = sample_run("0001");
        storage.save(&run).unwrap();

        let loaded = storage.load(&run.id).unwrap();
        assert_eq!(loaded.id, run.id);
        assert_eq!(loaded.command_line, "sh -c true");
        assert_eq!(loaded.summaries.len(), 1);
        assert!(loaded.all_passed());
    }

    #[test]
    fn test_list_runs_most_recent_first() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());

        storage.save(&sample_run("0001")).unwrap();
        storage.save(&sample_run("0002")).unwrap();

        let ids = storage.list_runs().unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids[0].ends_with("0002"));
    }

    #[test]
    fn test_latest_on_empty_storage() {
        let dir = tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path().join("missing"));
        assert!(storage.latest().unwrap().is_none());
    }

    #[test]
    fn test_run_id_format() {
        let id = generate_run_id();
        // YYYYMMDD_HHMMSS_NNNN
        assert_eq!(id.len(), 20);
        assert_eq!(id.matches('_').count(), 2);
    }
}
