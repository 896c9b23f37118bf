use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One scaling point of the benchmark: how many manifests to insert and how
/// many canvases each manifest carries. A run is an ordered sequence of
/// steps, by convention in ascending scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub manifests: u64,
    pub canvases: u64,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} manifests x {} canvases",
            self.manifests, self.canvases
        )
    }
}

/// The phases a step moves through, in execution order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Populate,
    Read,
    Write,
    Update,
    Purge,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Populate,
        Phase::Read,
        Phase::Write,
        Phase::Update,
        Phase::Purge,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Populate => "populate",
            Phase::Read => "read",
            Phase::Write => "write",
            Phase::Update => "update",
            Phase::Purge => "purge",
        };
        f.write_str(name)
    }
}

/// Timing record for one step.
///
/// Every phase is present in `durations` from the start, holding `None`
/// until the phase completes. A phase that fails or is skipped because an
/// earlier phase failed keeps its `None`, so a partial step is visible as
/// such in the persisted log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepLog {
    pub step: Step,
    /// Wall-clock seconds per phase.
    pub durations: BTreeMap<Phase, Option<f64>>,
    /// Average per-call latency in seconds for each micro-benchmarked
    /// operation, keyed by operation name.
    pub averages: BTreeMap<String, f64>,
}

impl StepLog {
    pub fn new(step: Step) -> Self {
        Self {
            step,
            durations: Phase::ALL.iter().map(|phase| (*phase, None)).collect(),
            averages: BTreeMap::new(),
        }
    }

    pub fn record_duration(&mut self, phase: Phase, seconds: f64) {
        self.durations.insert(phase, Some(seconds));
    }

    pub fn duration(&self, phase: Phase) -> Option<f64> {
        self.durations.get(&phase).copied().flatten()
    }

    pub fn record_average(&mut self, operation: &str, seconds: f64) {
        self.averages.insert(operation.to_string(), seconds);
    }
}

/// The accumulated results of one benchmark run.
///
/// Created once at driver construction and flushed to disk after every step,
/// so a run killed at step k still leaves steps 1..k on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkLog {
    pub server_name: String,
    pub thread_count: usize,
    pub iteration_count: u64,
    pub sample_ratio: f64,
    pub annotations_per_canvas: u64,
    /// Unix timestamp in seconds of when the run started.
    pub started_at: i64,
    pub results: Vec<StepLog>,
}

impl BenchmarkLog {
    pub fn new(
        server_name: impl Into<String>,
        thread_count: usize,
        iteration_count: u64,
        sample_ratio: f64,
        annotations_per_canvas: u64,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            thread_count,
            iteration_count,
            sample_ratio,
            annotations_per_canvas,
            started_at: chrono::Utc::now().timestamp(),
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, step_log: StepLog) {
        self.results.push(step_log);
    }

    /// Write the whole log to `path` as pretty-printed JSON.
    ///
    /// Overwrites any previous content, so repeated flushes of the same log
    /// are idempotent.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write log file {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse log file {}", path.display()))
    }
}
