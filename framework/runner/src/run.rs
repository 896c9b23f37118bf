use crate::error::ConfigError;
use crate::payload::PayloadSource;
use crate::step::StepRunner;
use crate::store::AnnotationStore;
use anyhow::Context;
use iiif_bench_summary_model::{BenchmarkLog, Phase, Step, StepLog};
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Everything the driver needs to know about one run, owned explicitly and
/// passed down; the CLI maps onto this but nothing in the runner reads
/// process-global state.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of concurrent workers per batch.
    pub threads: usize,
    /// Fraction of canvases that receive annotations during Populate.
    pub sample_ratio: f64,
    /// Repetition budget for the read/write/update micro-benchmarks.
    pub iterations: u64,
    /// Annotations inserted on each sampled canvas.
    pub annotations_per_canvas: u64,
    /// Directory the benchmark log is written to.
    pub out_dir: PathBuf,
    /// Whether the log is flushed to disk at all.
    pub write_log: bool,
    /// Whether batches render a progress bar.
    pub show_progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            threads: 20,
            sample_ratio: 0.01,
            iterations: 100,
            annotations_per_canvas: 1000,
            out_dir: PathBuf::from("out"),
            write_log: true,
            show_progress: true,
        }
    }
}

fn validate(config: &BenchmarkConfig, steps: &[Step]) -> Result<(), ConfigError> {
    if config.threads == 0 {
        return Err(ConfigError::ZeroThreads);
    }
    if !(config.sample_ratio > 0.0 && config.sample_ratio <= 1.0) {
        return Err(ConfigError::SampleRatioOutOfRange(config.sample_ratio));
    }
    if steps.is_empty() {
        return Err(ConfigError::NoSteps);
    }
    Ok(())
}

/// Run the benchmark over `steps`, in order.
///
/// The whole log is flushed to disk after every step, complete or partial,
/// so a run killed at step k still leaves the results of steps 1..k behind.
/// Returns the path the log was written to, or `None` when log writing is
/// disabled.
pub fn run(
    store: &dyn AnnotationStore,
    payloads: &dyn PayloadSource,
    steps: &[Step],
    config: &BenchmarkConfig,
) -> anyhow::Result<Option<PathBuf>> {
    validate(config, steps)?;

    let mut log = BenchmarkLog::new(
        store.server_name(),
        config.threads,
        config.iterations,
        config.sample_ratio,
        config.annotations_per_canvas,
    );
    // Fixed at construction: every flush overwrites the same file.
    let path = config.out_dir.join(format!(
        "log_benchmark_{}_{}.json",
        store.server_name(),
        chrono::Local::now().format("%Y-%m-%d-%H:%M:%S")
    ));

    let runner = StepRunner::new(store, payloads, config);

    for (index, step) in steps.iter().enumerate() {
        log::info!("-- step {}/{}: {} --", index + 1, steps.len(), step);

        let step_log = match runner.run(*step) {
            Ok(step_log) => step_log,
            Err(fatal) => {
                // Best-effort flush of what we have before bailing out.
                if config.write_log {
                    if let Err(e) = log.save(&path) {
                        log::error!("final log flush failed: {:?}", e);
                    }
                }
                return Err(anyhow::Error::from(fatal))
                    .with_context(|| format!("execution engine failed during step {}", step));
            }
        };

        log::info!(
            "-- step {}/{} finished: {} --",
            index + 1,
            steps.len(),
            describe(&step_log)
        );
        log.push(step_log);

        if config.write_log {
            log.save(&path).context("failed to flush benchmark log")?;
        }
    }

    // The per-step flush already covered every step; one more keeps the file
    // current even if flushing was toggled off for part of the run.
    if config.write_log {
        log.save(&path).context("failed to flush benchmark log")?;
        log::info!("results written to {}", path.display());
    }

    print_summary(&log);

    Ok(config.write_log.then_some(path))
}

fn describe(step_log: &StepLog) -> String {
    Phase::ALL
        .iter()
        .map(|phase| match step_log.duration(*phase) {
            Some(seconds) => format!("{}={:.3}s", phase, seconds),
            None => format!("{}=skipped", phase),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "step")]
    step: String,
    #[tabled(rename = "populate (s)")]
    populate: String,
    #[tabled(rename = "read (s)")]
    read: String,
    #[tabled(rename = "write (s)")]
    write: String,
    #[tabled(rename = "update (s)")]
    update: String,
    #[tabled(rename = "purge (s)")]
    purge: String,
}

fn cell(step_log: &StepLog, phase: Phase) -> String {
    step_log
        .duration(phase)
        .map(|seconds| format!("{:.3}", seconds))
        .unwrap_or_else(|| "-".to_string())
}

fn print_summary(log: &BenchmarkLog) {
    let rows: Vec<StepRow> = log
        .results
        .iter()
        .map(|step_log| StepRow {
            step: step_log.step.to_string(),
            populate: cell(step_log, Phase::Populate),
            read: cell(step_log, Phase::Read),
            write: cell(step_log, Phase::Write),
            update: cell(step_log, Phase::Update),
            purge: cell(step_log, Phase::Purge),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());

    println!("\nSummary of steps");
    println!("{}", table);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_threads() {
        let config = BenchmarkConfig {
            threads: 0,
            ..Default::default()
        };
        let steps = [Step {
            manifests: 1,
            canvases: 1,
        }];
        assert!(matches!(
            validate(&config, &steps),
            Err(ConfigError::ZeroThreads)
        ));
    }

    #[test]
    fn rejects_out_of_range_sample_ratio() {
        for ratio in [0.0, -0.5, 1.5, f64::NAN] {
            let config = BenchmarkConfig {
                sample_ratio: ratio,
                ..Default::default()
            };
            let steps = [Step {
                manifests: 1,
                canvases: 1,
            }];
            assert!(matches!(
                validate(&config, &steps),
                Err(ConfigError::SampleRatioOutOfRange(_))
            ));
        }
    }

    #[test]
    fn rejects_empty_step_list() {
        assert!(matches!(
            validate(&BenchmarkConfig::default(), &[]),
            Err(ConfigError::NoSteps)
        ));
    }
}
