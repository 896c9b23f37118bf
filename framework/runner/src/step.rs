use crate::error::PhaseError;
use crate::payload::PayloadSource;
use crate::run::BenchmarkConfig;
use crate::store::{AnnotationStore, CanvasId};
use iiif_bench_core::prelude::{BatchExecutor, ExecutorError};
use iiif_bench_summary_model::{Phase, Step, StepLog};
use std::time::{Duration, Instant};

/// Why a step stopped early.
///
/// A `Phase` error is local to the step: purge still runs and the run moves
/// on. A `Fatal` error is a fault of the execution engine and terminates the
/// run after a best-effort purge.
pub(crate) enum StepError {
    Phase(PhaseError),
    Fatal(ExecutorError),
}

impl From<PhaseError> for StepError {
    fn from(e: PhaseError) -> Self {
        Self::Phase(e)
    }
}

impl From<ExecutorError> for StepError {
    fn from(e: ExecutorError) -> Self {
        Self::Fatal(e)
    }
}

/// The canvases one step created, gathered during Populate and consumed by
/// the later phases.
struct Population {
    canvases: Vec<CanvasId>,
    annotated: Vec<CanvasId>,
}

/// Drives one step through Populate, Read, Write, Update and Purge.
///
/// Purge is always reached, whichever earlier phase failed; the timing log
/// of a failed step keeps `null` for every phase that did not complete.
pub(crate) struct StepRunner<'a> {
    store: &'a dyn AnnotationStore,
    payloads: &'a dyn PayloadSource,
    config: &'a BenchmarkConfig,
}

impl<'a> StepRunner<'a> {
    pub(crate) fn new(
        store: &'a dyn AnnotationStore,
        payloads: &'a dyn PayloadSource,
        config: &'a BenchmarkConfig,
    ) -> Self {
        Self {
            store,
            payloads,
            config,
        }
    }

    pub(crate) fn run(&self, step: Step) -> Result<StepLog, ExecutorError> {
        let mut log = StepLog::new(step);
        let outcome = self.measured_phases(step, &mut log);

        // Cleanup runs no matter how the phases went, so one step's leftover
        // data cannot bleed into the next step's sampling and counts.
        self.purge(&mut log);

        match outcome {
            Ok(()) => Ok(log),
            Err(StepError::Phase(e)) => {
                log::error!("step aborted, remaining phases skipped: {:?}", anyhow::Error::from(e));
                Ok(log)
            }
            Err(StepError::Fatal(e)) => Err(e),
        }
    }

    fn measured_phases(&self, step: Step, log: &mut StepLog) -> Result<(), StepError> {
        let population = self.populate(step, log)?;
        self.read(&population, log)?;
        self.write(step, &population, log)?;
        self.update(&population, log)?;
        Ok(())
    }

    fn executor(&self) -> BatchExecutor {
        let executor = BatchExecutor::new(self.config.threads);
        if self.config.show_progress {
            executor
        } else {
            executor.hide_progress()
        }
    }

    fn populate(&self, step: Step, log: &mut StepLog) -> Result<Population, StepError> {
        let started = Instant::now();

        let inserted = self.executor().run_repeat(
            &format!(
                "inserting {} manifests with {} canvases each",
                step.manifests, step.canvases
            ),
            step.manifests,
            || {
                let manifest = self.payloads.manifest(step.canvases);
                Ok(self.store.insert_manifest(&manifest)?)
            },
        )?;

        let canvases = inserted.produced_ids;
        if canvases.is_empty() && step.manifests > 0 {
            return Err(PhaseError::NoCanvases.into());
        }

        // The sample is drawn here, once, before any worker is dispatched.
        // Drawing inside a worker could select the same canvas from two
        // workers and break the "exactly round(n * ratio) canvases carry
        // annotations" invariant.
        let amount = (canvases.len() as f64 * self.config.sample_ratio).round() as usize;
        let sampled = sample_ids(&canvases, amount);

        let annotations_per_canvas = self.config.annotations_per_canvas;
        let annotated = if sampled.is_empty() {
            Vec::new()
        } else {
            let result = self.executor().run_items(
                &format!(
                    "annotating {} of {} canvases ({} annotations each)",
                    sampled.len(),
                    canvases.len(),
                    annotations_per_canvas
                ),
                sampled,
                |canvas| {
                    let list = self.payloads.annotation_list(&canvas, annotations_per_canvas);
                    self.store.insert_annotation_list(&list)?;
                    Ok(vec![canvas])
                },
            )?;
            result.produced_ids
        };

        log.record_duration(Phase::Populate, started.elapsed().as_secs_f64());
        Ok(Population {
            canvases,
            annotated,
        })
    }

    fn read(&self, population: &Population, log: &mut StepLog) -> Result<(), StepError> {
        if population.annotated.is_empty() || self.config.iterations == 0 {
            log::warn!("nothing to read, skipping read phase");
            return Ok(());
        }

        let sample = sample_ids(&population.annotated, self.config.iterations as usize);
        let started = Instant::now();

        let mut annotation_ids = Vec::new();
        let mut spent = Duration::ZERO;
        for canvas in &sample {
            let call = Instant::now();
            let list = self
                .store
                .get_annotation_list(canvas)
                .map_err(|e| PhaseError::operation("get_annotation_list", e))?;
            spent += call.elapsed();
            if list.is_empty() {
                return Err(PhaseError::EmptyAnnotationList(canvas.clone()).into());
            }
            annotation_ids.extend(list);
        }
        log.record_average(
            "get_annotation_list",
            spent.as_secs_f64() / sample.len() as f64,
        );

        if self.store.capabilities().annotation_fetch && !annotation_ids.is_empty() {
            let picks = sample_ids(&annotation_ids, self.config.iterations as usize);
            let mut spent = Duration::ZERO;
            for annotation in &picks {
                let call = Instant::now();
                self.store
                    .get_annotation(annotation)
                    .map_err(|e| PhaseError::operation("get_annotation", e))?;
                spent += call.elapsed();
            }
            log.record_average("get_annotation", spent.as_secs_f64() / picks.len() as f64);
        }

        log.record_duration(Phase::Read, started.elapsed().as_secs_f64());
        Ok(())
    }

    fn write(&self, step: Step, population: &Population, log: &mut StepLog) -> Result<(), StepError> {
        let iterations = self.config.iterations;
        if iterations == 0 {
            log::warn!("iterations is 0, skipping write phase");
            return Ok(());
        }
        let started = Instant::now();

        let mut spent = Duration::ZERO;
        for _ in 0..iterations {
            let manifest = self.payloads.manifest(step.canvases);
            let call = Instant::now();
            self.store
                .insert_manifest(&manifest)
                .map_err(|e| PhaseError::operation("insert_manifest", e))?;
            spent += call.elapsed();
        }
        log.record_average("insert_manifest", spent.as_secs_f64() / iterations as f64);

        // Single-annotation inserts target canvases from this step where any
        // exist; a zero-manifest step falls back to a generated canvas id.
        let fallback: Vec<CanvasId>;
        let targets: &[CanvasId] = if !population.annotated.is_empty() {
            &population.annotated
        } else if !population.canvases.is_empty() {
            &population.canvases
        } else {
            fallback = self.payloads.manifest(1).canvas_ids;
            &fallback
        };

        let mut spent = Duration::ZERO;
        for index in 0..iterations {
            let canvas = &targets[index as usize % targets.len()];
            let annotation = self.payloads.annotation(canvas);
            let call = Instant::now();
            self.store
                .insert_annotation(&annotation)
                .map_err(|e| PhaseError::operation("insert_annotation", e))?;
            spent += call.elapsed();
        }
        log.record_average("insert_annotation", spent.as_secs_f64() / iterations as f64);

        if self.store.capabilities().annotation_list_insert {
            let mut spent = Duration::ZERO;
            for index in 0..iterations {
                let canvas = &targets[index as usize % targets.len()];
                let list = self
                    .payloads
                    .annotation_list(canvas, self.config.annotations_per_canvas);
                let call = Instant::now();
                self.store
                    .insert_annotation_list(&list)
                    .map_err(|e| PhaseError::operation("insert_annotation_list", e))?;
                spent += call.elapsed();
            }
            log.record_average(
                "insert_annotation_list",
                spent.as_secs_f64() / iterations as f64,
            );
        }

        log.record_duration(Phase::Write, started.elapsed().as_secs_f64());
        Ok(())
    }

    fn update(&self, population: &Population, log: &mut StepLog) -> Result<(), StepError> {
        if !self.store.capabilities().annotation_update {
            log::debug!(
                "backend {} does not support annotation updates, skipping update phase",
                self.store.server_name()
            );
            return Ok(());
        }
        if population.annotated.is_empty() || self.config.iterations == 0 {
            log::warn!("nothing to update, skipping update phase");
            return Ok(());
        }

        let sample = sample_ids(&population.annotated, self.config.iterations as usize);
        let started = Instant::now();

        // Setup: give every sampled canvas one annotation we own. Untimed.
        let mut inserted = Vec::with_capacity(sample.len());
        for canvas in &sample {
            let annotation = self.payloads.annotation(canvas);
            self.store
                .insert_annotation(&annotation)
                .map_err(|e| PhaseError::operation("insert_annotation", e))?;
            inserted.push(annotation);
        }

        let mut spent = Duration::ZERO;
        for annotation in &inserted {
            let revised = self.payloads.revised_annotation(annotation);
            let call = Instant::now();
            self.store
                .update_annotation(&revised)
                .map_err(|e| PhaseError::operation("update_annotation", e))?;
            spent += call.elapsed();
        }
        log.record_average(
            "update_annotation",
            spent.as_secs_f64() / inserted.len() as f64,
        );

        log.record_duration(Phase::Update, started.elapsed().as_secs_f64());
        Ok(())
    }

    fn purge(&self, log: &mut StepLog) {
        let started = Instant::now();
        match self.store.purge() {
            Ok(()) => {
                let seconds = started.elapsed().as_secs_f64();
                log.record_duration(Phase::Purge, seconds);
                log::info!("purged backend in {:.3}s", seconds);
            }
            Err(e) => {
                // Best effort: the next step must tolerate leftover data.
                log::error!("purge failed, leftover data may remain: {:?}", anyhow::Error::from(e));
            }
        }
    }
}

/// Draw `amount` distinct identifiers from `pool`, uniformly, capped at the
/// pool size.
fn sample_ids(pool: &[String], amount: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    rand::seq::index::sample(&mut rng, pool.len(), amount.min(pool.len()))
        .into_iter()
        .map(|i| pool[i].clone())
        .collect()
}
