use crate::error::ExecutorError;
use crate::partition::{partition_count, partition_items};
use crate::progress::BatchProgress;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The aggregated outcome of one batch.
///
/// `success + errors` equals the number of items dispatched across all
/// workers. `produced_ids` holds whatever identifiers the worker function
/// reported for successful items, concatenated in worker-index order; a
/// success may contribute zero identifiers (deletes do).
#[derive(Debug, Default)]
pub struct BatchResult {
    pub success: u64,
    pub errors: u64,
    pub produced_ids: Vec<String>,
}

impl BatchResult {
    pub fn total(&self) -> u64 {
        self.success + self.errors
    }

    fn record(&mut self, outcome: anyhow::Result<Vec<String>>) {
        match outcome {
            Ok(ids) => {
                self.success += 1;
                self.produced_ids.extend(ids);
            }
            Err(e) => {
                self.errors += 1;
                log::debug!("work item failed: {:?}", e);
            }
        }
    }

    fn merge(&mut self, other: BatchResult) {
        self.success += other.success;
        self.errors += other.errors;
        self.produced_ids.extend(other.produced_ids);
    }
}

/// Runs a worker function over a unit of work, spread across a fixed pool of
/// OS threads.
///
/// One call runs to completion before returning: all workers are joined, so
/// the caller can treat the batch as a barrier. An `Err` returned by the
/// worker function for a single item is recovered and counted; it never
/// aborts the batch. A panic in the worker function, or a failure to spawn a
/// worker, is a fault of the pool itself and propagates as [ExecutorError].
pub struct BatchExecutor {
    worker_count: usize,
    show_progress: bool,
}

impl BatchExecutor {
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            show_progress: true,
        }
    }

    /// Suppress the progress bar for this executor.
    pub fn hide_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Invoke `worker_fn` roughly `total` times, split across the pool.
    ///
    /// "Roughly" because the per-worker repetition budget is
    /// `total / worker_count`: the remainder is not dispatched. See
    /// [partition_count] for why this truncation is kept.
    pub fn run_repeat<F>(
        &self,
        label: &str,
        total: u64,
        worker_fn: F,
    ) -> Result<BatchResult, ExecutorError>
    where
        F: Fn() -> anyhow::Result<Vec<String>> + Sync,
    {
        let chunks = partition_count(total, self.worker_count)?;
        let dispatched: u64 = chunks.iter().sum();
        self.execute(label, dispatched, chunks, |reps, counter: &AtomicU64| {
            let mut partial = BatchResult::default();
            for _ in 0..reps {
                partial.record(worker_fn());
                counter.fetch_add(1, Ordering::Relaxed);
            }
            partial
        })
    }

    /// Invoke `worker_fn` once per item, split across the pool.
    ///
    /// Items within one worker's chunk are processed sequentially in
    /// partition order; no ordering holds between workers.
    pub fn run_items<T, F>(
        &self,
        label: &str,
        items: Vec<T>,
        worker_fn: F,
    ) -> Result<BatchResult, ExecutorError>
    where
        T: Send,
        F: Fn(T) -> anyhow::Result<Vec<String>> + Sync,
    {
        let total = items.len() as u64;
        let chunks = partition_items(items, self.worker_count)?;
        self.execute(label, total, chunks, |chunk: Vec<T>, counter| {
            let mut partial = BatchResult::default();
            for item in chunk {
                partial.record(worker_fn(item));
                counter.fetch_add(1, Ordering::Relaxed);
            }
            partial
        })
    }

    fn execute<W, F>(
        &self,
        label: &str,
        total_units: u64,
        chunks: Vec<W>,
        run_chunk: F,
    ) -> Result<BatchResult, ExecutorError>
    where
        W: Send,
        F: Fn(W, &AtomicU64) -> BatchResult + Sync,
    {
        let counter = Arc::new(AtomicU64::new(0));
        let progress = if self.show_progress {
            BatchProgress::start(label, total_units, counter.clone())
        } else {
            BatchProgress::disabled()
        };

        let result = std::thread::scope(|scope| {
            let run_chunk = &run_chunk;
            let mut handles = Vec::with_capacity(chunks.len());
            for (index, chunk) in chunks.into_iter().enumerate() {
                let counter = &*counter;
                let handle = std::thread::Builder::new()
                    .name(format!("worker-{}", index))
                    .spawn_scoped(scope, move || run_chunk(chunk, counter))
                    .map_err(ExecutorError::Spawn)?;
                handles.push(handle);
            }

            // Joining in spawn order keeps produced_ids in worker-index order.
            let mut aggregate = BatchResult::default();
            for handle in handles {
                aggregate.merge(handle.join().map_err(|_| ExecutorError::WorkerPanic)?);
            }
            Ok(aggregate)
        });
        progress.finish();

        let result = result?;
        log::info!(
            "{}: success={}, error={}",
            label,
            result.success,
            result.errors
        );
        Ok(result)
    }
}
