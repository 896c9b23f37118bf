/// Errors raised by the batch-execution engine itself.
///
/// Failures of individual work items are not represented here. They are
/// recovered inside the worker and show up as the `errors` count on
/// [crate::batch::BatchResult]. These variants cover bad input and faults in
/// the worker-pool infrastructure, which are fatal to the batch.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("failed to spawn worker thread")]
    Spawn(#[source] std::io::Error),

    #[error("worker thread panicked")]
    WorkerPanic,
}
