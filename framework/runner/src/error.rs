use crate::store::{CanvasId, StoreError};

/// Bad configuration. Surfaced before the run starts; nothing is executed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("thread count must be at least 1")]
    ZeroThreads,

    #[error("sample ratio must be in (0, 1], got {0}")]
    SampleRatioOutOfRange(f64),

    #[error("at least one step is required")]
    NoSteps,
}

/// A phase-level invariant failed.
///
/// Aborts the remaining phases of the current step only. Purge still runs
/// and the run continues with the next step.
#[derive(Debug, thiserror::Error)]
pub enum PhaseError {
    #[error("populate produced no canvas identifiers")]
    NoCanvases,

    #[error("annotated canvas {0} returned an empty annotation list")]
    EmptyAnnotationList(CanvasId),

    #[error("{operation} failed")]
    Operation {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl PhaseError {
    pub(crate) fn operation(operation: &'static str, source: StoreError) -> Self {
        Self::Operation { operation, source }
    }
}
