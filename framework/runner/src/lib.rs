mod cli;
mod error;
mod init;
mod payload;
mod run;
mod step;
mod store;

pub mod prelude {
    pub use crate::cli::BenchCli;
    pub use crate::error::{ConfigError, PhaseError};
    pub use crate::init::init;
    pub use crate::payload::{
        AnnotationListPayload, AnnotationPayload, ManifestPayload, PayloadSource,
    };
    pub use crate::run::{run, BenchmarkConfig};
    pub use crate::store::{
        AnnotationId, AnnotationStore, Capabilities, CanvasId, ManifestId, StoreError,
    };

    pub use iiif_bench_core::prelude::*;
    pub use iiif_bench_summary_model::{BenchmarkLog, Phase, Step, StepLog};
}
