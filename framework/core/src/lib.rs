mod batch;
mod error;
mod partition;
mod progress;

pub mod prelude {
    pub use crate::batch::{BatchExecutor, BatchResult};
    pub use crate::error::ExecutorError;
    pub use crate::partition::{partition_count, partition_items};
}
