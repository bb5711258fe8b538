//! Persistence for orchestration runs.
//!
//! A [`Run`] records one orchestration invocation and a [`Task`] records
//! one pipeline step within it. Both are written create-then-update through
//! the [`RunStore`] trait, which has an in-memory and a file-backed
//! implementation.

mod errors;
#[cfg(feature = "file-store")]
mod file;
mod memory;
mod models;
mod traits;

pub use errors::{StoreError, StoreResult};
#[cfg(feature = "file-store")]
pub use file::FileRunStore;
pub use memory::InMemoryRunStore;
pub use models::{Run, RunStatus, Task, TaskMetadata, TaskStatus};
pub use traits::RunStore;

use std::sync::Arc;

use crate::config::{StorageBackendKind, StorageConfig};

/// Open the store selected by configuration.
pub fn open_store(config: &StorageConfig) -> StoreResult<Arc<dyn RunStore>> {
    match config.backend {
        StorageBackendKind::Memory => Ok(Arc::new(InMemoryRunStore::new())),
        #[cfg(feature = "file-store")]
        StorageBackendKind::File => {
            tracing::debug!(path = %config.path.display(), "Opening file run store");
            Ok(Arc::new(FileRunStore::new(&config.path)?))
        }
        #[cfg(not(feature = "file-store"))]
        StorageBackendKind::File => Err(StoreError::backend(
            "file storage requires the `file-store` feature",
        )),
    }
}
