//! Run store trait

use async_trait::async_trait;

use super::{Run, StoreResult, Task};

/// Persistence for Run and Task rows.
///
/// Rows are written create-then-update, keyed by their generated ids. Each
/// Task row is owned by the single step that created it, so implementations
/// need no read-modify-write coordination beyond being safe for concurrent
/// use by independent runs.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Backend type name (e.g., "memory", "file")
    fn backend_type(&self) -> &'static str;

    /// Insert a new run. Fails with `Conflict` if the id exists.
    async fn create_run(&self, run: &Run) -> StoreResult<()>;

    /// Replace an existing run. Fails with `NotFound` if it was never created.
    async fn update_run(&self, run: &Run) -> StoreResult<()>;

    async fn get_run(&self, run_id: &str) -> StoreResult<Option<Run>>;

    /// Runs belonging to `user_id`, newest first
    async fn list_runs(&self, user_id: &str) -> StoreResult<Vec<Run>>;

    /// Insert a new task. The parent run must exist.
    async fn create_task(&self, task: &Task) -> StoreResult<()>;

    /// Replace an existing task.
    async fn update_task(&self, task: &Task) -> StoreResult<()>;

    /// Tasks of a run ordered by `order_index`
    async fn list_tasks(&self, run_id: &str) -> StoreResult<Vec<Task>>;
}
