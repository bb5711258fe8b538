//! In-memory run store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{Run, RunStore, StoreError, StoreResult, Task};

/// Process-local store backed by hash maps.
///
/// Used by tests and by deployments that do not need runs to survive a
/// restart.
#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    runs: RwLock<HashMap<String, Run>>,
    tasks: RwLock<HashMap<String, Vec<Task>>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunStore for InMemoryRunStore {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn create_run(&self, run: &Run) -> StoreResult<()> {
        let mut runs = self.runs.write().await;
        if runs.contains_key(&run.id) {
            return Err(StoreError::conflict("run", &run.id));
        }
        runs.insert(run.id.clone(), run.clone());
        Ok(())
    }

    async fn update_run(&self, run: &Run) -> StoreResult<()> {
        let mut runs = self.runs.write().await;
        match runs.get_mut(&run.id) {
            Some(existing) => {
                *existing = run.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("run", &run.id)),
        }
    }

    async fn get_run(&self, run_id: &str) -> StoreResult<Option<Run>> {
        Ok(self.runs.read().await.get(run_id).cloned())
    }

    async fn list_runs(&self, user_id: &str) -> StoreResult<Vec<Run>> {
        let mut runs: Vec<Run> = self
            .runs
            .read()
            .await
            .values()
            .filter(|run| run.user_id == user_id)
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(runs)
    }

    async fn create_task(&self, task: &Task) -> StoreResult<()> {
        if !self.runs.read().await.contains_key(&task.run_id) {
            return Err(StoreError::not_found("run", &task.run_id));
        }

        let mut tasks = self.tasks.write().await;
        let run_tasks = tasks.entry(task.run_id.clone()).or_default();
        if run_tasks.iter().any(|t| t.id == task.id) {
            return Err(StoreError::conflict("task", &task.id));
        }
        run_tasks.push(task.clone());
        Ok(())
    }

    async fn update_task(&self, task: &Task) -> StoreResult<()> {
        let mut tasks = self.tasks.write().await;
        let existing = tasks
            .get_mut(&task.run_id)
            .and_then(|run_tasks| run_tasks.iter_mut().find(|t| t.id == task.id))
            .ok_or_else(|| StoreError::not_found("task", &task.id))?;
        *existing = task.clone();
        Ok(())
    }

    async fn list_tasks(&self, run_id: &str) -> StoreResult<Vec<Task>> {
        let mut tasks = self
            .tasks
            .read()
            .await
            .get(run_id)
            .cloned()
            .unwrap_or_default();
        tasks.sort_by_key(|t| t.order_index);
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AgentId;
    use crate::routing::Intent;
    use crate::store::{RunStatus, TaskStatus};

    #[tokio::test]
    async fn test_run_create_update_get() {
        let store = InMemoryRunStore::new();
        let mut run = Run::new("user-1", "debug my fifo", Intent::Debug);
        store.create_run(&run).await.unwrap();

        run.mark_running().unwrap();
        store.update_run(&run).await.unwrap();

        let loaded = store.get_run(&run.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, RunStatus::Running);
        assert!(store.get_run("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_run_conflicts() {
        let store = InMemoryRunStore::new();
        let run = Run::new("user-1", "x", Intent::General);
        store.create_run(&run).await.unwrap();
        assert!(matches!(
            store.create_run(&run).await,
            Err(StoreError::Conflict { kind: "run", .. })
        ));
    }

    #[tokio::test]
    async fn test_update_unknown_run_fails() {
        let store = InMemoryRunStore::new();
        let run = Run::new("user-1", "x", Intent::General);
        assert!(store.update_run(&run).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_task_requires_parent_run() {
        let store = InMemoryRunStore::new();
        let task = Task::start("no-such-run", AgentId::Generalist, 0, "hi");
        assert!(store.create_task(&task).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_tasks_listed_in_order() {
        let store = InMemoryRunStore::new();
        let run = Run::new("user-1", "design a fifo", Intent::Design);
        store.create_run(&run).await.unwrap();

        let second = Task::start(&run.id, AgentId::RtlEngineer, 1, "b");
        let mut first = Task::start(&run.id, AgentId::Architect, 0, "a");
        store.create_task(&second).await.unwrap();
        store.create_task(&first).await.unwrap();

        first.complete("plan", None, None).unwrap();
        store.update_task(&first).await.unwrap();

        let tasks = store.list_tasks(&run.id).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].agent_id, AgentId::Architect);
        assert_eq!(tasks[0].status, TaskStatus::Completed);
        assert_eq!(tasks[1].order_index, 1);
    }

    #[tokio::test]
    async fn test_list_runs_filters_by_user_newest_first() {
        let store = InMemoryRunStore::new();
        let older = Run::new("alice", "first", Intent::General);
        let mut newer = Run::new("alice", "second", Intent::General);
        newer.created_at = older.created_at + chrono::Duration::seconds(5);
        let other = Run::new("bob", "third", Intent::General);

        store.create_run(&older).await.unwrap();
        store.create_run(&newer).await.unwrap();
        store.create_run(&other).await.unwrap();

        let runs = store.list_runs("alice").await.unwrap();
        let inputs: Vec<&str> = runs.iter().map(|r| r.input.as_str()).collect();
        assert_eq!(inputs, vec!["second", "first"]);
    }
}
