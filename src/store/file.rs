//! File system run store
//!
//! Layout under the base directory:
//!
//! ```text
//! runs/{run_id}/run.json
//! runs/{run_id}/tasks/{task_id}.json
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{Run, RunStore, StoreError, StoreResult, Task};

const RUNS_DIR: &str = "runs";
const RUN_FILE: &str = "run.json";
const TASKS_DIR: &str = "tasks";

/// Stores each Run and Task as a pretty-printed JSON document.
pub struct FileRunStore {
    base_path: PathBuf,
}

impl FileRunStore {
    /// Create a store rooted at `base_path`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(base_path: P) -> StoreResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(base_path.join(RUNS_DIR))?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn run_dir(&self, run_id: &str) -> StoreResult<PathBuf> {
        Ok(self.base_path.join(RUNS_DIR).join(checked_id(run_id)?))
    }

    fn run_path(&self, run_id: &str) -> StoreResult<PathBuf> {
        Ok(self.run_dir(run_id)?.join(RUN_FILE))
    }

    fn task_path(&self, task: &Task) -> StoreResult<PathBuf> {
        Ok(self
            .run_dir(&task.run_id)?
            .join(TASKS_DIR)
            .join(format!("{}.json", checked_id(&task.id)?)))
    }
}

/// Ids become path components, so anything that could escape the run
/// directory is rejected outright.
fn checked_id(id: &str) -> StoreResult<&str> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if valid {
        Ok(id)
    } else {
        Err(StoreError::InvalidId { id: id.to_string() })
    }
}

/// Write atomically using temp file + rename
async fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let data = serde_json::to_vec_pretty(value)?;
    let temp_path = path.with_extension("tmp");

    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(&data).await?;
    file.sync_all().await?;

    fs::rename(&temp_path, path).await?;
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let data = fs::read(path).await?;
    Ok(serde_json::from_slice(&data)?)
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[async_trait]
impl RunStore for FileRunStore {
    fn backend_type(&self) -> &'static str {
        "file"
    }

    async fn create_run(&self, run: &Run) -> StoreResult<()> {
        let path = self.run_path(&run.id)?;
        if is_file(&path).await {
            return Err(StoreError::conflict("run", &run.id));
        }
        write_json(&path, run).await
    }

    async fn update_run(&self, run: &Run) -> StoreResult<()> {
        let path = self.run_path(&run.id)?;
        if !is_file(&path).await {
            return Err(StoreError::not_found("run", &run.id));
        }
        write_json(&path, run).await
    }

    async fn get_run(&self, run_id: &str) -> StoreResult<Option<Run>> {
        let path = self.run_path(run_id)?;
        if !is_file(&path).await {
            return Ok(None);
        }
        read_json(&path).await.map(Some)
    }

    async fn list_runs(&self, user_id: &str) -> StoreResult<Vec<Run>> {
        let mut runs = Vec::new();
        let mut entries = fs::read_dir(self.base_path.join(RUNS_DIR)).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path().join(RUN_FILE);
            if !is_file(&path).await {
                continue;
            }
            let run: Run = match read_json(&path).await {
                Ok(run) => run,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable run file");
                    continue;
                }
            };
            if run.user_id == user_id {
                runs.push(run);
            }
        }

        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(runs)
    }

    async fn create_task(&self, task: &Task) -> StoreResult<()> {
        if !is_file(&self.run_path(&task.run_id)?).await {
            return Err(StoreError::not_found("run", &task.run_id));
        }
        let path = self.task_path(task)?;
        if is_file(&path).await {
            return Err(StoreError::conflict("task", &task.id));
        }
        write_json(&path, task).await
    }

    async fn update_task(&self, task: &Task) -> StoreResult<()> {
        let path = self.task_path(task)?;
        if !is_file(&path).await {
            return Err(StoreError::not_found("task", &task.id));
        }
        write_json(&path, task).await
    }

    async fn list_tasks(&self, run_id: &str) -> StoreResult<Vec<Task>> {
        let dir = self.run_dir(run_id)?.join(TASKS_DIR);
        if fs::metadata(&dir).await.is_err() {
            return Ok(Vec::new());
        }

        let mut tasks: Vec<Task> = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match read_json(&path).await {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable task file");
                }
            }
        }

        tasks.sort_by_key(|t| t.order_index);
        Ok(tasks)
    }
}
