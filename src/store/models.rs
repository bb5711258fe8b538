//! Persistent Run and Task records and their state machines.
//!
//! Runs move `pending -> running -> {completed | failed}`. Tasks are created
//! already `running` and move to `completed` or `failed`. Terminal states
//! never change again; the mutators below reject anything else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::provider::Usage;
use crate::registry::AgentId;
use crate::routing::Intent;

/// Lifecycle of a [`Run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    /// Whether `self -> next` is a legal edge.
    ///
    /// `pending -> failed` is allowed so a run that cannot start is still
    /// closed out.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Pending, RunStatus::Running)
                | (RunStatus::Pending, RunStatus::Failed)
                | (RunStatus::Running, RunStatus::Completed)
                | (RunStatus::Running, RunStatus::Failed)
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of a [`Task`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not produced by the sequential executor; tasks are persisted
    /// directly in `Running`.
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Completed)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One orchestration invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub user_id: String,
    /// Original user text
    pub input: String,
    pub intent: Intent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub status: RunStatus,
    #[serde(default)]
    pub final_output: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Run {
    /// New run in `pending`
    pub fn new(user_id: impl Into<String>, input: impl Into<String>, intent: Intent) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            input: input.into(),
            intent,
            conversation_id: None,
            status: RunStatus::Pending,
            final_output: String::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn with_conversation(mut self, conversation_id: Option<String>) -> Self {
        self.conversation_id = conversation_id;
        self
    }

    pub fn mark_running(&mut self) -> StoreResult<()> {
        self.transition(RunStatus::Running)
    }

    /// Close the run with its terminal status and final output
    pub fn finish(&mut self, status: RunStatus, final_output: impl Into<String>) -> StoreResult<()> {
        if !status.is_terminal() {
            return Err(self.invalid(status));
        }
        self.transition(status)?;
        self.final_output = final_output.into();
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    fn transition(&mut self, next: RunStatus) -> StoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(self.invalid(next));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn invalid(&self, next: RunStatus) -> StoreError {
        StoreError::InvalidTransition {
            kind: "run",
            id: self.id.clone(),
            from: self.status.to_string(),
            to: next.to_string(),
        }
    }
}

/// Optional per-task diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Raw backend error message for failed tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One pipeline step within a [`Run`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub run_id: String,
    pub agent_id: AgentId,
    /// 0-based position in the pipeline
    pub order_index: usize,
    pub status: TaskStatus,
    /// Exact text sent as the step's user message
    pub input: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub metadata: TaskMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// New task, already `running`
    pub fn start(
        run_id: impl Into<String>,
        agent_id: AgentId,
        order_index: usize,
        input: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            run_id: run_id.into(),
            agent_id,
            order_index,
            status: TaskStatus::Running,
            input: input.into(),
            output: String::new(),
            metadata: TaskMetadata::default(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn complete(
        &mut self,
        output: impl Into<String>,
        model: Option<String>,
        usage: Option<Usage>,
    ) -> StoreResult<()> {
        self.transition(TaskStatus::Completed)?;
        self.output = output.into();
        self.metadata.model = model;
        self.metadata.usage = usage;
        Ok(())
    }

    /// Fail the task, keeping whatever output was produced before the error
    pub fn fail(&mut self, error: impl Into<String>, partial_output: impl Into<String>) -> StoreResult<()> {
        self.transition(TaskStatus::Failed)?;
        self.output = partial_output.into();
        self.metadata.error = Some(error.into());
        Ok(())
    }

    fn transition(&mut self, next: TaskStatus) -> StoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                kind: "task",
                id: self.id.clone(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        if next.is_terminal() {
            self.completed_at = Some(self.updated_at);
        }
        Ok(())
    }
}
