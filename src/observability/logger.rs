//! Markdown run log.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::provider::InternalMessage;
use crate::registry::AgentId;
use crate::routing::Intent;
use crate::store::{Run, Task};

/// Logger for orchestration runs.
///
/// Writes a markdown-formatted log with one section per run, task, LLM
/// interaction and context degradation. Every entry is also emitted as a
/// `tracing` event. Callers treat write failures as non-fatal.
#[derive(Debug)]
pub struct Logger {
    log_file: PathBuf,
    log_level: String,
}

impl Logger {
    /// Initialize logger.
    ///
    /// # Arguments
    /// * `log_file` - Path to log file. If None, creates a timestamped file in temp directory.
    /// * `log_level` - Logging level (defaults to "INFO").
    pub fn new(log_file: Option<&Path>, log_level: Option<&str>) -> Result<Self> {
        let log_file = match log_file {
            Some(p) => p.to_path_buf(),
            None => {
                let mut dir = std::env::temp_dir();
                dir.push("chipflow-logs");
                std::fs::create_dir_all(&dir).with_context(|| {
                    format!("Failed to create log directory: {}", dir.display())
                })?;
                let filename = format!(
                    "orchestration_{}_{}.md",
                    Utc::now().timestamp_millis(),
                    std::process::id()
                );
                dir.join(filename)
            }
        };

        let log_level = log_level.unwrap_or("INFO").to_uppercase();

        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        let logger = Self {
            log_file,
            log_level,
        };

        if !logger.log_file.exists() {
            logger.initialize_log_file()?;
        }

        Ok(logger)
    }

    fn initialize_log_file(&self) -> Result<()> {
        let mut file = File::create(&self.log_file)
            .with_context(|| format!("Failed to create log file: {}", self.log_file.display()))?;

        let now: DateTime<Utc> = Utc::now();

        writeln!(file, "# Orchestration Log\n")?;
        writeln!(file, "Log started: {}\n", now.to_rfc3339())?;
        writeln!(file, "---\n")?;

        Ok(())
    }

    /// Append one entry; each entry is a single write so concurrent runs
    /// sharing a log file do not interleave mid-entry.
    fn append_to_log(&self, content: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .with_context(|| format!("Failed to open log file: {}", self.log_file.display()))?;

        file.write_all(content.as_bytes())
            .with_context(|| "Failed to write to log file")?;

        Ok(())
    }

    /// Whether full message bodies should be logged.
    ///
    /// True when the configured level is DEBUG or `RUST_LOG` asks for debug.
    pub fn is_debug(&self) -> bool {
        self.log_level == "DEBUG"
            || std::env::var("RUST_LOG")
                .map(|level| level.to_lowercase().contains("debug"))
                .unwrap_or(false)
    }

    /// Log run start with its routed pipeline.
    pub fn log_run_start(&self, run: &Run, agents: &[AgentId]) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let pipeline = agents
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(" -> ");
        let content = format!(
            "## Run Started - {}\n\n**Run:** {}\n**User:** {}\n**Intent:** {}\n**Pipeline:** {}\n\n**Input:**\n```\n{}\n```\n\n",
            now.to_rfc3339(),
            run.id,
            run.user_id,
            run.intent,
            pipeline,
            run.input
        );

        self.append_to_log(&content)?;
        tracing::info!(run_id = %run.id, intent = %run.intent, pipeline = %pipeline, "Run started");
        Ok(())
    }

    /// Log task start.
    pub fn log_task_start(&self, task: &Task) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Task {} Started - {}\n\n**Task:** {}\n**Agent:** {}\n\n",
            task.order_index,
            now.to_rfc3339(),
            task.id,
            task.agent_id
        );

        self.append_to_log(&content)?;
        Ok(())
    }

    /// Log LLM interaction.
    ///
    /// Messages are written in full only in debug mode; otherwise a count
    /// is recorded.
    ///
    /// # Arguments
    /// * `messages` - Messages sent to the completion backend.
    /// * `response` - Backend response text.
    /// * `model` - Model name used.
    pub fn log_llm_interaction(
        &self,
        messages: &[InternalMessage],
        response: &str,
        model: &str,
    ) -> Result<()> {
        if response.trim().is_empty() && messages.is_empty() {
            tracing::debug!("Skipping log entry for empty LLM interaction");
            return Ok(());
        }

        let now: DateTime<Utc> = Utc::now();

        let messages_block = if self.is_debug() {
            let rendered: Vec<serde_json::Value> = messages
                .iter()
                .map(|m| {
                    serde_json::json!({
                        "role": m.role.as_str(),
                        "content": m.text().unwrap_or(""),
                    })
                })
                .collect();
            format!(
                "**Messages:**\n```json\n{}\n```\n\n",
                serde_json::to_string_pretty(&rendered).unwrap_or_else(|_| "[]".to_string())
            )
        } else if !messages.is_empty() {
            format!("**Messages:** {} messages\n\n", messages.len())
        } else {
            String::new()
        };

        let content = format!(
            "### LLM Interaction - {}\n\n**Model:** {}\n\n{}**Response:**\n```\n{}\n```\n\n",
            now.to_rfc3339(),
            model,
            messages_block,
            response
        );

        self.append_to_log(&content)?;
        tracing::debug!(model = %model, messages = messages.len(), "LLM interaction logged");
        Ok(())
    }

    /// Log task completion.
    pub fn log_task_end(&self, task: &Task) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let mut content = format!(
            "### Task {} Completed - {}\n\n**Agent:** {}\n",
            task.order_index,
            now.to_rfc3339(),
            task.agent_id
        );
        if let Some(usage) = &task.metadata.usage {
            content.push_str(&format!(
                "**Tokens:** {} prompt / {} completion\n",
                usage.prompt_tokens, usage.completion_tokens
            ));
        }
        content.push('\n');

        self.append_to_log(&content)?;
        Ok(())
    }

    /// Log task failure with the raw backend error.
    pub fn log_task_failed(&self, task: &Task, error: &str) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Task {} Failed - {}\n\n**Agent:** {}\n**Error:** {}\n\n",
            task.order_index,
            now.to_rfc3339(),
            task.agent_id,
            error
        );

        self.append_to_log(&content)?;
        Ok(())
    }

    /// Log run completion.
    pub fn log_run_end(&self, run: &Run) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "## Run Finished - {}\n\n**Run:** {}\n**Status:** {}\n\n**Final Output:**\n```\n{}\n```\n\n---\n\n",
            now.to_rfc3339(),
            run.id,
            run.status,
            run.final_output
        );

        self.append_to_log(&content)?;
        tracing::info!(run_id = %run.id, status = %run.status, "Run finished");
        Ok(())
    }

    /// Log a failed context sub-lookup that was dropped.
    pub fn log_context_degradation(&self, source: &str, error: &str) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Context Degraded - {}\n\n**Source:** {}\n**Error:** {}\n\n",
            now.to_rfc3339(),
            source,
            error
        );

        self.append_to_log(&content)?;
        Ok(())
    }

    /// Log error with context.
    ///
    /// # Arguments
    /// * `error` - Error message.
    /// * `context` - Additional context information.
    pub fn log_error(
        &self,
        error: &str,
        context: Option<&HashMap<String, serde_json::Value>>,
    ) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let mut content = format!(
            "### Error - {}\n\n**Error:** {}\n\n",
            now.to_rfc3339(),
            error
        );

        if let Some(ctx) = context {
            content.push_str(&format!(
                "**Context:** {}\n\n",
                serde_json::to_string_pretty(ctx).unwrap_or_default()
            ));
        }

        self.append_to_log(&content)?;
        tracing::error!(error = %error, "Orchestration error");
        Ok(())
    }

    /// Log routing decision.
    pub fn log_classification(&self, input: &str, intent: Intent) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Classified - {}\n\n**Intent:** {}\n**Input length:** {} chars\n\n",
            now.to_rfc3339(),
            intent,
            input.chars().count()
        );

        self.append_to_log(&content)?;
        Ok(())
    }

    /// Get the log file path.
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Get the log level.
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}
