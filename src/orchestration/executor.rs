//! Sequential run executor.
//!
//! Both execution modes drive the same loop and the same step routine; they
//! differ only in how the completion backend is called and where events
//! go. Synchronous runs call `generate` and discard events, streaming runs
//! call `generate_stream` and forward every event to the caller's sink.

use anyhow::anyhow;
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::events::{EventSink, NullSink, OrchestrationEvent};
use super::messages;
use super::{OrchestrationError, OrchestrationResult};
use crate::context::OrchestrationContext;
use crate::observability::Logger;
use crate::provider::{GenerateConfig, InternalMessage, LlmProvider, StreamChunk, Usage};
use crate::registry::{Agent, AgentId, AgentRegistry};
use crate::routing::{Intent, RoutingError};
use crate::store::{Run, RunStatus, RunStore, StoreError, StoreResult, Task};

/// Error recorded on a task interrupted by cancellation
pub const CANCELLED_MESSAGE: &str = "run cancelled";

/// Per-run knobs shared by every step
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    pub generate: GenerateConfig,
    pub cancellation: CancellationToken,
}

impl RunSettings {
    pub fn new(generate: GenerateConfig) -> Self {
        Self {
            generate,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}

/// Why a step failed, attributed to its task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub task_id: String,
    pub agent_id: AgentId,
    pub order_index: usize,
    /// Raw backend error message
    pub message: String,
    pub cancelled: bool,
}

/// Result of one pipeline step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Completed { output: String },
    Failed(StepFailure),
}

/// Final state of an executed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub run_id: String,
    pub intent: Intent,
    pub status: RunStatus,
    /// Output of the last completed step; empty if the first step failed
    pub final_output: String,
    pub error: Option<StepFailure>,
}

impl RunResult {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

#[derive(Debug, Clone, Copy)]
enum Delivery {
    Blocking,
    Streaming,
}

struct Generation {
    content: String,
    model: Option<String>,
    usage: Option<Usage>,
}

/// Executes a routed pipeline against an assembled context.
///
/// Holds only shared, read-only collaborators, so one executor can serve
/// any number of concurrent runs.
pub struct RunExecutor {
    registry: Arc<AgentRegistry>,
    store: Arc<dyn RunStore>,
    provider: Arc<dyn LlmProvider>,
    logger: Option<Arc<Logger>>,
}

impl RunExecutor {
    pub fn new(
        registry: Arc<AgentRegistry>,
        store: Arc<dyn RunStore>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            registry,
            store,
            provider,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn store(&self) -> &Arc<dyn RunStore> {
        &self.store
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Run the pipeline with blocking backend calls.
    ///
    /// `run` must already be persisted in `pending`.
    pub async fn execute_run_sync(
        &self,
        run: Run,
        agents: &[AgentId],
        context: &OrchestrationContext,
        settings: &RunSettings,
    ) -> OrchestrationResult<RunResult> {
        self.drive(run, agents, context, settings, Delivery::Blocking, &mut NullSink)
            .await
    }

    /// Run the pipeline with streaming backend calls, emitting lifecycle
    /// events to `sink`.
    ///
    /// Once `run_start` has been emitted, `run_end` is always emitted
    /// exactly once, including when a store failure aborts the run.
    pub async fn execute_run_streaming(
        &self,
        run: Run,
        agents: &[AgentId],
        context: &OrchestrationContext,
        settings: &RunSettings,
        sink: &mut dyn EventSink,
    ) -> OrchestrationResult<RunResult> {
        self.drive(run, agents, context, settings, Delivery::Streaming, sink)
            .await
    }

    async fn drive(
        &self,
        mut run: Run,
        agents: &[AgentId],
        context: &OrchestrationContext,
        settings: &RunSettings,
        delivery: Delivery,
        sink: &mut dyn EventSink,
    ) -> OrchestrationResult<RunResult> {
        let pipeline = match self.resolve(run.intent, agents) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                self.reject(&mut run, &e).await;
                return Err(e);
            }
        };

        run.mark_running()?;
        self.store.update_run(&run).await?;
        self.log(|logger| logger.log_run_start(&run, agents));
        tracing::info!(
            run_id = %run.id,
            intent = %run.intent,
            steps = agents.len(),
            "Run started"
        );
        sink.emit(OrchestrationEvent::RunStart {
            run_id: run.id.clone(),
            intent: run.intent,
            agents: agents.to_vec(),
        });

        let mut accumulated = String::new();
        let mut failure = None;

        for (order_index, agent) in pipeline.into_iter().enumerate() {
            let input = messages::step_input(order_index, &run.input, &accumulated);
            let outcome = match self
                .execute_step(&run, agent, order_index, input, context, settings, delivery, sink)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => return Err(self.abort(run, accumulated, e, sink).await),
            };

            match outcome {
                StepOutcome::Completed { output } => accumulated = output,
                StepOutcome::Failed(step_failure) => {
                    failure = Some(step_failure);
                    break;
                }
            }
        }

        let status = if failure.is_some() {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
        run.finish(status, accumulated.clone())?;
        if let Err(e) = self.store.update_run(&run).await {
            return Err(self.abort(run, accumulated, e, sink).await);
        }

        self.log(|logger| logger.log_run_end(&run));
        tracing::info!(run_id = %run.id, status = %run.status, "Run finished");
        sink.emit(OrchestrationEvent::RunEnd {
            run_id: run.id.clone(),
            status: run.status,
            final_output: run.final_output.clone(),
        });

        Ok(RunResult {
            run_id: run.id,
            intent: run.intent,
            status: run.status,
            final_output: run.final_output,
            error: failure,
        })
    }

    /// One step: create the task, call the backend, settle the task.
    ///
    /// Backend errors and cancellation become `StepOutcome::Failed`; only
    /// store errors are returned as `Err`.
    #[allow(clippy::too_many_arguments)]
    async fn execute_step(
        &self,
        run: &Run,
        agent: &Agent,
        order_index: usize,
        input: String,
        context: &OrchestrationContext,
        settings: &RunSettings,
        delivery: Delivery,
        sink: &mut dyn EventSink,
    ) -> StoreResult<StepOutcome> {
        let mut task = Task::start(&run.id, agent.id, order_index, input);
        self.store.create_task(&task).await?;
        self.log(|logger| logger.log_task_start(&task));
        tracing::debug!(
            run_id = %run.id,
            task_id = %task.id,
            agent = %agent.id,
            order_index,
            "Task started"
        );
        sink.emit(OrchestrationEvent::TaskStart {
            task_id: task.id.clone(),
            agent_id: agent.id,
            order_index,
        });

        let step_messages = messages::build_step_messages(agent, context, &task.input);
        let mut buffer = String::new();

        // None means the step was cancelled
        let result = if settings.cancellation.is_cancelled() {
            None
        } else {
            tokio::select! {
                biased;
                _ = settings.cancellation.cancelled() => None,
                result = self.generate(
                    delivery,
                    step_messages.clone(),
                    &settings.generate,
                    &task.id,
                    &mut buffer,
                    sink,
                ) => Some(result),
            }
        };

        let (error, cancelled) = match result {
            Some(Ok(generation)) => {
                let model = generation.model.unwrap_or_else(|| {
                    settings
                        .generate
                        .model_or(&self.provider.default_model())
                        .to_string()
                });
                self.log(|logger| {
                    logger.log_llm_interaction(&step_messages, &generation.content, &model)
                });

                task.complete(generation.content, Some(model), generation.usage)?;
                self.store.update_task(&task).await?;
                self.log(|logger| logger.log_task_end(&task));
                tracing::debug!(task_id = %task.id, agent = %agent.id, "Task completed");
                sink.emit(OrchestrationEvent::TaskEnd {
                    task_id: task.id.clone(),
                    agent_id: agent.id,
                    output: task.output.clone(),
                });
                return Ok(StepOutcome::Completed {
                    output: task.output,
                });
            }
            Some(Err(e)) => (e, false),
            None => (anyhow!(CANCELLED_MESSAGE), true),
        };

        let message = format!("{error:#}");
        task.fail(message.clone(), buffer)?;
        self.store.update_task(&task).await?;
        self.log(|logger| logger.log_task_failed(&task, &message));
        tracing::warn!(
            run_id = %run.id,
            task_id = %task.id,
            agent = %agent.id,
            error = %message,
            "Task failed; aborting remaining pipeline"
        );
        sink.emit(OrchestrationEvent::Error {
            task_id: Some(task.id.clone()),
            agent_id: Some(agent.id),
            message: message.clone(),
        });

        Ok(StepOutcome::Failed(StepFailure {
            task_id: task.id,
            agent_id: agent.id,
            order_index,
            message,
            cancelled,
        }))
    }

    async fn generate(
        &self,
        delivery: Delivery,
        step_messages: Vec<InternalMessage>,
        config: &GenerateConfig,
        task_id: &str,
        buffer: &mut String,
        sink: &mut dyn EventSink,
    ) -> anyhow::Result<Generation> {
        match delivery {
            Delivery::Blocking => {
                let response = self.provider.generate(step_messages, config).await?;
                buffer.push_str(&response.content);
                Ok(Generation {
                    content: response.content,
                    model: Some(response.model),
                    usage: response.usage,
                })
            }
            Delivery::Streaming => {
                let mut stream = self.provider.generate_stream(step_messages, config).await?;
                while let Some(chunk) = stream.next().await {
                    match chunk? {
                        StreamChunk::Text(text) => {
                            if text.is_empty() {
                                continue;
                            }
                            buffer.push_str(&text);
                            sink.emit(OrchestrationEvent::Chunk {
                                task_id: task_id.to_string(),
                                content: text,
                            });
                        }
                        StreamChunk::Done => break,
                        _ => {}
                    }
                }
                Ok(Generation {
                    content: buffer.clone(),
                    model: None,
                    usage: None,
                })
            }
        }
    }

    /// Close out a run after a store failure.
    ///
    /// Emits `error` then `run_end`, attempts to persist the run as failed,
    /// and returns the original store error.
    async fn abort(
        &self,
        mut run: Run,
        accumulated: String,
        error: StoreError,
        sink: &mut dyn EventSink,
    ) -> OrchestrationError {
        tracing::error!(run_id = %run.id, error = %error, "Run store failure; aborting run");
        self.log(|logger| logger.log_error(&format!("Run {} aborted: {}", run.id, error), None));
        sink.emit(OrchestrationEvent::Error {
            task_id: None,
            agent_id: None,
            message: error.to_string(),
        });

        if !run.status.is_terminal() {
            if let Err(e) = run.finish(RunStatus::Failed, accumulated) {
                tracing::warn!(run_id = %run.id, error = %e, "Could not mark run failed");
            }
        }
        if let Err(e) = self.store.update_run(&run).await {
            tracing::warn!(run_id = %run.id, error = %e, "Could not persist failed run");
        }

        sink.emit(OrchestrationEvent::RunEnd {
            run_id: run.id.clone(),
            status: RunStatus::Failed,
            final_output: run.final_output.clone(),
        });
        error.into()
    }

    fn resolve(&self, intent: Intent, agents: &[AgentId]) -> OrchestrationResult<Vec<&Agent>> {
        if agents.is_empty() {
            return Err(RoutingError::EmptyRoute(intent).into());
        }
        Ok(agents
            .iter()
            .map(|id| self.registry.get(*id))
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Close out a run whose pipeline cannot start. No events are emitted.
    async fn reject(&self, run: &mut Run, error: &OrchestrationError) {
        tracing::warn!(run_id = %run.id, error = %error, "Run rejected before start");
        if let Err(e) = run.finish(RunStatus::Failed, "") {
            tracing::warn!(run_id = %run.id, error = %e, "Could not mark run failed");
            return;
        }
        if let Err(e) = self.store.update_run(run).await {
            tracing::warn!(run_id = %run.id, error = %e, "Could not persist failed run");
        }
    }

    fn log(&self, write: impl FnOnce(&Logger) -> anyhow::Result<()>) {
        if let Some(logger) = &self.logger {
            if let Err(e) = write(logger) {
                tracing::warn!(error = %e, "Failed to write run log");
            }
        }
    }
}
