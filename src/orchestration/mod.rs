//! Agent orchestration - pipeline execution for routed requests
//!
//! This module turns a classified request into a sequence of agent steps:
//! - Per-step message assembly (system prompt, history, chained input)
//! - Sequential execution with run/task persistence
//! - Blocking and streaming modes sharing one state machine
//! - Lifecycle events for streaming consumers
//!
//! ## Two entry points:
//!
//! ### 1. Orchestrator (RECOMMENDED)
//! Classifies, routes, assembles context and persists the run before
//! handing it to the executor:
//! - `Orchestrator::run` for a final result
//! - `Orchestrator::run_streaming` for events as they happen
//!
//! ### 2. RunExecutor
//! For callers that already have an agent sequence, an assembled context
//! and a persisted pending run.

pub mod error;
pub mod events;
pub mod executor;
pub mod messages;
pub mod orchestrator;

// Re-export main types
pub use error::{OrchestrationError, OrchestrationResult};
pub use events::{ChannelSink, EventSink, NullSink, OrchestrationEvent};
pub use executor::{
    RunExecutor, RunResult, RunSettings, StepFailure, StepOutcome, CANCELLED_MESSAGE,
};
pub use messages::{build_step_messages, step_input, system_prompt, SYSTEM_PREAMBLE};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, RunOptions};
