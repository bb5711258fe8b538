//! Chipflow - agent orchestration pipeline for silicon debugging assistants
//!
//! Chipflow turns a free-form user request into a run of one or more
//! specialized agents:
//!
//! - **`routing`** - Intent classification and the intent-to-pipeline table
//! - **`registry`** - Agent definitions and their prompt fragments
//! - **`context`** - Conversation history, space instructions and retrieval
//! - **`orchestration`** - Sequential pipeline execution, blocking or streaming
//! - **`store`** - Durable run and task records
//! - **`provider`** - Completion backend abstraction
//! - **`config`** - TOML configuration and environment overrides
//! - **`observability`** - Markdown run log
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! chipflow = "0.3"
//! # Without the file-backed run store:
//! chipflow = { version = "0.3", default-features = false }
//! ```
//!
//! # Example: Running a request
//!
//! ```ignore
//! use chipflow::prelude::*;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! async fn example(provider: Arc<dyn LlmProvider>) -> anyhow::Result<()> {
//!     let mut loader = ConfigurationLoader::new(Some(Path::new("config/chipflow.toml")))?;
//!     loader.apply_environment(&EnvironmentLoader::new(None));
//!
//!     let orchestrator = Orchestrator::from_config(&loader, provider)?;
//!     let result = orchestrator
//!         .run("design a 4-entry async FIFO", RunOptions::new("user-1"))
//!         .await?;
//!     println!("{}", result.final_output);
//!     Ok(())
//! }
//! ```
//!
//! # Example: Streaming events
//!
//! ```ignore
//! use chipflow::prelude::*;
//!
//! async fn example(orchestrator: &Orchestrator) -> anyhow::Result<()> {
//!     let (mut sink, mut rx) = ChannelSink::channel();
//!     let run = orchestrator.run_streaming(
//!         "why is the ready signal stuck low?",
//!         RunOptions::new("user-1"),
//!         &mut sink,
//!     );
//!     let (result, _) = tokio::join!(run, async {
//!         while let Some(event) = rx.recv().await {
//!             print!("{}", event.to_sse().unwrap_or_default());
//!             if event.is_terminal() {
//!                 break;
//!             }
//!         }
//!     });
//!     result?;
//!     Ok(())
//! }
//! ```

/// Configuration management
pub mod config;

/// Context assembly for runs
pub mod context;

/// Markdown run log
pub mod observability;

/// Pipeline execution and the orchestrator entry point
pub mod orchestration;

/// Completion backend abstraction
pub mod provider;

/// Agent registry
pub mod registry;

/// Intent classification and routing
pub mod routing;

/// Run and task persistence
pub mod store;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Configuration, ConfigurationLoader, EnvironmentLoader};

    pub use crate::context::{
        ContextAssembler, ContextRequest, DefaultContextAssembler, OrchestrationContext,
        SourceKind,
    };

    pub use crate::observability::Logger;

    pub use crate::orchestration::{
        ChannelSink, EventSink, OrchestrationError, OrchestrationEvent, OrchestrationResult,
        Orchestrator, OrchestratorBuilder, RunOptions, RunResult,
    };

    pub use crate::provider::{
        GenerateConfig, GenerateResponse, InternalMessage, LlmProvider, StreamChunk,
        StreamingResponse,
    };

    pub use crate::registry::{Agent, AgentId, AgentRegistry};

    pub use crate::routing::{Intent, IntentClassifier, Router};

    pub use crate::store::{InMemoryRunStore, Run, RunStatus, RunStore, Task, TaskStatus};
}
