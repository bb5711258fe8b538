//! Orchestration entry point.
//!
//! `Orchestrator` ties the pieces together: classify the input, expand the
//! intent into a pipeline, assemble context, persist a pending run, and
//! hand it to the [`RunExecutor`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::events::EventSink;
use super::executor::{RunExecutor, RunResult, RunSettings};
use super::{OrchestrationError, OrchestrationResult};
use crate::config::ConfigurationLoader;
use crate::context::{
    ContextAssembler, ContextRequest, DefaultContextAssembler, EmptyContextAssembler,
    OrchestrationContext, SourceKind,
};
use crate::observability::Logger;
use crate::provider::{GenerateConfig, LlmProvider};
use crate::registry::{AgentId, AgentRegistry};
use crate::routing::{Intent, IntentClassifier, Router};
use crate::store::{open_store, InMemoryRunStore, Run, RunStore};

/// Caller-supplied hints for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOptions {
    pub user_id: String,
    pub conversation_id: Option<String>,
    pub space_id: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceKind>,
    /// Overrides the configured model for every step of this run
    pub model: Option<String>,
    #[serde(skip)]
    pub cancellation: Option<CancellationToken>,
}

impl RunOptions {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_space(mut self, space_id: impl Into<String>) -> Self {
        self.space_id = Some(space_id.into());
        self
    }

    pub fn with_sources(mut self, sources: Vec<SourceKind>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = Some(cancellation);
        self
    }
}

/// Everything a run needs once preparation has succeeded
struct PreparedRun {
    run: Run,
    agents: Vec<AgentId>,
    context: OrchestrationContext,
    settings: RunSettings,
}

/// Classifies, routes and executes user requests.
///
/// Construction validates that every intent routes to a non-empty pipeline
/// of registered agents, so routing never fails at request time.
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use chipflow::prelude::*;
/// # async fn demo(provider: Arc<dyn LlmProvider>) -> anyhow::Result<()> {
/// let orchestrator = Orchestrator::builder(provider).build()?;
/// let result = orchestrator
///     .run("Why does the FIFO overflow after reset?", RunOptions::new("user-1"))
///     .await?;
/// println!("{}: {}", result.status, result.final_output);
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator {
    classifier: IntentClassifier,
    router: Router,
    context: Arc<dyn ContextAssembler>,
    executor: RunExecutor,
    store: Arc<dyn RunStore>,
    generate: GenerateConfig,
    logger: Option<Arc<Logger>>,
}

impl Orchestrator {
    pub fn builder(provider: Arc<dyn LlmProvider>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(provider)
    }

    /// Builder preloaded from configuration: generation defaults, store
    /// backend, context limits and the optional markdown log.
    pub fn builder_from_config(
        loader: &ConfigurationLoader,
        provider: Arc<dyn LlmProvider>,
    ) -> OrchestrationResult<OrchestratorBuilder> {
        let config = &loader.config;
        let generate = loader
            .generate_config()
            .map_err(|e| OrchestrationError::config(format!("{e:#}")))?;
        let store = open_store(&config.storage)?;

        let logger = match &config.logging.log_file {
            Some(path) => Some(Arc::new(
                Logger::new(Some(path.as_path()), Some(&config.logging.log_level))
                    .map_err(|e| OrchestrationError::config(format!("{e:#}")))?,
            )),
            None => None,
        };

        let mut assembler = DefaultContextAssembler::new()
            .with_limits(config.context.max_history, config.context.max_snippets);
        if let Some(logger) = &logger {
            assembler = assembler.with_logger(logger.clone());
        }

        let mut builder = OrchestratorBuilder::new(provider)
            .with_generate_config(generate)
            .with_store(store)
            .with_context_assembler(Arc::new(assembler));
        if let Some(logger) = logger {
            builder = builder.with_logger(logger);
        }
        Ok(builder)
    }

    /// Orchestrator wired entirely from configuration.
    pub fn from_config(
        loader: &ConfigurationLoader,
        provider: Arc<dyn LlmProvider>,
    ) -> OrchestrationResult<Self> {
        Self::builder_from_config(loader, provider)?.build()
    }

    pub fn classify(&self, input: &str) -> Intent {
        self.classifier.classify(input)
    }

    /// Intent and pipeline the input would run through
    pub fn route(&self, input: &str) -> OrchestrationResult<(Intent, Vec<AgentId>)> {
        let intent = self.classify(input);
        Ok((intent, self.router.route_intent(intent)?))
    }

    pub fn store(&self) -> &Arc<dyn RunStore> {
        &self.store
    }

    /// Run to completion and return the final result.
    pub async fn run(&self, input: &str, options: RunOptions) -> OrchestrationResult<RunResult> {
        let prepared = self.prepare(input, &options).await?;
        self.executor
            .execute_run_sync(
                prepared.run,
                &prepared.agents,
                &prepared.context,
                &prepared.settings,
            )
            .await
    }

    /// Run while emitting lifecycle events to `sink`.
    ///
    /// Errors raised before the run starts (context assembly, store
    /// unavailable) are returned without emitting any event.
    pub async fn run_streaming(
        &self,
        input: &str,
        options: RunOptions,
        sink: &mut dyn EventSink,
    ) -> OrchestrationResult<RunResult> {
        let prepared = self.prepare(input, &options).await?;
        self.executor
            .execute_run_streaming(
                prepared.run,
                &prepared.agents,
                &prepared.context,
                &prepared.settings,
                sink,
            )
            .await
    }

    async fn prepare(&self, input: &str, options: &RunOptions) -> OrchestrationResult<PreparedRun> {
        let (intent, agents) = self.route(input)?;
        tracing::debug!(intent = %intent, pipeline = ?agents, "Classified request");
        if let Some(logger) = &self.logger {
            if let Err(e) = logger.log_classification(input, intent) {
                tracing::warn!(error = %e, "Failed to write run log");
            }
        }

        let mut generate = self.generate.clone();
        if let Some(model) = &options.model {
            generate = generate.with_model(model.clone());
        }
        generate
            .validate()
            .map_err(|e| OrchestrationError::config(format!("{e:#}")))?;

        let request = ContextRequest::new(&options.user_id, input)
            .with_conversation(options.conversation_id.clone())
            .with_space(options.space_id.clone())
            .with_sources(options.sources.clone());
        let context = self
            .context
            .fetch_context(&request)
            .await
            .map_err(|e| OrchestrationError::context_assembly(&e))?;

        let run = Run::new(&options.user_id, input, intent)
            .with_conversation(options.conversation_id.clone());
        self.store.create_run(&run).await?;

        let mut settings = RunSettings::new(generate);
        if let Some(token) = &options.cancellation {
            settings = settings.with_cancellation(token.clone());
        }

        Ok(PreparedRun {
            run,
            agents,
            context,
            settings,
        })
    }
}

/// Builder for [`Orchestrator`]. Anything not supplied uses the built-in
/// tables, an in-memory store and no context.
pub struct OrchestratorBuilder {
    provider: Arc<dyn LlmProvider>,
    registry: Option<AgentRegistry>,
    classifier: Option<IntentClassifier>,
    router: Option<Router>,
    context: Option<Arc<dyn ContextAssembler>>,
    store: Option<Arc<dyn RunStore>>,
    generate: GenerateConfig,
    logger: Option<Arc<Logger>>,
}

impl OrchestratorBuilder {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            registry: None,
            classifier: None,
            router: None,
            context: None,
            store: None,
            generate: GenerateConfig::default(),
            logger: None,
        }
    }

    pub fn with_registry(mut self, registry: AgentRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    pub fn with_context_assembler(mut self, context: Arc<dyn ContextAssembler>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn RunStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_generate_config(mut self, generate: GenerateConfig) -> Self {
        self.generate = generate;
        self
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Validate the tables and assemble the orchestrator.
    pub fn build(self) -> OrchestrationResult<Orchestrator> {
        let registry = self.registry.unwrap_or_default();
        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => IntentClassifier::builtin()?,
        };
        let router = self.router.unwrap_or_default();
        router.validate(&registry)?;
        self.generate
            .validate()
            .map_err(|e| OrchestrationError::config(format!("{e:#}")))?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryRunStore::new()));
        let context = self
            .context
            .unwrap_or_else(|| Arc::new(EmptyContextAssembler));

        let mut executor = RunExecutor::new(Arc::new(registry), store.clone(), self.provider);
        if let Some(logger) = &self.logger {
            executor = executor.with_logger(logger.clone());
        }

        tracing::debug!(
            provider = executor.provider_name(),
            store = store.backend_type(),
            "Orchestrator ready"
        );

        Ok(Orchestrator {
            classifier,
            router,
            context,
            executor,
            store,
            generate: self.generate,
            logger: self.logger,
        })
    }
}
