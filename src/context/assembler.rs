//! Context assembly from pluggable collaborators.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ContextRequest, OrchestrationContext, SourceKind};
use crate::observability::Logger;
use crate::provider::InternalMessage;

/// Produces the [`OrchestrationContext`] for a run.
///
/// Implementations must absorb failures of recoverable sub-lookups
/// (space instructions, retrieval, external search) and return reduced
/// context instead. Only
/// catastrophic failures, such as the history store being unreachable,
/// are returned as errors.
#[async_trait]
pub trait ContextAssembler: Send + Sync {
    async fn fetch_context(&self, request: &ContextRequest) -> Result<OrchestrationContext>;
}

/// Assembler that supplies no context at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyContextAssembler;

#[async_trait]
impl ContextAssembler for EmptyContextAssembler {
    async fn fetch_context(&self, _request: &ContextRequest) -> Result<OrchestrationContext> {
        Ok(OrchestrationContext::empty())
    }
}

/// A retrieved or searched piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub title: String,
    pub content: String,
    /// URL, DOI or document path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Snippet {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    fn render(&self) -> String {
        match &self.source {
            Some(source) => format!("### {} ({})\n{}", self.title, source, self.content),
            None => format!("### {}\n{}", self.title, self.content),
        }
    }
}

/// Prior conversation turns.
#[async_trait]
pub trait ConversationHistory: Send + Sync {
    /// Up to `limit` most recent messages, oldest first.
    async fn recent_messages(
        &self,
        user_id: &str,
        conversation_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<InternalMessage>>;
}

/// Per-space custom instructions.
#[async_trait]
pub trait SpaceDirectory: Send + Sync {
    async fn space_instructions(&self, user_id: &str, space_id: &str) -> Result<Option<String>>;
}

/// Similarity search over the user's documents.
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    async fn retrieve(&self, user_id: &str, query: &str, limit: usize) -> Result<Vec<Snippet>>;
}

/// External web and academic search.
#[async_trait]
pub trait SourceSearch: Send + Sync {
    async fn search(&self, kind: SourceKind, query: &str, limit: usize) -> Result<Vec<Snippet>>;
}

/// [`ContextAssembler`] composed from optional collaborators.
///
/// History is authoritative and propagates its errors. Space instructions,
/// retrieval and search are best-effort: a failure is logged and that part
/// is left out of the context.
pub struct DefaultContextAssembler {
    history: Option<Arc<dyn ConversationHistory>>,
    spaces: Option<Arc<dyn SpaceDirectory>>,
    retriever: Option<Arc<dyn DocumentRetriever>>,
    search: Option<Arc<dyn SourceSearch>>,
    logger: Option<Arc<Logger>>,
    max_history: usize,
    max_snippets: usize,
}

impl DefaultContextAssembler {
    pub const DEFAULT_MAX_HISTORY: usize = 20;
    pub const DEFAULT_MAX_SNIPPETS: usize = 5;

    pub fn new() -> Self {
        Self {
            history: None,
            spaces: None,
            retriever: None,
            search: None,
            logger: None,
            max_history: Self::DEFAULT_MAX_HISTORY,
            max_snippets: Self::DEFAULT_MAX_SNIPPETS,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn ConversationHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_spaces(mut self, spaces: Arc<dyn SpaceDirectory>) -> Self {
        self.spaces = Some(spaces);
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn DocumentRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_search(mut self, search: Arc<dyn SourceSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_limits(mut self, max_history: usize, max_snippets: usize) -> Self {
        self.max_history = max_history;
        self.max_snippets = max_snippets;
        self
    }

    async fn load_history(&self, request: &ContextRequest) -> Result<Vec<InternalMessage>> {
        let Some(history) = &self.history else {
            return Ok(Vec::new());
        };
        if self.max_history == 0 {
            return Ok(Vec::new());
        }

        let mut messages = history
            .recent_messages(
                &request.user_id,
                request.conversation_id.as_deref(),
                self.max_history,
            )
            .await
            .context("Failed to load conversation history")?;

        // Collaborators may ignore the limit; keep the newest turns.
        if messages.len() > self.max_history {
            messages.drain(..messages.len() - self.max_history);
        }
        Ok(messages)
    }

    async fn load_space_instructions(&self, request: &ContextRequest) -> Option<String> {
        let (Some(spaces), Some(space_id)) = (&self.spaces, &request.space_id) else {
            return None;
        };
        match spaces.space_instructions(&request.user_id, space_id).await {
            Ok(instructions) => instructions,
            Err(e) => {
                self.degrade("space", &e);
                None
            }
        }
    }

    fn degrade(&self, source: &str, error: &anyhow::Error) {
        tracing::warn!(source, error = %error, "Context lookup failed; continuing without it");
        if let Some(logger) = &self.logger {
            if let Err(log_err) = logger.log_context_degradation(source, &error.to_string()) {
                tracing::warn!(error = %log_err, "Failed to write run log");
            }
        }
    }

    async fn lookup(&self, kind: SourceKind, request: &ContextRequest) -> Result<Vec<Snippet>> {
        match kind {
            SourceKind::Documents => match &self.retriever {
                Some(retriever) => {
                    retriever
                        .retrieve(&request.user_id, &request.input, self.max_snippets)
                        .await
                }
                None => Ok(Vec::new()),
            },
            SourceKind::Web | SourceKind::Academic => match &self.search {
                Some(search) => search.search(kind, &request.input, self.max_snippets).await,
                None => Ok(Vec::new()),
            },
        }
    }

    async fn build_source_context(&self, request: &ContextRequest) -> String {
        let mut segments = Vec::new();
        let mut seen = Vec::new();

        for kind in &request.sources {
            if seen.contains(kind) {
                continue;
            }
            seen.push(*kind);

            match self.lookup(*kind, request).await {
                Ok(snippets) => {
                    if let Some(segment) = self.render_segment(*kind, &snippets) {
                        segments.push(segment);
                    }
                }
                Err(e) => self.degrade(kind.as_str(), &e),
            }
        }

        segments.join("\n\n")
    }

    fn render_segment(&self, kind: SourceKind, snippets: &[Snippet]) -> Option<String> {
        let body: Vec<String> = snippets
            .iter()
            .filter(|s| !s.content.trim().is_empty())
            .take(self.max_snippets)
            .map(Snippet::render)
            .collect();
        if body.is_empty() {
            return None;
        }
        Some(format!("## {}\n\n{}", kind.heading(), body.join("\n\n")))
    }
}

impl Default for DefaultContextAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextAssembler for DefaultContextAssembler {
    async fn fetch_context(&self, request: &ContextRequest) -> Result<OrchestrationContext> {
        let messages = self.load_history(request).await?;
        let space_instructions = self.load_space_instructions(request).await;
        let source_context = self.build_source_context(request).await;

        tracing::debug!(
            user_id = %request.user_id,
            history = messages.len(),
            source_chars = source_context.len(),
            has_space_instructions = space_instructions.is_some(),
            "Assembled orchestration context"
        );

        Ok(OrchestrationContext::new(
            messages,
            source_context,
            space_instructions,
        ))
    }
}
