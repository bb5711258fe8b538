//! Completion backend abstraction.
//!
//! The orchestrator never talks to a concrete model API. Every step goes
//! through [`LlmProvider`], which turns a list of role-tagged messages into
//! generated text, either in one blocking call or as a token stream.

use crate::provider::types::generate::{GenerateConfig, Usage};
use crate::provider::types::internal::InternalMessage;
use anyhow::Result;
use futures_util::Stream;
use std::pin::Pin;

// Re-export streaming types from umf
pub use umf::StreamChunk;

/// Response from a blocking generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    /// Generated text
    pub content: String,
    /// Model that actually served the request
    pub model: String,
    /// Token accounting, when the backend reports it
    pub usage: Option<Usage>,
}

impl GenerateResponse {
    /// Create a response without usage metadata
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
        }
    }

    /// Attach usage metadata
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Type alias for streaming response
///
/// The stream is lazy, finite and not restartable. Text arrives as
/// [`StreamChunk::Text`] fragments and the stream is terminated by
/// [`StreamChunk::Done`].
pub type StreamingResponse = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// Core trait that all completion backends must implement
///
/// Any error returned from either call is treated by the executor as a
/// failure of the step that issued it. Error subtypes are not inspected.
///
/// # Example
///
/// ```ignore
/// use chipflow::provider::{GenerateConfig, InternalMessage, LlmProvider};
///
/// async fn ask(provider: &dyn LlmProvider) -> anyhow::Result<String> {
///     let messages = vec![chipflow::provider::user_message("Summarize the FIFO block")];
///     let response = provider.generate(messages, &GenerateConfig::default()).await?;
///     Ok(response.content)
/// }
/// ```
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a non-streaming response
    ///
    /// # Arguments
    /// * `messages` - System message, prior conversation and the step's user message
    /// * `config` - Generation configuration (model, temperature, max tokens)
    async fn generate(
        &self,
        messages: Vec<InternalMessage>,
        config: &GenerateConfig,
    ) -> Result<GenerateResponse>;

    /// Generate a streaming response
    ///
    /// # Returns
    /// Stream of text fragments terminated by [`StreamChunk::Done`]
    async fn generate_stream(
        &self,
        messages: Vec<InternalMessage>,
        config: &GenerateConfig,
    ) -> Result<StreamingResponse>;

    /// Provider identifier for logging (e.g., "openai", "local")
    fn provider_name(&self) -> &str;

    /// Model used when [`GenerateConfig::model`] is `None`
    fn default_model(&self) -> String;
}
