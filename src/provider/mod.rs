//! Completion backend module
//!
//! This module provides the provider trait and the message and configuration
//! types shared by every completion backend implementation.

pub mod traits;
pub mod types;

// Re-export main types
pub use traits::{GenerateResponse, LlmProvider, StreamingResponse};
pub use types::{
    assistant_message, system_message, text_message, user_message, GenerateConfig,
    InternalMessage, MessageContent, MessageRole, Usage,
};

// Re-export streaming types from umf
pub use umf::StreamChunk;
