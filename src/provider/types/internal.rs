//! Role-tagged messages sent to the completion backend.
//!
//! Messages use the Universal Message Format (UMF) types. The orchestrator
//! only ever produces plain-text content, so the helpers here build
//! text-only messages.

use std::collections::HashMap;

// Re-export the UMF types the orchestrator works with
pub use umf::{InternalMessage, MessageContent, MessageRole};

/// Build a text-only message with the given role
pub fn text_message(role: MessageRole, content: impl Into<String>) -> InternalMessage {
    InternalMessage {
        role,
        content: MessageContent::Text(content.into()),
        metadata: HashMap::new(),
        tool_call_id: None,
        name: None,
    }
}

/// Build a system message
pub fn system_message(content: impl Into<String>) -> InternalMessage {
    text_message(MessageRole::System, content)
}

/// Build a user message
pub fn user_message(content: impl Into<String>) -> InternalMessage {
    text_message(MessageRole::User, content)
}

/// Build an assistant message
pub fn assistant_message(content: impl Into<String>) -> InternalMessage {
    text_message(MessageRole::Assistant, content)
}
