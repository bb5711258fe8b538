//! Provider module types

pub mod generate;
pub mod internal;

pub use generate::{GenerateConfig, Usage};
pub use internal::{
    assistant_message, system_message, text_message, user_message, InternalMessage,
    MessageContent, MessageRole,
};
