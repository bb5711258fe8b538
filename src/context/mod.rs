//! Context assembly for orchestration runs.
//!
//! An [`OrchestrationContext`] bundles prior conversation turns, optional
//! space instructions and retrieval text. It is built once per run by a
//! [`ContextAssembler`] and shared read-only by every step.

mod assembler;
mod types;

pub use assembler::{
    ContextAssembler, ConversationHistory, DefaultContextAssembler, DocumentRetriever,
    EmptyContextAssembler, Snippet, SourceSearch, SpaceDirectory,
};
pub use types::{ContextRequest, OrchestrationContext, SourceKind};
