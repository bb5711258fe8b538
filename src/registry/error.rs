//! Error types for the agent registry.

use thiserror::Error;

use super::AgentId;

/// Errors that can occur during registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The identifier does not name any agent in the closed set, or the
    /// registry was built without it.
    #[error("Unknown agent '{0}'")]
    UnknownAgent(String),

    /// The same agent was supplied twice when building a registry.
    #[error("Agent '{0}' registered more than once")]
    Duplicate(AgentId),

    /// The agent definition is unusable (blank name or prompt fragment).
    #[error("Invalid definition for agent '{id}': {reason}")]
    InvalidDefinition {
        /// Agent whose definition was rejected.
        id: AgentId,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
