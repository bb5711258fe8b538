//! Error types for intent classification and routing.

use thiserror::Error;

use super::Intent;
use crate::registry::AgentId;

/// Errors raised while building or querying the routing tables.
///
/// These are programming errors in the static tables. They surface during
/// startup validation rather than during a run.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The string does not name an intent, or the router has no entry for it.
    #[error("Unknown intent '{0}'")]
    UnknownIntent(String),

    /// The route for an intent is empty.
    #[error("Route for intent '{0}' has no agents")]
    EmptyRoute(Intent),

    /// The route references an agent the registry does not hold.
    #[error("Route for intent '{intent}' references unregistered agent '{agent}'")]
    UnresolvedAgent { intent: Intent, agent: AgentId },

    /// A classification pattern failed to compile.
    #[error("Invalid classification pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type for routing operations.
pub type RoutingResult<T> = Result<T, RoutingError>;
