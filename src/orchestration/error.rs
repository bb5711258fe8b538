//! Orchestration error taxonomy

use thiserror::Error;

use crate::registry::RegistryError;
use crate::routing::RoutingError;
use crate::store::StoreError;

/// Result type for orchestration entry points
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

/// Errors that abort an orchestration request.
///
/// A failed pipeline step is not one of these: it is recorded on the Task
/// and surfaced through [`RunResult`](super::RunResult) and the `error`
/// event. These variants cover misconfiguration and infrastructure faults.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("Agent registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    /// Context assembly failed catastrophically; no run was created
    #[error("Context assembly failed: {message}")]
    ContextAssembly { message: String },

    #[error("Run store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl OrchestrationError {
    pub fn context_assembly(err: &anyhow::Error) -> Self {
        Self::ContextAssembly {
            message: format!("{err:#}"),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AgentId;
    use anyhow::Context;

    #[test]
    fn test_conversions() {
        let err: OrchestrationError = RegistryError::UnknownAgent("oracle".to_string()).into();
        assert!(matches!(err, OrchestrationError::Registry(_)));

        let err: OrchestrationError = RegistryError::Duplicate(AgentId::Debugger).into();
        assert!(err.to_string().contains("debugger"));

        let err: OrchestrationError = StoreError::not_found("run", "r1").into();
        assert_eq!(err.to_string(), "Run store error: run not found: r1");
    }

    #[test]
    fn test_context_assembly_keeps_cause_chain() {
        let source: anyhow::Result<()> =
            Err(anyhow::anyhow!("connection refused")).context("Failed to load history");
        let err = OrchestrationError::context_assembly(&source.unwrap_err());
        let text = err.to_string();
        assert!(text.contains("Failed to load history"));
        assert!(text.contains("connection refused"));
    }
}
