//! Context request and assembled context types

use serde::{Deserialize, Serialize};

use crate::provider::InternalMessage;

/// Where retrieval context may be pulled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// The user's uploaded documents, searched by similarity
    Documents,
    Web,
    Academic,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Documents => "documents",
            SourceKind::Web => "web",
            SourceKind::Academic => "academic",
        }
    }

    /// Heading used for this source's segment of the source context
    pub fn heading(&self) -> &'static str {
        match self {
            SourceKind::Documents => "Relevant documents",
            SourceKind::Web => "Web results",
            SourceKind::Academic => "Academic sources",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "documents" | "docs" => Ok(SourceKind::Documents),
            "web" => Ok(SourceKind::Web),
            "academic" => Ok(SourceKind::Academic),
            other => Err(anyhow::anyhow!("Unknown source kind: {}", other)),
        }
    }
}

/// Everything the assembler needs to build context for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextRequest {
    pub user_id: String,
    pub input: String,
    pub conversation_id: Option<String>,
    pub space_id: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceKind>,
}

impl ContextRequest {
    pub fn new(user_id: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            input: input.into(),
            ..Default::default()
        }
    }

    pub fn with_conversation(mut self, conversation_id: Option<String>) -> Self {
        self.conversation_id = conversation_id;
        self
    }

    pub fn with_space(mut self, space_id: Option<String>) -> Self {
        self.space_id = space_id;
        self
    }

    pub fn with_sources(mut self, sources: Vec<SourceKind>) -> Self {
        self.sources = sources;
        self
    }
}

/// Context supplied read-only to every step of a run.
///
/// Built fresh per run and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct OrchestrationContext {
    messages: Vec<InternalMessage>,
    source_context: String,
    space_instructions: Option<String>,
}

impl OrchestrationContext {
    pub fn new(
        messages: Vec<InternalMessage>,
        source_context: impl Into<String>,
        space_instructions: Option<String>,
    ) -> Self {
        Self {
            messages,
            source_context: source_context.into(),
            space_instructions: space_instructions.filter(|s| !s.trim().is_empty()),
        }
    }

    /// Context with no history, sources or instructions
    pub fn empty() -> Self {
        Self::default()
    }

    /// Prior conversation turns, oldest first
    pub fn messages(&self) -> &[InternalMessage] {
        &self.messages
    }

    /// Retrieval and search text; empty when nothing was found
    pub fn source_context(&self) -> &str {
        &self.source_context
    }

    pub fn space_instructions(&self) -> Option<&str> {
        self.space_instructions.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::user_message;

    #[test]
    fn test_blank_space_instructions_dropped() {
        let context = OrchestrationContext::new(vec![], "", Some("  ".to_string()));
        assert!(context.space_instructions().is_none());

        let context = OrchestrationContext::new(
            vec![user_message("hi")],
            "snippet",
            Some("Use Verilog-2005.".to_string()),
        );
        assert_eq!(context.space_instructions(), Some("Use Verilog-2005."));
        assert_eq!(context.messages().len(), 1);
        assert_eq!(context.source_context(), "snippet");
    }

    #[test]
    fn test_source_kind_parsing() {
        assert_eq!("Web".parse::<SourceKind>().unwrap(), SourceKind::Web);
        assert_eq!("docs".parse::<SourceKind>().unwrap(), SourceKind::Documents);
        assert!("gopher".parse::<SourceKind>().is_err());
        assert_eq!(
            serde_json::to_string(&SourceKind::Academic).unwrap(),
            "\"academic\""
        );
    }
}
