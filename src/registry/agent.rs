//! Agent identifiers and definitions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::RegistryError;

/// Closed set of agent roles a pipeline can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    /// Gathers background: protocols, standards, prior art.
    Researcher,
    /// Produces block-level and micro-architecture plans.
    Architect,
    /// Writes and modifies RTL and testbench code.
    RtlEngineer,
    /// Root-causes simulation and waveform failures.
    Debugger,
    /// Reviews RTL and verification code for defects.
    Reviewer,
    /// Writes specifications, register maps and user docs.
    TechnicalWriter,
    /// Designs tool workflows and interface layouts.
    UxDesigner,
    /// Audits interfaces against accessibility guidelines.
    AccessibilitySpecialist,
    /// General engineering assistant, the catch-all role.
    Generalist,
}

impl AgentId {
    /// Every agent identifier, in declaration order.
    pub const ALL: [AgentId; 9] = [
        AgentId::Researcher,
        AgentId::Architect,
        AgentId::RtlEngineer,
        AgentId::Debugger,
        AgentId::Reviewer,
        AgentId::TechnicalWriter,
        AgentId::UxDesigner,
        AgentId::AccessibilitySpecialist,
        AgentId::Generalist,
    ];

    /// Stable string form, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Researcher => "researcher",
            AgentId::Architect => "architect",
            AgentId::RtlEngineer => "rtl_engineer",
            AgentId::Debugger => "debugger",
            AgentId::Reviewer => "reviewer",
            AgentId::TechnicalWriter => "technical_writer",
            AgentId::UxDesigner => "ux_designer",
            AgentId::AccessibilitySpecialist => "accessibility_specialist",
            AgentId::Generalist => "generalist",
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        AgentId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| RegistryError::UnknownAgent(s.to_string()))
    }
}

/// A named role with the system-prompt fragment describing its job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    /// Display label.
    pub name: String,
    /// Responsibility and expected deliverable, appended to the step's
    /// system message.
    pub prompt_fragment: String,
}

impl Agent {
    pub fn new(id: AgentId, name: impl Into<String>, prompt_fragment: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            prompt_fragment: prompt_fragment.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), RegistryError> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::InvalidDefinition {
                id: self.id,
                reason: "blank name".to_string(),
            });
        }
        if self.prompt_fragment.trim().is_empty() {
            return Err(RegistryError::InvalidDefinition {
                id: self.id,
                reason: "blank prompt fragment".to_string(),
            });
        }
        Ok(())
    }
}
