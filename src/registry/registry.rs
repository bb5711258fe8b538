//! Immutable agent lookup table.

use std::collections::HashMap;

use super::{builtin::builtin_agents, Agent, AgentId, RegistryError, RegistryResult};

/// Static table mapping an [`AgentId`] to its [`Agent`] definition.
///
/// The registry is built once at startup and never mutated afterwards, so a
/// single instance can be shared (behind an `Arc`) by every concurrent run.
///
/// # Example
///
/// ```rust
/// use chipflow::registry::{AgentId, AgentRegistry};
///
/// let registry = AgentRegistry::builtin();
/// let agent = registry.get(AgentId::Debugger).unwrap();
/// assert_eq!(agent.name, "Debugger");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRegistry {
    agents: HashMap<AgentId, Agent>,
}

impl AgentRegistry {
    /// Registry with the built-in definition for every [`AgentId`].
    pub fn builtin() -> Self {
        let agents = builtin_agents()
            .into_iter()
            .map(|agent| (agent.id, agent))
            .collect();
        Self { agents }
    }

    /// Build a registry from explicit definitions.
    ///
    /// Returns an error on duplicate ids or blank definitions.
    pub fn from_agents<I>(agents: I) -> RegistryResult<Self>
    where
        I: IntoIterator<Item = Agent>,
    {
        let mut table = HashMap::new();
        for agent in agents {
            agent.validate()?;
            let id = agent.id;
            if table.insert(id, agent).is_some() {
                return Err(RegistryError::Duplicate(id));
            }
        }
        Ok(Self { agents: table })
    }

    /// Look up an agent definition.
    pub fn get(&self, id: AgentId) -> RegistryResult<&Agent> {
        self.agents
            .get(&id)
            .ok_or_else(|| RegistryError::UnknownAgent(id.to_string()))
    }

    /// Look up an agent by its string identifier.
    pub fn get_by_name(&self, id: &str) -> RegistryResult<&Agent> {
        let id: AgentId = id.parse()?;
        self.get(id)
    }

    /// Whether the registry holds a definition for `id`.
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Registered ids, in [`AgentId::ALL`] order.
    pub fn list_agent_ids(&self) -> Vec<AgentId> {
        AgentId::ALL
            .iter()
            .copied()
            .filter(|id| self.agents.contains_key(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
