//! Static intent -> pipeline table.

use std::collections::HashMap;

use super::{Intent, RoutingError, RoutingResult};
use crate::registry::{AgentId, AgentRegistry};

/// Maps each [`Intent`] to the ordered list of agents that handle it.
///
/// Multi-agent routes model "plan then build" recipes: the chain is part of
/// the table, never decided by the executor at run time.
#[derive(Debug, Clone, PartialEq)]
pub struct Router {
    routes: HashMap<Intent, Vec<AgentId>>,
}

impl Router {
    /// Build a router from explicit routes. Call [`Router::validate`] before use.
    pub fn new<I>(routes: I) -> Self
    where
        I: IntoIterator<Item = (Intent, Vec<AgentId>)>,
    {
        Self {
            routes: routes.into_iter().collect(),
        }
    }

    /// The built-in routing table.
    pub fn builtin() -> Self {
        Self::new([
            (Intent::General, vec![AgentId::Generalist]),
            (Intent::Research, vec![AgentId::Researcher]),
            (Intent::Design, vec![AgentId::Architect, AgentId::RtlEngineer]),
            (Intent::Implement, vec![AgentId::RtlEngineer]),
            (Intent::Debug, vec![AgentId::Debugger]),
            (Intent::Review, vec![AgentId::Reviewer]),
            (Intent::Docs, vec![AgentId::TechnicalWriter]),
            (Intent::UxDesign, vec![AgentId::UxDesigner]),
            (Intent::Accessibility, vec![AgentId::AccessibilitySpecialist]),
        ])
    }

    /// Expand an intent into a copy of its pipeline.
    ///
    /// A missing or empty route is a table bug and fails fast.
    pub fn route_intent(&self, intent: Intent) -> RoutingResult<Vec<AgentId>> {
        match self.routes.get(&intent) {
            Some(agents) if !agents.is_empty() => Ok(agents.clone()),
            Some(_) => Err(RoutingError::EmptyRoute(intent)),
            None => Err(RoutingError::UnknownIntent(intent.to_string())),
        }
    }

    /// Check totality: every intent has a non-empty route and every agent in
    /// it resolves in `registry`.
    pub fn validate(&self, registry: &AgentRegistry) -> RoutingResult<()> {
        for intent in Intent::ALL {
            for agent in self.route_intent(intent)? {
                if !registry.contains(agent) {
                    return Err(RoutingError::UnresolvedAgent { intent, agent });
                }
            }
        }
        Ok(())
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::builtin()
    }
}
