//! Agent Registry Module
//!
//! Static table of the agent roles a pipeline can chain together. Each
//! agent carries a display name and a system-prompt fragment describing its
//! responsibility and expected deliverable.
//!
//! ## Usage
//!
//! ```rust
//! use chipflow::registry::{AgentId, AgentRegistry};
//!
//! let registry = AgentRegistry::builtin();
//! for id in registry.list_agent_ids() {
//!     let agent = registry.get(id).unwrap();
//!     println!("{}: {}", id, agent.name);
//! }
//! ```

mod agent;
mod builtin;
mod error;
mod registry;

pub use agent::{Agent, AgentId};
pub use builtin::builtin_agents;
pub use error::{RegistryError, RegistryResult};
pub use registry::AgentRegistry;
