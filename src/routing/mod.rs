//! Intent classification and routing.
//!
//! A request is first mapped to an [`Intent`] by the [`IntentClassifier`],
//! then expanded by the [`Router`] into the ordered list of agents that make
//! up its pipeline. Both tables are immutable after construction and are
//! injected into the orchestrator rather than read from globals.

mod classifier;
mod error;
mod intent;
mod router;

pub use classifier::{
    builtin_rules, ClassificationRule, IntentClassifier, IntentMatcher, KeywordMatcher,
    PredicateMatcher,
};
pub use error::{RoutingError, RoutingResult};
pub use intent::Intent;
pub use router::Router;
