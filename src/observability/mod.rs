//! Observability for orchestration runs.
//!
//! Lifecycle transitions are emitted as `tracing` events by the modules that
//! perform them. The optional [`Logger`] additionally keeps a human-readable
//! markdown log of each run.
//!
//! # Example
//!
//! ```no_run
//! use chipflow::observability::Logger;
//!
//! let logger = Logger::new(None, Some("DEBUG")).unwrap();
//! logger.log_context_degradation("web", "search backend timed out").unwrap();
//! ```

pub mod logger;

pub use logger::Logger;
