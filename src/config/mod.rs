//! Configuration management.
//!
//! This module provides configuration loading through TOML files and
//! environment variable overrides via `.env` files.
//!
//! # Example
//!
//! ```no_run
//! use chipflow::config::{ConfigurationLoader, EnvironmentLoader};
//! use std::path::Path;
//!
//! let env = EnvironmentLoader::new(Some(Path::new(".env")));
//!
//! let mut loader = ConfigurationLoader::new(Some(Path::new("config/chipflow.toml"))).unwrap();
//! loader.apply_environment(&env);
//!
//! println!("Temperature: {}", loader.config.generation.temperature);
//! println!("Storage: {:?}", loader.config.storage.backend);
//! ```

pub mod config;
pub mod environment;

// Re-export main types for convenience
pub use self::config::{
    Configuration, ConfigurationLoader, ContextConfig, GenerationConfig, LoggingConfig,
    OrchestratorConfig, StorageBackendKind, StorageConfig,
};
pub use self::environment::{EnvironmentLoader, EnvironmentOverrides};
