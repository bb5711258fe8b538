//! TOML configuration parsing and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::environment::{EnvironmentLoader, EnvironmentOverrides};
use crate::provider::GenerateConfig;

/// Main configuration structure
///
/// Every section is optional in the TOML file and falls back to its
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub orchestrator: OrchestratorConfig,
    pub generation: GenerationConfig,
    pub context: ContextConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Orchestrator identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub name: String,
    pub version: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            name: "chipflow".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Defaults applied to every completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model name; None uses the provider default
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: 4000,
        }
    }
}

/// Context assembly limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Most recent conversation messages kept
    pub max_history: usize,
    /// Snippets kept per retrieval source
    pub max_snippets: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_history: 20,
            max_snippets: 5,
        }
    }
}

/// Run store backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    Memory,
    File,
}

impl StorageBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackendKind::Memory => "memory",
            StorageBackendKind::File => "file",
        }
    }
}

/// Run store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    /// Root directory of the file backend
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Memory,
            path: PathBuf::from(".chipflow"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Markdown run log; None disables it
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            log_level: "INFO".to_string(),
        }
    }
}

/// Loads and manages TOML configuration.
#[derive(Debug, Clone)]
pub struct ConfigurationLoader {
    pub config_path: PathBuf,
    pub config: Configuration,
}

impl ConfigurationLoader {
    /// Initialize configuration loader.
    ///
    /// # Arguments
    /// * `config_path` - Path to TOML config file. If None, or if the file
    ///   does not exist, the default configuration is used.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("config/chipflow.toml"));

        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            tracing::debug!(path = %config_path.display(), "Config file not found; using defaults");
            Configuration::default()
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Create a configuration loader from a pre-parsed Configuration.
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config_path: PathBuf::from("config/chipflow.toml"),
            config,
        }
    }

    /// Load configuration from TOML file.
    fn load_config(path: &Path) -> Result<Configuration> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Apply `CHIPFLOW_*` overrides from the environment.
    pub fn apply_environment(&mut self, env: &EnvironmentLoader) {
        self.apply_overrides(&env.overrides());
    }

    /// Apply explicit overrides. A storage directory also selects the file
    /// backend.
    pub fn apply_overrides(&mut self, overrides: &EnvironmentOverrides) {
        if let Some(model) = &overrides.model {
            self.config.generation.model = Some(model.clone());
        }
        if let Some(dir) = &overrides.storage_dir {
            self.config.storage.backend = StorageBackendKind::File;
            self.config.storage.path = dir.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.config.logging.log_level = level.to_uppercase();
        }
    }

    /// Get configuration value by dot-notation key.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match key {
            "orchestrator.name" => Some(self.config.orchestrator.name.clone()),
            "orchestrator.version" => Some(self.config.orchestrator.version.clone()),
            "generation.model" => self.config.generation.model.clone(),
            "storage.backend" => Some(self.config.storage.backend.as_str().to_string()),
            "storage.path" => Some(self.config.storage.path.to_string_lossy().to_string()),
            "logging.log_file" => self
                .config
                .logging
                .log_file
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            "logging.log_level" => Some(self.config.logging.log_level.clone()),
            _ => None,
        }
    }

    /// Get numeric configuration value.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match key {
            "generation.max_tokens" => Some(self.config.generation.max_tokens as u64),
            "context.max_history" => Some(self.config.context.max_history as u64),
            "context.max_snippets" => Some(self.config.context.max_snippets as u64),
            _ => None,
        }
    }

    /// Generation defaults as a validated [`GenerateConfig`].
    pub fn generate_config(&self) -> Result<GenerateConfig> {
        let generation = &self.config.generation;
        let mut config = GenerateConfig::new()
            .with_temperature(generation.temperature)
            .with_max_tokens(generation.max_tokens);
        if let Some(model) = &generation.model {
            config = config.with_model(model.clone());
        }

        config
            .validate()
            .with_context(|| format!("Invalid [generation] section in {}", self.config_path.display()))?;
        Ok(config)
    }
}
