//! Environment variable loading and management.
//!
//! Host-level overrides only. Provider credentials belong to the provider
//! implementation and are never read here.

use std::env;
use std::path::{Path, PathBuf};

/// Overrides the default model for every run
pub const MODEL_VAR: &str = "CHIPFLOW_MODEL";
/// Switches storage to the file backend rooted at this directory
pub const STORAGE_DIR_VAR: &str = "CHIPFLOW_STORAGE_DIR";
/// Overrides `logging.log_level`
pub const LOG_LEVEL_VAR: &str = "CHIPFLOW_LOG_LEVEL";

/// Values read from the environment that take precedence over the TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentOverrides {
    pub model: Option<String>,
    pub storage_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Loads environment variables from .env file and system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<PathBuf>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to .env file. Only an explicit path is loaded, so
    ///   stray `.env` files in the working directory never leak into tests.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            if path.exists() {
                if let Err(e) = dotenv::from_path(path) {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to load .env file");
                }
            }
        }

        Self {
            env_file: env_file.map(|p| p.to_path_buf()),
        }
    }

    pub fn env_file(&self) -> Option<&Path> {
        self.env_file.as_deref()
    }

    pub fn model(&self) -> Option<String> {
        non_empty_var(MODEL_VAR)
    }

    pub fn storage_dir(&self) -> Option<PathBuf> {
        non_empty_var(STORAGE_DIR_VAR).map(PathBuf::from)
    }

    pub fn log_level(&self) -> Option<String> {
        non_empty_var(LOG_LEVEL_VAR)
    }

    /// Snapshot of every override currently set
    pub fn overrides(&self) -> EnvironmentOverrides {
        EnvironmentOverrides {
            model: self.model(),
            storage_dir: self.storage_dir(),
            log_level: self.log_level(),
        }
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_env_file_loading() {
        let temp_dir = tempdir().unwrap();
        let env_path = temp_dir.path().join(".env");
        fs::write(&env_path, "CHIPFLOW_MODEL=rtl-coder-7b\n").unwrap();

        env::remove_var(MODEL_VAR);
        let env_loader = EnvironmentLoader::new(Some(&env_path));
        assert_eq!(env_loader.env_file(), Some(env_path.as_path()));
        assert_eq!(env_loader.model(), Some("rtl-coder-7b".to_string()));
        assert_eq!(env_loader.overrides().model, Some("rtl-coder-7b".to_string()));

        env::set_var(MODEL_VAR, "   ");
        assert_eq!(env_loader.model(), None);
        env::remove_var(MODEL_VAR);
    }

    #[test]
    fn test_default_loader_has_no_file() {
        let env_loader = EnvironmentLoader::default();
        assert!(env_loader.env_file().is_none());
    }
}
