//! PlanDaemon configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::EngineConfig;

/// Main PlanDaemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration
    pub storage: StorageConfig,

    /// Engine tuning
    pub engine: EngineConfig,

    /// Transport session defaults
    pub transport: TransportConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .plandaemon.yml
        let local_config = PathBuf::from(".plandaemon.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/plandaemon/plandaemon.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("plandaemon").join("plandaemon.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the planning store
    #[serde(rename = "store-dir")]
    pub store_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/plandaemon on Linux)
        let store_dir = dirs::data_dir()
            .map(|d| d.join("plandaemon").join("store"))
            .unwrap_or_else(|| PathBuf::from(".planstore"))
            .to_string_lossy()
            .into_owned();

        Self { store_dir }
    }
}

/// Transport session defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Conversational scope console sessions operate in
    pub scope: String,

    /// Participant name for console sessions (defaults to $USER at runtime)
    #[serde(rename = "display-name")]
    pub display_name: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            scope: "local".to_string(),
            display_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.transport.scope, "local");
        assert_eq!(config.engine.slot_timeout_ms, 2_000);
        assert!(config.storage.store_dir.contains("plandaemon"));
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
storage:
  store-dir: /tmp/plandaemon-test/store

engine:
  slot-timeout-ms: 500

transport:
  scope: kitchen-table
  display-name: Alice
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.storage.store_dir, "/tmp/plandaemon-test/store");
        assert_eq!(config.engine.slot_timeout_ms, 500);
        assert_eq!(config.transport.scope, "kitchen-table");
        assert_eq!(config.transport.display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
transport:
  scope: kitchen-table
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.transport.scope, "kitchen-table");

        // Defaults for unspecified
        assert_eq!(config.engine.slot_timeout_ms, 2_000);
        assert!(config.transport.display_name.is_none());
    }
}
