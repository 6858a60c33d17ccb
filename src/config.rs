//! Configuration management for regchat
//!
//! Configuration is loaded from a YAML file (a missing file yields the
//! defaults), then environment variables are applied on top:
//!
//! - `REGCHAT_API_URL` — completion endpoint URL
//! - `REGCHAT_API_KEY` — bearer credential for the endpoint
//! - `REGCHAT_HISTORY_DB` — history database path (also honored directly
//!   by the storage layer)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RegchatError, Result};

/// Main configuration structure for regchat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Completion endpoint settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Conversation history storage settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Completion endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Endpoint URL the chat request is POSTed to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer credential for the endpoint
    ///
    /// Usually supplied through `REGCHAT_API_KEY` rather than the file.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Connection establishment timeout in seconds
    ///
    /// Only connecting is bounded; an open stream is never timed out
    /// client-side.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/v1/regulatory-chat".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Conversation history storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// History database path; defaults to the user data directory
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from a YAML file and applies env overrides
    ///
    /// A missing file is not an error: defaults are used, which keeps a
    /// purely env-configured deployment working without any file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or
    /// parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(RegchatError::Io)?;
            serde_yaml::from_str(&contents).map_err(RegchatError::Yaml)?
        } else {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment variable overrides on top of file values
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("REGCHAT_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(key) = std::env::var("REGCHAT_API_KEY") {
            self.api.api_key = Some(key);
        }
        if let Ok(db) = std::env::var("REGCHAT_HISTORY_DB") {
            self.storage.db_path = Some(PathBuf::from(db));
        }
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns [`RegchatError::Config`] when the endpoint URL does not
    /// parse or the connect timeout is zero. A missing API key is not a
    /// validation error; it surfaces at client construction, where the
    /// credential is actually needed.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url)
            .map_err(|e| RegchatError::Config(format!("invalid api.base_url: {}", e)))?;

        if self.api.connect_timeout_secs == 0 {
            return Err(
                RegchatError::Config("api.connect_timeout_secs must be positive".into()).into(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("failed to create tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, contents).expect("failed to write config");
        (dir, path)
    }

    fn clear_env() {
        std::env::remove_var("REGCHAT_API_URL");
        std::env::remove_var("REGCHAT_API_KEY");
        std::env::remove_var("REGCHAT_HISTORY_DB");
    }

    #[test]
    #[serial]
    fn test_load_missing_file_yields_defaults() {
        clear_env();
        let config = Config::load("/nonexistent/config.yaml").expect("load failed");
        assert_eq!(config.api.base_url, default_base_url());
        assert_eq!(config.api.connect_timeout_secs, 30);
        assert!(config.api.api_key.is_none());
        assert!(config.storage.db_path.is_none());
    }

    #[test]
    #[serial]
    fn test_load_parses_yaml() {
        clear_env();
        let (_dir, path) = write_config(
            "api:\n  base_url: https://api.example.com/chat\n  connect_timeout_secs: 5\nstorage:\n  db_path: /tmp/history.db\n",
        );

        let config = Config::load(&path).expect("load failed");
        assert_eq!(config.api.base_url, "https://api.example.com/chat");
        assert_eq!(config.api.connect_timeout_secs, 5);
        assert_eq!(config.storage.db_path, Some(PathBuf::from("/tmp/history.db")));
    }

    #[test]
    #[serial]
    fn test_load_invalid_yaml_fails() {
        clear_env();
        let (_dir, path) = write_config("api: [not, a, map\n");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_values() {
        clear_env();
        let (_dir, path) = write_config("api:\n  base_url: https://file.example.com/chat\n");

        std::env::set_var("REGCHAT_API_URL", "https://env.example.com/chat");
        std::env::set_var("REGCHAT_API_KEY", "env-key");
        let config = Config::load(&path).expect("load failed");
        clear_env();

        assert_eq!(config.api.base_url, "https://env.example.com/chat");
        assert_eq!(config.api.api_key.as_deref(), Some("env-key"));
    }

    #[test]
    #[serial]
    fn test_validate_default_config() {
        clear_env();
        let config = Config::default();
        config.validate().expect("defaults must validate");
    }

    #[test]
    #[serial]
    fn test_validate_rejects_bad_url() {
        clear_env();
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_validate_rejects_zero_timeout() {
        clear_env();
        let mut config = Config::default();
        config.api.connect_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
