//! Runtime configuration.
//!
//! Values come from an optional YAML file named by `CAREBOARD_CONFIG`, then
//! individual `CAREBOARD_*` environment variables override them. The binary
//! loads `.env` first, so all of these can live there.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which adapters back the remote ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// HTTP store and storage API.
    Rest,
    /// In-process store persisted to a YAML snapshot file.
    #[default]
    Memory,
}

/// Settings for one `careboard` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Adapter family for the store, storage and change feed.
    pub backend: Backend,
    /// Base URL of the remote store (`rest` backend).
    pub url: Option<String>,
    /// API key sent as `apikey` and bearer token (`rest` backend).
    pub api_key: Option<String>,
    /// Storage bucket holding task documents.
    pub bucket: String,
    /// Change-feed polling interval in milliseconds (`rest` backend).
    pub poll_interval_ms: u64,
    /// Snapshot file for the `memory` backend.
    pub snapshot: PathBuf,
    /// Session state file (recent clients, undo history, pending repairs).
    pub session: PathBuf,
    /// Emit JSON log lines instead of plain text.
    pub log_json: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            url: None,
            api_key: None,
            bucket: "documenten".to_string(),
            poll_interval_ms: 5_000,
            snapshot: PathBuf::from(".careboard/board.yaml"),
            session: PathBuf::from(".careboard/session.json"),
            log_json: false,
        }
    }
}

impl BoardConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file or a variable is invalid.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file or a variable is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = match lookup("CAREBOARD_CONFIG") {
            Some(path) => Self::load_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(url) = lookup("CAREBOARD_URL") {
            config.url = Some(url);
            config.backend = Backend::Rest;
        }
        if let Some(backend) = lookup("CAREBOARD_BACKEND") {
            config.backend = match backend.as_str() {
                "rest" => Backend::Rest,
                "memory" => Backend::Memory,
                other => return Err(format!("Unknown backend: {other}. Supported: rest, memory")),
            };
        }
        if let Some(key) = lookup("CAREBOARD_API_KEY") {
            config.api_key = Some(key);
        }
        if let Some(bucket) = lookup("CAREBOARD_BUCKET") {
            config.bucket = bucket;
        }
        if let Some(ms) = lookup("CAREBOARD_POLL_MS") {
            config.poll_interval_ms =
                ms.parse().map_err(|e| format!("Invalid CAREBOARD_POLL_MS {ms:?}: {e}"))?;
        }
        if let Some(path) = lookup("CAREBOARD_SNAPSHOT") {
            config.snapshot = PathBuf::from(path);
        }
        if let Some(path) = lookup("CAREBOARD_SESSION") {
            config.session = PathBuf::from(path);
        }
        if let Some(flag) = lookup("CAREBOARD_LOG_JSON") {
            config.log_json = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {e}", path.display()))
    }

    /// Polling interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(&self) -> Result<(), String> {
        if self.backend == Backend::Rest && self.url.is_none() {
            return Err("The rest backend needs CAREBOARD_URL (or `url` in the config file)".into());
        }
        if self.poll_interval_ms == 0 {
            return Err("CAREBOARD_POLL_MS must be greater than zero".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_memory_backend() {
        let config = BoardConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, BoardConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn url_selects_rest_backend() {
        let config = BoardConfig::from_lookup(lookup(&[
            ("CAREBOARD_URL", "https://db.example.org"),
            ("CAREBOARD_API_KEY", "secret"),
            ("CAREBOARD_POLL_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.backend, Backend::Rest);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn rest_backend_without_url_is_rejected() {
        let err = BoardConfig::from_lookup(lookup(&[("CAREBOARD_BACKEND", "rest")])).unwrap_err();
        assert!(err.contains("CAREBOARD_URL"));
    }

    #[test]
    fn rejects_unknown_backend_and_bad_interval() {
        assert!(BoardConfig::from_lookup(lookup(&[("CAREBOARD_BACKEND", "sqlite")])).is_err());
        assert!(BoardConfig::from_lookup(lookup(&[("CAREBOARD_POLL_MS", "soon")])).is_err());
    }

    #[test]
    fn env_overrides_config_file() {
        let dir = std::env::temp_dir().join("careboard_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("careboard.yaml");
        std::fs::write(&path, "bucket: archief\nsnapshot: /tmp/board.yaml\n").unwrap();

        let config = BoardConfig::from_lookup(lookup(&[
            ("CAREBOARD_CONFIG", path.to_str().unwrap()),
            ("CAREBOARD_SNAPSHOT", "/tmp/other.yaml"),
        ]))
        .unwrap();
        assert_eq!(config.bucket, "archief");
        assert_eq!(config.snapshot, PathBuf::from("/tmp/other.yaml"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
