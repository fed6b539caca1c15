//! Backend endpoint configuration
//!
//! One setting selects the server used for both the auth calls and the
//! chat channel handshake. Resolution order: CLI flag, then the
//! `PALAVER_SERVER_URL` environment variable, then the config file under
//! the platform config directory, then the fixed default endpoint.

use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Fallback endpoint used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "https://chatbot-backend-api-3l19.onrender.com";

/// Environment variable consulted before the config file.
pub const SERVER_URL_ENV: &str = "PALAVER_SERVER_URL";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

impl Config {
    /// Load the config file if one exists; a missing file is not an
    /// error, just an empty config.
    pub fn load() -> Result<Self, Box<dyn Error>> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    fn load_from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the server base URL for this run.
    pub fn resolve_server_url(&self, cli_override: Option<&str>) -> String {
        resolve_from(
            cli_override,
            env::var(SERVER_URL_ENV).ok(),
            self.server_url.as_deref(),
        )
    }
}

fn resolve_from(
    cli_override: Option<&str>,
    env_value: Option<String>,
    file_value: Option<&str>,
) -> String {
    if let Some(url) = cli_override {
        return url.to_string();
    }
    if let Some(url) = env_value {
        if !url.trim().is_empty() {
            return url;
        }
    }
    match file_value {
        Some(url) => url.to_string(),
        None => DEFAULT_SERVER_URL.to_string(),
    }
}

fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "permacommons", "palaver")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cli_override_wins() {
        let resolved = resolve_from(Some("http://cli"), Some("http://env".into()), Some("http://file"));
        assert_eq!(resolved, "http://cli");
    }

    #[test]
    fn env_beats_file() {
        let resolved = resolve_from(None, Some("http://env".into()), Some("http://file"));
        assert_eq!(resolved, "http://env");
    }

    #[test]
    fn blank_env_is_ignored() {
        let resolved = resolve_from(None, Some("   ".into()), Some("http://file"));
        assert_eq!(resolved, "http://file");
    }

    #[test]
    fn default_applies_when_nothing_is_set() {
        assert_eq!(resolve_from(None, None, None), DEFAULT_SERVER_URL);
    }

    #[test]
    fn config_file_round_trips() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "server_url = \"http://localhost:4000\"").expect("write config");

        let config = Config::load_from_path(file.path()).expect("load config");
        assert_eq!(config.server_url.as_deref(), Some("http://localhost:4000"));
        assert_eq!(config.resolve_server_url(None), "http://localhost:4000");
    }

    #[test]
    fn empty_config_file_loads_clean() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let config = Config::load_from_path(file.path()).expect("load config");
        assert!(config.server_url.is_none());
    }
}
