//! Configuration management for share
//!
//! Config files are stored in platform-appropriate locations:
//! - Linux: ~/.config/share/
//! - macOS: ~/Library/Application Support/share/
//! - Windows: %APPDATA%\share\
//!
//! The shared secret may come from the file or from the `SECRET_KEY`
//! environment variable, which takes precedence.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::origin::{DEFAULT_ALLOWED_DOMAIN, DEFAULT_DECOY_URL};
use crate::token::{SharedSecret, TokenError};

/// Environment variable holding the shared secret
pub const SECRET_ENV_VAR: &str = "SECRET_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("allowed_domain must not be empty")]
    EmptyAllowedDomain,

    #[error("Config directory not found")]
    NoDirFound,

    #[error("SECRET_KEY environment variable is required")]
    MissingSecret,
}

impl From<TokenError> for ConfigError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::EmptySecret => ConfigError::MissingSecret,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

/// Server-side configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application base directory; image URLs are relative to it
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Images root (defaults to `<base_dir>/images`)
    #[serde(default)]
    pub images_dir: Option<PathBuf>,

    /// Text root (defaults to `<base_dir>/text`)
    #[serde(default)]
    pub text_dir: Option<PathBuf>,

    /// Domain the front-end is served from
    #[serde(default = "default_allowed_domain")]
    pub allowed_domain: String,

    /// Redirect target for requests failing the origin check
    #[serde(default = "default_decoy_url")]
    pub decoy_url: String,

    /// Shared token secret
    /// Overridden by the SECRET_KEY environment variable
    #[serde(default)]
    pub secret: Option<String>,
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    crate::DEFAULT_PORT
}
fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_allowed_domain() -> String {
    DEFAULT_ALLOWED_DOMAIN.to_string()
}
fn default_decoy_url() -> String {
    DEFAULT_DECOY_URL.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            base_dir: default_base_dir(),
            images_dir: None,
            text_dir: None,
            allowed_domain: default_allowed_domain(),
            decoy_url: default_decoy_url(),
            secret: None,
        }
    }
}

impl ServerConfig {
    pub fn images_dir(&self) -> PathBuf {
        self.images_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("images"))
    }

    pub fn text_dir(&self) -> PathBuf {
        self.text_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("text"))
    }

    /// Resolve the shared secret, preferring `env_value` over the file
    pub fn shared_secret(&self, env_value: Option<String>) -> Result<SharedSecret, ConfigError> {
        let secret = env_value
            .filter(|s| !s.is_empty())
            .or_else(|| self.secret.clone())
            .ok_or(ConfigError::MissingSecret)?;
        Ok(SharedSecret::new(secret)?)
    }

    /// Create both serving roots if they do not exist yet
    pub fn ensure_roots(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(self.images_dir())?;
        std::fs::create_dir_all(self.text_dir())?;
        Ok(())
    }
}

impl Config {
    /// Get config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join("share"))
            .ok_or(ConfigError::NoDirFound)
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from default location
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load config from specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate TOML config text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;

        // An empty domain would turn the origin check into deny-all
        if config.server.allowed_domain.is_empty() {
            return Err(ConfigError::EmptyAllowedDomain);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, crate::DEFAULT_PORT);
        assert_eq!(config.server.allowed_domain, "share.syrins.tech");
        assert_eq!(config.server.images_dir(), PathBuf::from("./images"));
        assert_eq!(config.server.text_dir(), PathBuf::from("./text"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 8081\ntext_dir = \"/srv/notes\"\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server.port, 8081);
        assert_eq!(loaded.server.text_dir(), PathBuf::from("/srv/notes"));
        assert_eq!(loaded.server.images_dir(), PathBuf::from("./images"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::parse("[server]\nsecret = \"abc\"\n").unwrap();
        assert_eq!(config.server.port, crate::DEFAULT_PORT);
        assert_eq!(config.server.secret.as_deref(), Some("abc"));
    }

    #[test]
    fn test_empty_allowed_domain_rejected() {
        let result = Config::parse("[server]\nallowed_domain = \"\"\n");
        assert!(matches!(result, Err(ConfigError::EmptyAllowedDomain)));

        let config = Config::parse("[server]\nallowed_domain = \"files.example.org\"\n").unwrap();
        assert_eq!(config.server.allowed_domain, "files.example.org");
    }

    #[test]
    fn test_secret_resolution() {
        let mut server = ServerConfig::default();
        assert!(matches!(server.shared_secret(None), Err(ConfigError::MissingSecret)));
        assert!(matches!(server.shared_secret(Some(String::new())), Err(ConfigError::MissingSecret)));

        server.secret = Some("from-file".to_string());
        assert_eq!(server.shared_secret(None).unwrap().as_str(), "from-file");
        assert_eq!(
            server.shared_secret(Some("from-env".to_string())).unwrap().as_str(),
            "from-env"
        );

        server.secret = Some(String::new());
        assert!(matches!(server.shared_secret(None), Err(ConfigError::MissingSecret)));
    }

    #[test]
    fn test_ensure_roots_creates_directories() {
        let dir = TempDir::new().unwrap();
        let server = ServerConfig {
            base_dir: dir.path().to_path_buf(),
            ..ServerConfig::default()
        };

        server.ensure_roots().unwrap();
        assert!(dir.path().join("images").is_dir());
        assert!(dir.path().join("text").is_dir());

        // Idempotent
        server.ensure_roots().unwrap();
    }
}
