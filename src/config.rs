//! Configuration loader and validator for the scanning station.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub server: Server,
}

/// Station-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
    /// Operator identity sent with every dispatch commit.
    pub operator: String,
}

/// Fulfillment backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Server {
    pub base_url: String,
    pub token: String,
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.app.operator.trim().is_empty() {
        return Err(ConfigError::Invalid("app.operator must be non-empty"));
    }
    if cfg.server.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("server.base_url must be non-empty"));
    }
    if !cfg.server.base_url.starts_with("http://") && !cfg.server.base_url.starts_with("https://") {
        return Err(ConfigError::Invalid(
            "server.base_url must start with http:// or https://",
        ));
    }
    if cfg.server.token.trim().is_empty() {
        return Err(ConfigError::Invalid("server.token must be non-empty"));
    }
    Ok(())
}

/// Example YAML configuration, used by docs and tests.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  operator: "station-1"

server:
  base_url: "https://fulfillment.example.com/"
  token: "YOUR_API_TOKEN"
"#
}
