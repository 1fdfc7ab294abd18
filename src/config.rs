use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration problems are reported before any request is issued, so a
/// missing endpoint or credential never shows up as a generation failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no generation endpoint configured: set GEMINI_API_URL or endpoint_url in the config file")]
    MissingEndpoint,
    #[error("no API credential configured: set GEMINI_API_KEY or credential in the config file")]
    MissingCredential,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub endpoint_url: Option<String>,
    pub credential: Option<String>,
}

/// Endpoint settings with both required values present.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: String,
    pub credential: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Resolves the endpoint settings, with environment variables taking
    /// precedence over the config file.
    pub fn resolve_endpoint(&self) -> Result<Endpoint, ConfigError> {
        let url = std::env::var("GEMINI_API_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.endpoint_url.clone())
            .ok_or(ConfigError::MissingEndpoint)?;

        let credential = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.credential.clone())
            .ok_or(ConfigError::MissingCredential)?;

        Ok(Endpoint { url, credential })
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("gembot").join("config.json"))
    }
}

/// Directory for diagnostic logs, alongside the config file.
pub fn log_dir() -> Result<PathBuf> {
    let config_dir =
        dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
    Ok(config_dir.join("gembot"))
}
