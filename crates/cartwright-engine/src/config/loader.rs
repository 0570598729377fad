use super::schema::CartwrightConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./cartwright.yaml
    /// 2. ~/.cartwright/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<CartwrightConfig, ConfigError> {
        let local_config = PathBuf::from("./cartwright.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".cartwright").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(CartwrightConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<CartwrightConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<CartwrightConfig, ConfigError> {
        // An empty file deserializes to unit, not to an empty mapping.
        if content.trim().is_empty() {
            return Ok(CartwrightConfig::default());
        }
        let config: CartwrightConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }
}
