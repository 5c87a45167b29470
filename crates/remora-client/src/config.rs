use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://compute.remora.dev/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoraConfig {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for RemoraConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Get the path to the config file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ClientError::Configuration("Could not find config directory".to_string()))?
        .join("remora");

    fs::create_dir_all(&config_dir).map_err(|e| {
        ClientError::Configuration(format!("Failed to create config directory: {e}"))
    })?;

    Ok(config_dir.join("config.json"))
}

/// Load the configuration, falling back to defaults when no config file
/// exists. `REMORA_ENDPOINT` and `REMORA_API_KEY` override the file.
pub fn load_config() -> Result<RemoraConfig> {
    let config_path = config_path()?;

    let mut config = if config_path.exists() {
        let config_str = fs::read_to_string(&config_path)
            .map_err(|e| ClientError::Configuration(format!("Failed to read config file: {e}")))?;
        serde_json::from_str(&config_str)
            .map_err(|e| ClientError::Configuration(format!("Failed to parse config file: {e}")))?
    } else {
        RemoraConfig::default()
    };

    if let Ok(endpoint) = std::env::var("REMORA_ENDPOINT") {
        config.endpoint = endpoint;
    }
    if let Ok(api_key) = std::env::var("REMORA_API_KEY") {
        config.api_key = Some(api_key);
    }

    Ok(config)
}
