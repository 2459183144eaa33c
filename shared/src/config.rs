use serde::{Deserialize, Serialize};
use std::fs;

/// Fallback when neither the environment nor the config file names a
/// service URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment override for the service base URL.
pub const API_URL_ENV: &str = "AUSCULT_API_URL";

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Deserialize, Serialize, Default, Clone)]
pub struct Config {
    pub api: Option<ApiConfig>,
}

#[derive(Deserialize, Serialize, Default, Clone)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl Config {
    /// Environment override wins, then the config file, then the
    /// hardcoded fallback.
    pub fn base_url(&self) -> String {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                return url;
            }
        }
        self.api
            .as_ref()
            .and_then(|api| api.base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.api
            .as_ref()
            .and_then(|api| api.timeout_seconds)
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn set_base_url(&mut self, url: String) {
        self.api.get_or_insert_with(ApiConfig::default).base_url = Some(url);
    }
}

pub fn load_config() -> Config {
    let config_path = dirs::home_dir()
        .map(|home| home.join(".config").join("auscult").join("config.toml"))
        .unwrap_or_default();

    if let Ok(content) = fs::read_to_string(&config_path) {
        toml::from_str(&content).unwrap_or_default()
    } else {
        Config::default()
    }
}

pub fn save_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = dirs::home_dir()
        .map(|home| home.join(".config").join("auscult"))
        .ok_or("Could not find home directory")?;

    fs::create_dir_all(&config_dir)?;

    let config_path = config_dir.join("config.toml");
    let toml_string = toml::to_string_pretty(config)?;
    fs::write(&config_path, toml_string)?;

    Ok(())
}
