use anyhow::{anyhow, Result};
use std::path::PathBuf;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";

const APP_DIR: &str = "smartspark";

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub preferences_path: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    /// Fill in anything not given explicitly from the platform defaults
    pub fn resolve(
        backend_url: Option<String>,
        preferences_path: Option<PathBuf>,
        log_path: Option<PathBuf>,
    ) -> Result<Self> {
        let backend_url = backend_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let preferences_path = match preferences_path {
            Some(path) => path,
            None => Self::default_preferences_path()?,
        };

        let log_path = match log_path {
            Some(path) => path,
            None => Self::default_log_path()?,
        };

        Ok(Self {
            backend_url,
            preferences_path,
            log_path,
        })
    }

    fn default_preferences_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join(APP_DIR).join("preferences.json"))
    }

    fn default_log_path() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;

        Ok(data_dir.join(APP_DIR).join("smartspark.log"))
    }
}
