use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::WeatherError;

/// Where the API key is kept when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "~/.owm_api_key.cfg";

/// Environment variable consulted when `--api-key` is absent.
pub const API_KEY_ENV: &str = "OPENWEATHERMAP_KEY";

/// On-disk shape of the config file:
/// `{"api_key": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    api_key: String,
}

/// Effective configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub path: PathBuf,
    /// Set when `api_key` was read from `path`.
    pub loaded_from_file: bool,
}

impl Config {
    /// Resolve the API key: a non-empty explicit key wins, then the config
    /// file if it exists, otherwise the key is empty.
    pub fn resolve(explicit_key: Option<&str>, path: &str) -> Result<Self, WeatherError> {
        let path = expand_home(path)?;

        if let Some(key) = explicit_key.filter(|k| !k.is_empty()) {
            debug!("using API key from command line or environment");
            return Ok(Self { api_key: key.to_string(), path, loaded_from_file: false });
        }

        if !path.exists() {
            debug!(path = %path.display(), "no config file, API key is empty");
            return Ok(Self { api_key: String::new(), path, loaded_from_file: false });
        }

        let file = Self::read_file(&path)?;
        debug!(path = %path.display(), "using API key from config file");

        Ok(Self { api_key: file.api_key, path, loaded_from_file: true })
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Replace the key and overwrite the config file with it.
    pub fn save_api_key(&mut self, api_key: String) -> Result<(), WeatherError> {
        self.api_key = api_key;
        self.save()
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<(), WeatherError> {
        let io_err =
            |source: std::io::Error| WeatherError::ConfigIo { path: self.path.clone(), source };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let file = ConfigFile { api_key: self.api_key.clone() };
        let json = serde_json::to_string(&file)
            .map_err(|source| WeatherError::ConfigEncode { path: self.path.clone(), source })?;

        fs::write(&self.path, json).map_err(io_err)?;
        debug!(path = %self.path.display(), "config saved");

        Ok(())
    }

    fn read_file(path: &Path) -> Result<ConfigFile, WeatherError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| WeatherError::ConfigIo { path: path.to_path_buf(), source })?;

        serde_json::from_str(&contents)
            .map_err(|source| WeatherError::ConfigParse { path: path.to_path_buf(), source })
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf, WeatherError> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() => "",
        Some(rest) if rest.starts_with('/') || rest.starts_with(std::path::MAIN_SEPARATOR) => {
            &rest[1..]
        }
        // `~user/...` and plain paths are taken literally
        _ => return Ok(PathBuf::from(path)),
    };

    let dirs = BaseDirs::new().ok_or_else(|| WeatherError::HomeDir(path.to_string()))?;
    let home = dirs.home_dir();

    Ok(if rest.is_empty() { home.to_path_buf() } else { home.join(rest) })
}
