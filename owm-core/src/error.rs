use std::path::PathBuf;

use thiserror::Error;

use crate::model::StatusCode;

/// Everything that can stop a weather lookup or a config update.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// No API key from the flag, the environment or the config file.
    #[error(
        "No API key configured.\n\
         Hint: pass --api-key, set OPENWEATHERMAP_KEY, or run `owm save-config`."
    )]
    MissingCredential,

    #[error("Could not determine the home directory to expand '{0}'")]
    HomeDir(String),

    #[error("Failed to access config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode config for {path}: {source}")]
    ConfigEncode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid OpenWeatherMap URL: {0}")]
    InvalidUrl(String),

    /// The request never produced a readable response.
    #[error("Failed to reach OpenWeatherMap: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body was not the JSON we expect (HTTP status kept for context).
    #[error("Failed to parse OpenWeatherMap response (HTTP {status}): {reason}")]
    Decode { status: u16, reason: String },

    /// The provider answered with a `cod` other than 200.
    #[error("({code}) {message}")]
    Api { code: StatusCode, message: String },
}

impl WeatherError {
    pub fn is_api(&self) -> bool {
        matches!(self, WeatherError::Api { .. })
    }
}
