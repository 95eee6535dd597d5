use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    config::Config,
    error::WeatherError,
    model::{CurrentResponse, WeatherQuery},
};

/// OpenWeatherMap API root; `/weather` is appended for current conditions.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    /// Construct a client from the resolved config, refusing to go on without a key.
    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        if !config.has_api_key() {
            return Err(WeatherError::MissingCredential);
        }

        Ok(Self::new(config.api_key.clone()))
    }

    /// Full request URL, including the key, as it will be sent.
    pub fn current_weather_url(&self, query: &WeatherQuery) -> Result<Url, WeatherError> {
        let endpoint = format!("{}/weather", self.base_url.trim_end_matches('/'));

        Url::parse_with_params(
            &endpoint,
            &[
                ("q", query.location.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", query.units.as_str()),
            ],
        )
        .map_err(|e| WeatherError::InvalidUrl(format!("{endpoint}: {e}")))
    }

    /// Send the single GET for current conditions.
    ///
    /// The HTTP status does not decide success: the provider reports errors
    /// in the body's `cod`, so any JSON body is returned as is.
    #[instrument(skip(self, query), fields(location = %query.location, units = %query.units))]
    pub async fn fetch_current(
        &self,
        query: &WeatherQuery,
    ) -> Result<CurrentResponse, WeatherError> {
        let url = self.current_weather_url(query)?;
        debug!(url = %redact_key(&url), "requesting current weather");

        let res = self.http.get(url.clone()).send().await?;

        let status = res.status();
        let text = res.text().await?;
        debug!(%status, bytes = text.len(), "response received");

        let body: Value = serde_json::from_str(&text).map_err(|e| WeatherError::Decode {
            status: status.as_u16(),
            reason: format!("{e}; body: {}", truncate_body(&text)),
        })?;

        Ok(CurrentResponse { url, http_status: status.as_u16(), body })
    }
}

/// Copy of `url` with `appid` masked, for logs.
fn redact_key(url: &Url) -> Url {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "appid" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();

    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
