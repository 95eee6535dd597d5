use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::WeatherError;

/// Unit system understood by the `units` query parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Units {
    /// Kelvin
    Standard,
    /// Celsius
    #[default]
    Metric,
    /// Fahrenheit
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(&self) -> char {
        match self {
            Units::Standard => 'K',
            Units::Metric => 'C',
            Units::Imperial => 'F',
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Standard, Units::Metric, Units::Imperial]
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clock used when printing the observation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeMode {
    #[default]
    Local,
    Utc,
}

impl TimeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeMode::Local => "local",
            TimeMode::Utc => "utc",
        }
    }
}

impl std::fmt::Display for TimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct WeatherQuery {
    /// City name, optionally followed by an ISO 3166 country code, e.g. "Melbourne, AU".
    pub location: String,
    pub units: Units,
}

/// The `cod` field. OpenWeatherMap sends it as a number on success and on
/// some errors, but as a string on others (`"404"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusCode {
    Number(i64),
    Text(String),
}

impl StatusCode {
    pub fn value(&self) -> Option<i64> {
        match self {
            StatusCode::Number(n) => Some(*n),
            StatusCode::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.value() == Some(200)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusCode::Number(n) => write!(f, "{n}"),
            StatusCode::Text(s) => f.write_str(s),
        }
    }
}

/// Current conditions, decoded from a `cod == 200` response.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub city: String,
    pub country: String,
    pub observed_at: DateTime<Utc>,
    pub temperature: f64,
    pub conditions: Vec<String>,
    /// Kept as sent so it prints the way the provider wrote it.
    pub wind_speed: Number,
}

/// A response as received: where it came from and the untouched body.
#[derive(Debug, Clone)]
pub struct CurrentResponse {
    pub url: Url,
    pub http_status: u16,
    pub body: Value,
}

impl CurrentResponse {
    /// Decode the typed weather, turning a non-200 `cod` into [`WeatherError::Api`].
    pub fn to_weather(&self) -> Result<CurrentWeather, WeatherError> {
        let envelope = OwEnvelope::deserialize(&self.body).map_err(|e| self.decode_error(e))?;

        if !envelope.cod.is_ok() {
            return Err(WeatherError::Api {
                code: envelope.cod,
                message: envelope.message.unwrap_or_default(),
            });
        }

        let parsed = OwCurrentResponse::deserialize(&self.body).map_err(|e| self.decode_error(e))?;

        let observed_at = DateTime::from_timestamp(parsed.dt, 0).ok_or_else(|| {
            WeatherError::Decode {
                status: self.http_status,
                reason: format!("timestamp {} is out of range", parsed.dt),
            }
        })?;

        Ok(CurrentWeather {
            city: parsed.name,
            country: parsed.sys.country,
            observed_at,
            temperature: parsed.main.temp,
            conditions: parsed.weather.into_iter().map(|w| w.description).collect(),
            wind_speed: parsed.wind.speed,
        })
    }

    fn decode_error(&self, err: serde_json::Error) -> WeatherError {
        WeatherError::Decode { status: self.http_status, reason: err.to_string() }
    }
}

#[derive(Debug, Deserialize)]
struct OwEnvelope {
    cod: StatusCode,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Number,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    #[serde(deserialize_with = "unix_seconds")]
    dt: i64,
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

/// `dt` is normally an integer, but a fractional value is truncated to whole seconds.
fn unix_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let n = Number::deserialize(deserializer)?;
    n.as_i64()
        .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        .ok_or_else(|| serde::de::Error::custom(format!("invalid unix timestamp {n}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: Value) -> CurrentResponse {
        CurrentResponse {
            url: Url::parse("https://api.openweathermap.org/data/2.5/weather").unwrap(),
            http_status: 200,
            body,
        }
    }

    fn melbourne() -> Value {
        json!({
            "cod": 200,
            "name": "Melbourne",
            "sys": {"country": "AU"},
            "dt": 1700000000,
            "main": {"temp": 18.43},
            "weather": [{"description": "clear sky"}, {"description": "mist"}],
            "wind": {"speed": 3.1}
        })
    }

    #[test]
    fn temperature_symbols_match_unit_system() {
        let symbols: Vec<char> = Units::all().iter().map(|u| u.temperature_symbol()).collect();
        assert_eq!(symbols, vec!['K', 'C', 'F']);
        assert_eq!(Units::default(), Units::Metric);
    }

    #[test]
    fn decodes_successful_response() {
        let weather = response(melbourne()).to_weather().expect("should decode");

        assert_eq!(weather.city, "Melbourne");
        assert_eq!(weather.country, "AU");
        assert_eq!(weather.observed_at.timestamp(), 1_700_000_000);
        assert!((weather.temperature - 18.43).abs() < f64::EPSILON);
        assert_eq!(weather.conditions, vec!["clear sky", "mist"]);
        assert_eq!(weather.wind_speed.to_string(), "3.1");
    }

    #[test]
    fn numeric_error_code_becomes_api_error() {
        let err = response(json!({"cod": 401, "message": "Invalid API key"}))
            .to_weather()
            .unwrap_err();

        assert!(err.is_api());
        assert_eq!(err.to_string(), "(401) Invalid API key");
    }

    #[test]
    fn string_error_code_becomes_api_error() {
        let err = response(json!({"cod": "404", "message": "city not found"}))
            .to_weather()
            .unwrap_err();

        match err {
            WeatherError::Api { code, message } => {
                assert_eq!(code, StatusCode::Text("404".into()));
                assert_eq!(code.value(), Some(404));
                assert_eq!(message, "city not found");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn missing_field_on_success_is_decode_error() {
        let mut body = melbourne();
        body.as_object_mut().unwrap().remove("main");

        let err = response(body).to_weather().unwrap_err();
        assert!(matches!(err, WeatherError::Decode { status: 200, .. }), "got {err:?}");
    }

    #[test]
    fn fractional_timestamp_is_truncated() {
        let mut body = melbourne();
        body["dt"] = json!(1700000000.9);

        let weather = response(body).to_weather().unwrap();
        assert_eq!(weather.observed_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn non_numeric_timestamp_is_decode_error() {
        let mut body = melbourne();
        body["dt"] = json!("yesterday");

        let err = response(body).to_weather().unwrap_err();
        assert!(matches!(err, WeatherError::Decode { .. }), "got {err:?}");
    }

    #[test]
    fn body_without_cod_is_decode_error() {
        let err = response(json!({"unexpected": true})).to_weather().unwrap_err();
        assert!(matches!(err, WeatherError::Decode { .. }));
    }

    #[test]
    fn status_code_compares_by_value() {
        assert!(StatusCode::Number(200).is_ok());
        assert!(StatusCode::Text("200".into()).is_ok());
        assert!(!StatusCode::Number(401).is_ok());
        assert!(!StatusCode::Text("nope".into()).is_ok());
    }
}
