//! Core library for the `owm` CLI.
//!
//! This crate defines:
//! - API key resolution from flag, environment and config file
//! - The OpenWeatherMap current-weather client
//! - Typed response models and the error taxonomy
//! - Text and JSON presentation of the results
//!
//! It is used by `owm-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod presenter;

pub use client::OpenWeatherClient;
pub use config::Config;
pub use error::WeatherError;
pub use model::{CurrentResponse, CurrentWeather, StatusCode, TimeMode, Units, WeatherQuery};
pub use presenter::Report;
