use std::{
    io::{self, Write},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use crossterm::tty::IsTty;
use inquire::Text;
use owm_core::{
    Config, OpenWeatherClient, TimeMode, Units, WeatherError, WeatherQuery,
    config::{API_KEY_ENV, DEFAULT_CONFIG_PATH},
    presenter,
};
use tracing::debug;

const LONG_ABOUT: &str = "
A simple weather client for the OpenWeatherMap API.

The API key is taken from --api-key, then the OPENWEATHERMAP_KEY environment
variable, then the config file. Use `owm save-config` to store it.

API reference: http://openweathermap.org/api
";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "owm", version, about = "Current weather from OpenWeatherMap", long_about = LONG_ABOUT)]
pub struct Cli {
    /// OpenWeatherMap API key.
    #[arg(short, long, env = API_KEY_ENV, hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Path of the JSON file holding the API key.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: String,

    /// Log more (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save the API key to the config file.
    SaveConfig,

    /// Get the current weather.
    ///
    /// Location can be a town/city name and optionally an ISO 3166 country
    /// code, e.g. 'Melbourne' or 'Melbourne, AU'.
    Current {
        location: String,

        /// Units of measurement.
        #[arg(short, long, value_enum, default_value_t = UnitsArg::Metric)]
        units: UnitsArg,

        /// Print local or UTC time.
        #[arg(short, long, value_enum, default_value_t = TimeArg::Local)]
        time: TimeArg,

        /// Print the JSON response.
        #[arg(short, long)]
        json: bool,

        /// Print the API query.
        #[arg(short, long)]
        query: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitsArg {
    Standard,
    Metric,
    Imperial,
}

impl From<UnitsArg> for Units {
    fn from(value: UnitsArg) -> Self {
        match value {
            UnitsArg::Standard => Units::Standard,
            UnitsArg::Metric => Units::Metric,
            UnitsArg::Imperial => Units::Imperial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimeArg {
    Local,
    Utc,
}

impl From<TimeArg> for TimeMode {
    fn from(value: TimeArg) -> Self {
        match value {
            TimeArg::Local => TimeMode::Local,
            TimeArg::Utc => TimeMode::Utc,
        }
    }
}

/// Everything `current` needs beyond the client.
#[derive(Debug, Clone)]
pub struct CurrentOptions {
    pub query: WeatherQuery,
    pub time: TimeMode,
    pub output_json: bool,
    pub show_query_url: bool,
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        let mut config = Config::resolve(self.api_key.as_deref(), &self.config)?;
        if config.loaded_from_file {
            eprintln!("reading config: {}", config.path.display());
        }

        let no_color_env = std::env::var_os("NO_COLOR").is_some();

        match self.command {
            Command::SaveConfig => {
                save_config(&mut config)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Current { location, units, time, json, query } => {
                let options = CurrentOptions {
                    query: WeatherQuery { location, units: units.into() },
                    time: time.into(),
                    output_json: json,
                    show_query_url: query,
                };
                let client = OpenWeatherClient::from_config(&config)?;
                let color = color_enabled(self.no_color, no_color_env, io::stdout().is_tty());
                let header_color =
                    color_enabled(self.no_color, no_color_env, io::stderr().is_tty());

                current(&client, &options, color, header_color, &mut io::stdout().lock()).await
            }
        }
    }
}

/// Prompt for the key (defaulting to the current one) and overwrite the config file.
fn save_config(config: &mut Config) -> Result<()> {
    let current_key = config.api_key.clone();

    let mut prompt = Text::new("save API key");
    if !current_key.is_empty() {
        prompt = prompt.with_default(&current_key);
    }

    let api_key = prompt.prompt().context("Failed to read API key")?;

    config.save_api_key(api_key)?;
    println!("saved config: {}", config.path.display());

    Ok(())
}

/// Fetch and print current conditions.
///
/// A non-200 `cod` is printed as an error line and reported through the exit
/// code rather than as an error.
pub async fn current(
    client: &OpenWeatherClient,
    options: &CurrentOptions,
    color: bool,
    header_color: bool,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    if options.show_query_url {
        let url = client.current_weather_url(&options.query)?;
        write!(out, "{}", presenter::query_report(&url).paint(color))?;
    }

    let response = client
        .fetch_current(&options.query)
        .await
        .context("Failed to fetch current weather")?;

    if options.output_json {
        eprint!("{}", presenter::json_header().paint(header_color));
        let text = presenter::pretty_json(&response.body).context("Failed to format JSON")?;
        writeln!(out, "{text}")?;
        return Ok(ExitCode::SUCCESS);
    }

    match response.to_weather() {
        Ok(weather) => {
            let report = presenter::current_report(&weather, options.query.units, options.time);
            write!(out, "{}", report.paint(color))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(WeatherError::Api { code, message }) => {
            debug!(%code, "provider reported an error");
            write!(out, "{}", presenter::error_report(&code, &message).paint(color))?;
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err).context("Unexpected OpenWeatherMap response"),
    }
}

/// Color only on a terminal, and only when neither `--no-color` nor `NO_COLOR` asks otherwise.
fn color_enabled(no_color_flag: bool, no_color_env: bool, is_tty: bool) -> bool {
    is_tty && !no_color_flag && !no_color_env
}
