//! Text output.
//!
//! Everything here is built as plain data first: a [`Report`] is a list of
//! lines made of styled [`Segment`]s. Whether escape codes are emitted is
//! decided only at render time, by [`Report::paint`].

use chrono::{DateTime, Local, Utc};
use crossterm::style::{Color, Stylize};
use reqwest::Url;
use serde::Serialize;
use serde_json::{Map, Value, ser::PrettyFormatter};

use crate::model::{CurrentWeather, StatusCode, TimeMode, Units};

/// Width of the label column in the weather summary.
pub const LABEL_WIDTH: usize = 13;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Style {
    fn color(self) -> Color {
        match self {
            Style::Red => Color::Red,
            Style::Green => Color::Green,
            Style::Yellow => Color::Yellow,
            Style::Blue => Color::Blue,
            Style::Magenta => Color::Magenta,
            Style::Cyan => Color::Cyan,
            Style::White => Color::White,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: Style,
}

impl Segment {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self { text: text.into(), style }
    }

    fn render(&self, color: bool) -> String {
        if color {
            self.text.as_str().with(self.style.color()).to_string()
        } else {
            self.text.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub segments: Vec<Segment>,
}

impl Line {
    /// A `label: value` pair with the label padded to [`LABEL_WIDTH`].
    fn labelled(label: &str, label_style: Style, value: impl Into<String>) -> Self {
        Self {
            segments: vec![
                Segment::new(format!("{label:<LABEL_WIDTH$}"), label_style),
                Segment::new(value, Style::White),
            ],
        }
    }

    fn tagged(tag: &str, tag_style: Style, value: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::new(tag, tag_style), Segment::new(value, Style::White)],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub lines: Vec<Line>,
}

impl Report {
    /// Text without any escape codes, one `\n`-terminated line per [`Line`].
    pub fn plain(&self) -> String {
        self.paint(false)
    }

    pub fn paint(&self, color: bool) -> String {
        let mut out = String::new();
        for line in &self.lines {
            for segment in &line.segments {
                out.push_str(&segment.render(color));
            }
            out.push('\n');
        }
        out
    }
}

/// The six-line summary: location, country, time, temperature, weather, wind.
pub fn current_report(weather: &CurrentWeather, units: Units, time: TimeMode) -> Report {
    let temperature = format!("{:.1}°{}", weather.temperature, units.temperature_symbol());

    Report {
        lines: vec![
            Line::labelled("location:", Style::Magenta, weather.city.as_str()),
            Line::labelled("country:", Style::Blue, weather.country.as_str()),
            Line::labelled("time:", Style::Yellow, format_time(weather.observed_at, time)),
            Line::labelled("temperature:", Style::Green, temperature),
            Line::labelled("weather:", Style::Cyan, weather.conditions.join(", ")),
            // wind is always labelled m/s, whatever the unit system
            Line::labelled("wind:", Style::Red, format!("{} m/s", weather.wind_speed)),
        ],
    }
}

pub fn error_report(code: &StatusCode, message: &str) -> Report {
    Report { lines: vec![Line::tagged("error: ", Style::Red, format!("({code}) {message}"))] }
}

pub fn query_report(url: &Url) -> Report {
    Report { lines: vec![Line::tagged("api query: ", Style::Yellow, url.as_str())] }
}

pub fn json_header() -> Report {
    Report { lines: vec![Line { segments: vec![Segment::new("response json:", Style::Yellow)] }] }
}

fn format_time(at: DateTime<Utc>, mode: TimeMode) -> String {
    let stamp = match mode {
        TimeMode::Utc => at.format(TIME_FORMAT).to_string(),
        TimeMode::Local => at.with_timezone(&Local).format(TIME_FORMAT).to_string(),
    };
    format!("{stamp} ({mode})")
}

/// Pretty-print with sorted keys and four-space indentation.
pub fn pretty_json(value: &Value) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    sort_keys(value).serialize(&mut ser)?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// Rebuilt rather than relying on the map type, which keeps insertion order
// when serde_json's `preserve_order` is enabled anywhere in the build.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), sort_keys(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
