use serde::{Deserialize, Serialize};
use std::fmt;

/// A measured value as the provider reports it.
///
/// goweather sends formatted strings (`"+21 °C"`, `"12 km/h"`); other
/// providers and test fixtures send bare numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Number(n) => write!(f, "{}", n),
            Reading::Text(s) => f.write_str(s),
        }
    }
}

/// Condition categories derived from the provider's free-text description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Rain,
    Snow,
    Windy,
    Thunderstorm,
    #[default]
    Unknown,
}

impl WeatherCondition {
    /// Map a description label to a condition.
    ///
    /// Anything mentioning thunder wins; the rest are exact labels.
    pub fn from_description(description: &str) -> Self {
        if description.to_lowercase().contains("thunder") {
            return Self::Thunderstorm;
        }
        match description {
            "Clear" | "Sunny" => Self::Clear,
            "Cloudy" => Self::Cloudy,
            "Rainy" => Self::Rain,
            "Partly cloudy" => Self::PartlyCloudy,
            "Snowy" => Self::Snow,
            "Wind" => Self::Windy,
            _ => Self::Unknown,
        }
    }

    /// Get icon name for the rendering layer
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::PartlyCloudy => "cloud_sun",
            Self::Cloudy => "cloud",
            Self::Rain => "cloud_rain",
            Self::Snow => "cloud_snow",
            Self::Windy => "wind",
            Self::Thunderstorm => "zap",
            Self::Unknown => "circle_help",
        }
    }
}

/// One day of the short forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub temperature: Option<Reading>,
    #[serde(default)]
    pub wind: Option<Reading>,
}

/// Current conditions plus short forecast for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub temperature: Option<Reading>,
    pub description: String,
    pub wind: Option<Reading>,
    pub forecast: Vec<ForecastDay>,
}

impl WeatherRecord {
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_description(&self.description)
    }
}

/// Raw response body; every field is optional on the wire
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WeatherResponse {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    temperature: Option<Reading>,
    #[serde(default)]
    wind: Option<Reading>,
    #[serde(default)]
    forecast: Option<Vec<ForecastDay>>,
}

impl WeatherResponse {
    /// A response is only usable when it carries a non-empty description
    pub(crate) fn into_record(self) -> Result<WeatherRecord, WeatherError> {
        let description = match self.description {
            Some(d) if !d.is_empty() => d,
            _ => return Err(WeatherError::MissingDescription),
        };

        Ok(WeatherRecord {
            temperature: self.temperature,
            description,
            wind: self.wind,
            forecast: self.forecast.unwrap_or_default(),
        })
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Unexpected status {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Response has no description")]
    MissingDescription,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("City directory error: {0}")]
    Directory(String),
}
