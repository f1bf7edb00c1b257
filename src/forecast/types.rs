use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Imperial => "imperial",
            Units::Metric => "metric",
        }
    }

    pub fn temperature_letter(&self) -> &'static str {
        match self {
            Units::Imperial => "F",
            Units::Metric => "C",
        }
    }

    pub fn speed_label(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric => "m/s",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imperial" => Ok(Units::Imperial),
            "metric" => Ok(Units::Metric),
            other => Err(format!("Unknown unit system: {}", other)),
        }
    }
}

// Upstream payloads. Only the fields the normalizer reads are modeled; the
// rest of the OpenWeatherMap document is ignored on decode.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCurrentPayload {
    #[serde(default)]
    pub name: Option<String>,
    pub main: CurrentMain,
    #[serde(default)]
    pub weather: Vec<WeatherTag>,
    pub wind: Wind,
    #[serde(default)]
    pub visibility: Option<f64>,
    pub sys: CurrentSys,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentMain {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentSys {
    #[serde(default)]
    pub country: Option<String>,
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherTag {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawForecastPayload {
    #[serde(default)]
    pub list: Vec<ForecastSample>,
}

/// One 3-hour forecast bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSample {
    pub dt: i64,
    pub main: SampleMain,
    #[serde(default)]
    pub weather: Vec<WeatherTag>,
    pub wind: Wind,
    #[serde(default)]
    pub pop: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleMain {
    pub temp: f64,
    pub humidity: f64,
}

/// Forecast half of a cached upstream response.
#[derive(Debug, Clone)]
pub enum ForecastState {
    /// Only the current day was asked for.
    NotRequested,
    /// The forecast call failed; current conditions are still served.
    Unavailable { reason: String },
    Available(RawForecastPayload),
}

impl ForecastState {
    pub fn payload(&self) -> Option<&RawForecastPayload> {
        match self {
            ForecastState::Available(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Everything fetched from upstream for one query. This is what gets cached.
#[derive(Debug, Clone)]
pub struct CombinedRawResponse {
    pub current: RawCurrentPayload,
    pub forecast: ForecastState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedWeather {
    pub location_name: String,
    pub country: Option<String>,
    pub current: CurrentConditions,
    pub forecast: Vec<DailyForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub temp: i64,
    pub feels_like: i64,
    pub description: String,
    pub icon_code: String,
    pub humidity: u8,
    pub wind_speed: f64,
    pub pressure: f64,
    /// Kilometres.
    pub visibility: Option<f64>,
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: i64,
    pub temp_high: i64,
    pub temp_low: i64,
    pub description: String,
    pub icon_code: String,
    pub humidity: u8,
    pub wind_speed: f64,
    pub precipitation_probability: u8,
}
