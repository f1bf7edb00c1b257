use crate::forecast::types::Units;
use crate::utils::{parse_flag, parse_timezone, sanitize_string};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const MIN_CACHE_TTL_MINUTES: u64 = 5;
pub const MAX_CACHE_TTL_MINUTES: u64 = 1440;
const DEFAULT_CACHE_TTL_MINUTES: u64 = 30;
const DEFAULT_FORECAST_DAYS: u32 = 5;
const DEFAULT_AUTO_REFRESH_MINUTES: u32 = 30;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 15;
pub const MAX_LOCATION_LENGTH: usize = 100;

/// Widget display toggles, handed through untouched to the front-end.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub hide_location_name: bool,
    pub hide_current_time: bool,
    pub hide_temp_unit_letter: bool,
    pub hide_current_description: bool,
    pub hide_feels_like: bool,
    pub hide_humidity: bool,
    pub hide_wind_speed: bool,
    pub hide_forecast_description: bool,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub openweather_api_key: String,
    pub openweather_base_url: String,
    pub openweather_current_path: String,
    pub openweather_forecast_path: String,
    pub cache_ttl: Duration,
    pub upstream_timeout: Duration,
    pub default_location: String,
    pub default_units: Units,
    pub default_forecast_days: u32,
    pub auto_refresh_minutes: u32,
    pub app_timezone: chrono_tz::Tz,
    pub bind_addr: String,
    pub display: DisplaySettings,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup, clamping every
    /// numeric setting into its allowed range.
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let flag = |key: &str| lookup(key).map(|v| parse_flag(&v)).unwrap_or(false);

        let cache_ttl_minutes = lookup("CACHE_TTL_MINUTES")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_MINUTES)
            .clamp(MIN_CACHE_TTL_MINUTES, MAX_CACHE_TTL_MINUTES);

        let upstream_timeout_secs = lookup("UPSTREAM_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS)
            .clamp(1, 60);

        let default_units = lookup("DEFAULT_UNITS")
            .and_then(|v| v.parse::<Units>().ok())
            .unwrap_or_default();

        let default_forecast_days = lookup("DEFAULT_FORECAST_DAYS")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|days| (1..=7).contains(days))
            .unwrap_or(DEFAULT_FORECAST_DAYS);

        let auto_refresh_minutes = lookup("AUTO_REFRESH_MINUTES")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|minutes| *minutes <= 1440)
            .unwrap_or(DEFAULT_AUTO_REFRESH_MINUTES);

        let app_timezone =
            parse_timezone(&var("APP_TIMEZONE", "UTC")).map_err(|e| anyhow::anyhow!(e))?;

        Ok(Config {
            openweather_api_key: var("OPENWEATHER_API_KEY", "").trim().to_string(),
            openweather_base_url: var("OPENWEATHER_BASE_URL", "https://api.openweathermap.org")
                .trim_end_matches('/')
                .to_string(),
            openweather_current_path: var("OPENWEATHER_CURRENT_PATH", "/data/2.5/weather"),
            openweather_forecast_path: var("OPENWEATHER_FORECAST_PATH", "/data/2.5/forecast"),
            cache_ttl: Duration::from_secs(cache_ttl_minutes * 60),
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
            default_location: sanitize_string(
                &var("DEFAULT_LOCATION", "Waupun, WI"),
                MAX_LOCATION_LENGTH,
            ),
            default_units,
            default_forecast_days,
            auto_refresh_minutes,
            app_timezone,
            bind_addr: var("BIND_ADDR", "0.0.0.0:8080"),
            display: DisplaySettings {
                hide_location_name: flag("HIDE_LOCATION_NAME"),
                hide_current_time: flag("HIDE_CURRENT_TIME"),
                hide_temp_unit_letter: flag("HIDE_TEMP_UNIT_LETTER"),
                hide_current_description: flag("HIDE_CURRENT_DESCRIPTION"),
                hide_feels_like: flag("HIDE_FEELS_LIKE"),
                hide_humidity: flag("HIDE_HUMIDITY"),
                hide_wind_speed: flag("HIDE_WIND_SPEED"),
                hide_forecast_description: flag("HIDE_FORECAST_DESCRIPTION"),
            },
        })
    }

    pub fn has_credential(&self) -> bool {
        !self.openweather_api_key.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_config(pairs: &[(&str, &str)]) -> Config {
    use std::collections::HashMap;

    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_vars(|key| vars.get(key).cloned()).unwrap()
}
