use super::types::Units;
use crate::config::{Config, MAX_LOCATION_LENGTH};
use crate::utils::sanitize_string;
use serde::Serialize;
use sha2::{Digest, Sha256};

pub const MIN_FORECAST_DAYS: u32 = 1;
pub const MAX_FORECAST_DAYS: u32 = 7;
/// The forecast endpoint reports in 3-hour buckets.
pub const SAMPLES_PER_DAY: u32 = 8;

const CACHE_KEY_PREFIX: &str = "sfw_weather_data_";

/// Request parameters for one widget render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherQuery {
    pub location: String,
    pub units: Units,
    pub forecast_days: u32,
}

impl WeatherQuery {
    pub fn new(location: impl Into<String>, units: Units, forecast_days: u32) -> Self {
        Self {
            location: location.into(),
            units,
            forecast_days: forecast_days.clamp(MIN_FORECAST_DAYS, MAX_FORECAST_DAYS),
        }
    }

    /// Fills in widget attributes from the configured defaults. A missing
    /// location falls back to the default one, but an explicitly blank
    /// location is kept so the fetch reports it. Unparsable or out of range
    /// day counts fall back to the default.
    pub fn resolve(
        location: Option<&str>,
        units: Option<&str>,
        forecast_days: Option<&str>,
        config: &Config,
    ) -> Self {
        let location = match location {
            Some(raw) => sanitize_string(raw, MAX_LOCATION_LENGTH),
            None => config.default_location.clone(),
        };
        let units = units
            .and_then(|raw| raw.parse::<Units>().ok())
            .unwrap_or(config.default_units);
        let forecast_days = forecast_days
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|days| (MIN_FORECAST_DAYS..=MAX_FORECAST_DAYS).contains(days))
            .unwrap_or(config.default_forecast_days);

        Self {
            location,
            units,
            forecast_days,
        }
    }

    /// Stable cache key for this query.
    pub fn fingerprint(&self) -> String {
        let days = self.forecast_days.to_string();
        let payload = [self.location.as_str(), self.units.as_str(), days.as_str()].join("|");
        let digest = Sha256::digest(payload.as_bytes());
        format!("{CACHE_KEY_PREFIX}{digest:x}")
    }

    pub fn forecast_sample_count(&self) -> u32 {
        self.forecast_days * SAMPLES_PER_DAY
    }

    pub fn wants_forecast(&self) -> bool {
        self.forecast_days > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = WeatherQuery::new("Waupun, WI", Units::Imperial, 5);
        let b = WeatherQuery::new("Waupun, WI", Units::Imperial, 5);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert!(a.fingerprint().starts_with("sfw_weather_data_"));
    }

    #[test]
    fn test_fingerprint_differs_per_field() {
        let base = WeatherQuery::new("Waupun, WI", Units::Imperial, 5);
        let variants = [
            WeatherQuery::new("Madison, WI", Units::Imperial, 5),
            WeatherQuery::new("Waupun, WI", Units::Metric, 5),
            WeatherQuery::new("Waupun, WI", Units::Imperial, 3),
        ];

        for variant in &variants {
            assert_ne!(base.fingerprint(), variant.fingerprint(), "{:?}", variant);
        }
    }

    #[test]
    fn test_fingerprint_separates_fields() {
        // "Paris1" + 2 days must not collide with "Paris" + 12 style concatenations.
        let a = WeatherQuery {
            location: "Paris1".to_string(),
            units: Units::Metric,
            forecast_days: 2,
        };
        let b = WeatherQuery {
            location: "Paris".to_string(),
            units: Units::Metric,
            forecast_days: 12,
        };
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_sample_count() {
        let query = WeatherQuery::new("Oslo", Units::Metric, 5);
        assert_eq!(query.forecast_sample_count(), 40);
        assert!(query.wants_forecast());
        assert!(!WeatherQuery::new("Oslo", Units::Metric, 1).wants_forecast());
    }

    #[test]
    fn test_resolve_uses_defaults() {
        let config = test_config(&[
            ("DEFAULT_LOCATION", "Waupun, WI"),
            ("DEFAULT_UNITS", "imperial"),
            ("DEFAULT_FORECAST_DAYS", "4"),
        ]);

        let query = WeatherQuery::resolve(None, Some("celsius"), Some("12"), &config);

        assert_eq!(query.location, "Waupun, WI");
        assert_eq!(query.units, Units::Imperial);
        assert_eq!(query.forecast_days, 4);
    }

    #[test]
    fn test_resolve_keeps_valid_attributes() {
        let config = test_config(&[]);

        let query =
            WeatherQuery::resolve(Some(" Oslo, NO "), Some("metric"), Some(" 7 "), &config);

        assert_eq!(query.location, "Oslo, NO");
        assert_eq!(query.units, Units::Metric);
        assert_eq!(query.forecast_days, 7);
    }

    #[test]
    fn test_resolve_ignores_unparsable_days() {
        let config = test_config(&[("DEFAULT_FORECAST_DAYS", "3")]);

        for raw in ["abc", "-1", "0", "", "2.5"] {
            let query = WeatherQuery::resolve(None, None, Some(raw), &config);
            assert_eq!(query.forecast_days, 3, "{raw:?}");
        }
    }

    #[test]
    fn test_resolve_keeps_blank_location() {
        let config = test_config(&[]);
        let query = WeatherQuery::resolve(Some("   "), None, None, &config);
        assert!(query.location.is_empty());
    }
}
