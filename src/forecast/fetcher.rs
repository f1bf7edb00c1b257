use super::cache::WeatherCache;
use super::clock::Clock;
use super::merge::normalize_weather;
use super::openweather::{UpstreamError, WeatherSource};
use super::query::WeatherQuery;
use super::types::*;
use crate::config::Config;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("OpenWeatherMap API key is not set. Please configure it in the service settings.")]
    MissingCredential,
    #[error("Location is not set. Please configure a default location or pass one with the request.")]
    MissingLocation,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl FetchError {
    /// Machine-readable error code for the presentation layer.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Configuration(ConfigurationError::MissingCredential) => "missing_credential",
            FetchError::Configuration(ConfigurationError::MissingLocation) => "missing_location",
            FetchError::Upstream(_) => "upstream",
        }
    }
}

/// Cache-aware entry point for weather data. Built once at start-up and
/// shared by every request handler.
pub struct WeatherFetcher {
    source: Arc<dyn WeatherSource>,
    cache: WeatherCache,
    clock: Arc<dyn Clock>,
    timezone: chrono_tz::Tz,
    has_credential: bool,
}

impl WeatherFetcher {
    pub fn new(config: &Config, source: Arc<dyn WeatherSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            cache: WeatherCache::new(config.cache_ttl, clock.clone()),
            clock,
            timezone: config.app_timezone,
            has_credential: config.has_credential(),
        }
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }

    pub async fn fetch(
        &self,
        query: &WeatherQuery,
        force_refresh: bool,
    ) -> Result<NormalizedWeather, FetchError> {
        if !self.has_credential {
            return Err(ConfigurationError::MissingCredential.into());
        }
        if query.location.trim().is_empty() {
            return Err(ConfigurationError::MissingLocation.into());
        }

        let key = query.fingerprint();

        let raw = if force_refresh {
            tracing::debug!(key = %key, "forced refresh, dropping cached entry");
            self.cache.delete(&key).await;
            None
        } else {
            self.cache.get(&key).await.map(|entry| entry.value.clone())
        };

        let raw = match raw {
            Some(raw) => raw,
            None => {
                let raw = self.fetch_upstream(query).await?;
                self.cache.set(&key, raw.clone()).await;
                raw
            }
        };

        Ok(normalize_weather(
            &raw,
            query.forecast_days,
            self.today(),
            &self.timezone,
        ))
    }

    async fn fetch_upstream(&self, query: &WeatherQuery) -> Result<CombinedRawResponse, UpstreamError> {
        let current = self
            .source
            .current(&query.location, query.units)
            .await
            .map_err(|e| {
                tracing::error!(location = %query.location, "current conditions unavailable: {}", e);
                e
            })?;

        let forecast = if !query.wants_forecast() {
            ForecastState::NotRequested
        } else {
            match self
                .source
                .forecast(&query.location, query.units, query.forecast_sample_count())
                .await
            {
                Ok(payload) => ForecastState::Available(payload),
                Err(e) => {
                    tracing::warn!(location = %query.location, "forecast unavailable: {}", e);
                    ForecastState::Unavailable {
                        reason: e.to_string(),
                    }
                }
            }
        };

        Ok(CombinedRawResponse { current, forecast })
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.timezone).date_naive()
    }
}
