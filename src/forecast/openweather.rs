use super::types::*;
use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const VALIDATION_LOCATION: &str = "London";
const VALIDATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("Weather API Error ({code}): {message}")]
    ApiError { code: String, message: String },
}

/// The upstream weather provider as seen by the fetcher.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, location: &str, units: Units)
        -> Result<RawCurrentPayload, UpstreamError>;

    async fn forecast(
        &self,
        location: &str,
        units: Units,
        samples: u32,
    ) -> Result<RawForecastPayload, UpstreamError>;
}

pub struct OpenWeatherClient {
    client: Client,
    config: Config,
}

impl OpenWeatherClient {
    pub fn new(config: Config) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .user_agent("FamilyWeather/1.0")
            .timeout(config.upstream_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    fn current_url(&self) -> String {
        format!(
            "{}{}",
            self.config.openweather_base_url, self.config.openweather_current_path
        )
    }

    fn forecast_url(&self) -> String {
        format!(
            "{}{}",
            self.config.openweather_base_url, self.config.openweather_forecast_path
        )
    }

    /// Checks an API key with one cheap current-conditions call. Every
    /// failure mode collapses to `false`.
    pub async fn validate_credential(&self, api_key: &str) -> bool {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return false;
        }

        let response = self
            .client
            .get(self.current_url())
            .query(&[
                ("q", VALIDATION_LOCATION),
                ("appid", api_key),
                ("units", Units::Metric.as_str()),
            ])
            .timeout(VALIDATION_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(response) => {
                let valid = response.status() == reqwest::StatusCode::OK;
                tracing::info!(status = %response.status(), valid, "API key validation");
                valid
            }
            Err(e) => {
                tracing::warn!("API key validation request failed: {}", e.without_url());
                false
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        // The request URL carries `appid`, so it is stripped from transport errors.
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        let text = response.text().await.map_err(reqwest::Error::without_url)?;

        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(UpstreamError::ApiError {
                    code: status.as_u16().to_string(),
                    message: text,
                });
            }
            Err(e) => return Err(e.into()),
        };

        check_response_code(status, &body)?;
        Ok(serde_json::from_value(body)?)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(
        &self,
        location: &str,
        units: Units,
    ) -> Result<RawCurrentPayload, UpstreamError> {
        tracing::info!(location, %units, "requesting current conditions");
        self.get_json(
            &self.current_url(),
            &[
                ("q", location),
                ("units", units.as_str()),
                ("appid", &self.config.openweather_api_key),
            ],
        )
        .await
    }

    async fn forecast(
        &self,
        location: &str,
        units: Units,
        samples: u32,
    ) -> Result<RawForecastPayload, UpstreamError> {
        tracing::info!(location, %units, samples, "requesting forecast");
        self.get_json(
            &self.forecast_url(),
            &[
                ("q", location),
                ("units", units.as_str()),
                ("appid", &self.config.openweather_api_key),
                ("cnt", &samples.to_string()),
            ],
        )
        .await
    }
}

/// OpenWeatherMap reports errors through `cod`, as a number on some
/// endpoints and a string on others.
fn response_code(body: &Value) -> Option<String> {
    match body.get("cod")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

fn check_response_code(status: reqwest::StatusCode, body: &Value) -> Result<(), UpstreamError> {
    let code = response_code(body);
    let code_ok = code.as_deref().map_or(true, |c| c == "200");
    if status.is_success() && code_ok {
        return Ok(());
    }

    let message = body
        .get("message")
        .and_then(|m| match m {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    Err(UpstreamError::ApiError {
        code: code.unwrap_or_else(|| status.as_u16().to_string()),
        message,
    })
}
