use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    config::{Config, DisplaySettings},
    forecast::{
        types::{NormalizedWeather, Units},
        ConfigurationError, FetchError, OpenWeatherClient, WeatherFetcher, WeatherQuery,
    },
    utils::ErrorResponse,
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: Arc<WeatherFetcher>,
    pub weather_client: Arc<OpenWeatherClient>,
}

// Request/Response types
#[derive(Debug, Default, Deserialize)]
pub struct WeatherParams {
    pub location: Option<String>,
    pub units: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub forecast_days: Option<String>,
}

/// Accepts a JSON number or any string so bad values reach `resolve` and
/// fall back to defaults instead of rejecting the request.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl WeatherParams {
    fn resolve(&self, config: &Config) -> WeatherQuery {
        WeatherQuery::resolve(
            self.location.as_deref(),
            self.units.as_deref(),
            self.forecast_days.as_deref(),
            config,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateCredentialRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateCredentialResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct WeatherResponse {
    pub query: WeatherQuery,
    pub temperature_unit: &'static str,
    pub speed_unit: &'static str,
    pub weather: NormalizedWeather,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub credential_configured: bool,
    pub default_location: String,
    pub default_units: Units,
    pub default_forecast_days: u32,
    pub cache_ttl_minutes: u64,
    pub auto_refresh_minutes: u32,
    pub display: DisplaySettings,
}

impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        let status = match &self {
            FetchError::Configuration(ConfigurationError::MissingCredential) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            FetchError::Configuration(ConfigurationError::MissingLocation) => {
                StatusCode::BAD_REQUEST
            }
            FetchError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        tracing::error!(kind = self.kind(), "weather fetch failed: {}", self);

        (status, Json(ErrorResponse::new(self.kind(), self.to_string()))).into_response()
    }
}

// Route handlers
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn respond_with_weather(
    state: &AppState,
    params: &WeatherParams,
    force_refresh: bool,
) -> Result<Json<WeatherResponse>, FetchError> {
    let query = params.resolve(&state.config);
    let weather = state.fetcher.fetch(&query, force_refresh).await?;

    Ok(Json(WeatherResponse {
        temperature_unit: query.units.temperature_letter(),
        speed_unit: query.units.speed_label(),
        query,
        weather,
        generated_at: chrono::Utc::now(),
    }))
}

pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<WeatherResponse>, FetchError> {
    respond_with_weather(&state, &params, false).await
}

/// Manual refresh button and auto-refresh timer both land here.
pub async fn refresh_weather(
    State(state): State<AppState>,
    Json(params): Json<WeatherParams>,
) -> Result<Json<WeatherResponse>, FetchError> {
    respond_with_weather(&state, &params, true).await
}

pub async fn validate_credential(
    State(state): State<AppState>,
    Json(request): Json<ValidateCredentialRequest>,
) -> Json<ValidateCredentialResponse> {
    let valid = state.weather_client.validate_credential(&request.api_key).await;
    Json(ValidateCredentialResponse { valid })
}

pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    let config = &state.config;
    Json(SettingsResponse {
        credential_configured: config.has_credential(),
        default_location: config.default_location.clone(),
        default_units: config.default_units,
        default_forecast_days: config.default_forecast_days,
        cache_ttl_minutes: config.cache_ttl.as_secs() / 60,
        auto_refresh_minutes: config.auto_refresh_minutes,
        display: config.display.clone(),
    })
}

pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.fetcher.cache().clear();
    tracing::info!("weather cache cleared");
    StatusCode::NO_CONTENT
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/weather", get(get_weather))
        .route("/weather/refresh", post(refresh_weather))
        .route("/credential/validate", post(validate_credential))
        .route("/settings", get(get_settings))
        .route("/cache", delete(clear_cache))
        .with_state(state)
}
