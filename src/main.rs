use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod forecast;
mod routes;
mod utils;

use config::Config;
use forecast::{OpenWeatherClient, SystemClock, WeatherFetcher};
use routes::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "family_weather=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    if !config.has_credential() {
        tracing::warn!("OPENWEATHER_API_KEY is not set, weather requests will be refused");
    }

    // Initialize weather client and fetcher
    let weather_client = Arc::new(OpenWeatherClient::new(config.clone())?);
    let fetcher = Arc::new(WeatherFetcher::new(
        &config,
        weather_client.clone(),
        Arc::new(SystemClock),
    ));
    tracing::info!(
        ttl_secs = fetcher.cache().ttl().as_secs(),
        timezone = %config.app_timezone,
        "weather cache ready"
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        config: Arc::new(config),
        fetcher,
        weather_client,
    };

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server starting on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
