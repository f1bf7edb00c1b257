pub mod cache;
pub mod clock;
pub mod fetcher;
pub mod merge;
#[cfg(test)]
pub mod mock;
pub mod openweather;
pub mod query;
pub mod types;

pub use clock::SystemClock;
pub use fetcher::{ConfigurationError, FetchError, WeatherFetcher};
pub use openweather::OpenWeatherClient;
pub use query::WeatherQuery;
