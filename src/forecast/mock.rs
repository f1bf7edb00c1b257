use super::openweather::{UpstreamError, WeatherSource};
use super::types::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn current_payload(name: &str, temp: f64) -> RawCurrentPayload {
    RawCurrentPayload {
        name: Some(name.to_string()),
        main: CurrentMain {
            temp,
            feels_like: temp - 1.0,
            humidity: 82,
            pressure: 1012.0,
        },
        weather: vec![WeatherTag {
            description: "light rain".to_string(),
            icon: "10d".to_string(),
        }],
        wind: Wind { speed: 9.22 },
        visibility: Some(10000.0),
        sys: CurrentSys {
            country: Some("US".to_string()),
            sunrise: 1_792_324_800,
            sunset: 1_792_363_200,
        },
    }
}

pub fn forecast_payload(samples: &[ForecastSample]) -> RawForecastPayload {
    RawForecastPayload {
        list: samples.to_vec(),
    }
}

pub fn sample(
    dt: i64,
    temp: f64,
    humidity: f64,
    wind_speed: f64,
    pop: Option<f64>,
    description: &str,
    icon: &str,
) -> ForecastSample {
    ForecastSample {
        dt,
        main: SampleMain { temp, humidity },
        weather: vec![WeatherTag {
            description: description.to_string(),
            icon: icon.to_string(),
        }],
        wind: Wind { speed: wind_speed },
        pop,
    }
}

/// Scripted reply for one endpoint.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Fail { code: String, message: String },
}

impl<T: Clone> Reply<T> {
    fn produce(&self) -> Result<T, UpstreamError> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Fail { code, message } => Err(UpstreamError::ApiError {
                code: code.clone(),
                message: message.clone(),
            }),
        }
    }
}

/// In-memory stand-in for the OpenWeatherMap client that counts calls.
pub struct MockWeatherSource {
    current: Mutex<Reply<RawCurrentPayload>>,
    forecast: Mutex<Reply<RawForecastPayload>>,
    current_calls: AtomicUsize,
    forecast_calls: AtomicUsize,
    last_sample_count: Mutex<Option<u32>>,
}

impl MockWeatherSource {
    pub fn new(current: RawCurrentPayload, forecast: RawForecastPayload) -> Self {
        Self {
            current: Mutex::new(Reply::Ok(current)),
            forecast: Mutex::new(Reply::Ok(forecast)),
            current_calls: AtomicUsize::new(0),
            forecast_calls: AtomicUsize::new(0),
            last_sample_count: Mutex::new(None),
        }
    }

    pub fn set_current(&self, reply: Reply<RawCurrentPayload>) {
        *self.current.lock().unwrap() = reply;
    }

    pub fn set_forecast(&self, reply: Reply<RawForecastPayload>) {
        *self.forecast.lock().unwrap() = reply;
    }

    pub fn current_calls(&self) -> usize {
        self.current_calls.load(Ordering::SeqCst)
    }

    pub fn forecast_calls(&self) -> usize {
        self.forecast_calls.load(Ordering::SeqCst)
    }

    pub fn last_sample_count(&self) -> Option<u32> {
        *self.last_sample_count.lock().unwrap()
    }
}

#[async_trait]
impl WeatherSource for MockWeatherSource {
    async fn current(
        &self,
        _location: &str,
        _units: Units,
    ) -> Result<RawCurrentPayload, UpstreamError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.current.lock().unwrap().clone();
        reply.produce()
    }

    async fn forecast(
        &self,
        _location: &str,
        _units: Units,
        samples: u32,
    ) -> Result<RawForecastPayload, UpstreamError> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_sample_count.lock().unwrap() = Some(samples);
        let reply = self.forecast.lock().unwrap().clone();
        reply.produce()
    }
}
