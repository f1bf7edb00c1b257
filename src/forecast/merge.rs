use super::types::*;
use crate::utils::{capitalize_first, mean, round_to_decimals};
use chrono::{DateTime, NaiveDate, TimeZone};
use std::collections::{BTreeMap, HashMap};

const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Turns a cached upstream response into the display shape.
///
/// `today` and `tz` decide the calendar day of every forecast sample; today's
/// samples are skipped because the current conditions already cover it.
pub fn normalize_weather<Tz: TimeZone>(
    raw: &CombinedRawResponse,
    forecast_days: u32,
    today: NaiveDate,
    tz: &Tz,
) -> NormalizedWeather {
    let location_name = raw
        .current
        .name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(UNKNOWN_LOCATION)
        .to_string();

    let forecast = match raw.forecast.payload() {
        Some(payload) if forecast_days > 1 => {
            aggregate_days(&payload.list, forecast_days - 1, today, tz)
        }
        _ => Vec::new(),
    };

    NormalizedWeather {
        location_name,
        country: raw.current.sys.country.clone(),
        current: current_conditions(&raw.current),
        forecast,
    }
}

fn current_conditions(current: &RawCurrentPayload) -> CurrentConditions {
    let tag = current.weather.first();

    CurrentConditions {
        temp: current.main.temp.round() as i64,
        feels_like: current.main.feels_like.round() as i64,
        description: capitalize_first(tag.map(|t| t.description.as_str()).unwrap_or_default()),
        icon_code: tag.map(|t| t.icon.clone()).unwrap_or_default(),
        humidity: current.main.humidity,
        wind_speed: round_to_decimals(current.wind.speed, 1),
        pressure: current.main.pressure,
        visibility: current
            .visibility
            .map(|meters| round_to_decimals(meters / 1000.0, 1)),
        sunrise: current.sys.sunrise,
        sunset: current.sys.sunset,
    }
}

#[derive(Default)]
struct DayBucket<'a> {
    first_dt: i64,
    temps: Vec<f64>,
    humidity: Vec<f64>,
    wind_speed: Vec<f64>,
    pop: Vec<f64>,
    descriptions: Vec<&'a str>,
    icons: Vec<&'a str>,
}

fn aggregate_days<Tz: TimeZone>(
    samples: &[ForecastSample],
    max_days: u32,
    today: NaiveDate,
    tz: &Tz,
) -> Vec<DailyForecast> {
    let mut days: BTreeMap<NaiveDate, DayBucket<'_>> = BTreeMap::new();

    for sample in samples {
        let Some(date) = local_date(sample.dt, tz) else {
            tracing::warn!(dt = sample.dt, "skipping forecast sample with invalid timestamp");
            continue;
        };
        if date == today {
            continue;
        }

        let bucket = days.entry(date).or_insert_with(|| DayBucket {
            first_dt: sample.dt,
            ..Default::default()
        });
        let tag = sample.weather.first();

        bucket.first_dt = bucket.first_dt.min(sample.dt);
        bucket.temps.push(sample.main.temp);
        bucket.humidity.push(sample.main.humidity);
        bucket.wind_speed.push(sample.wind.speed);
        bucket.pop.push(sample.pop.unwrap_or(0.0));
        bucket
            .descriptions
            .push(tag.map(|t| t.description.as_str()).unwrap_or_default());
        bucket.icons.push(tag.map(|t| t.icon.as_str()).unwrap_or_default());
    }

    days.into_values()
        .take(max_days as usize)
        .map(summarize_day)
        .collect()
}

fn summarize_day(bucket: DayBucket<'_>) -> DailyForecast {
    let temp_high = bucket.temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let temp_low = bucket.temps.iter().copied().fold(f64::INFINITY, f64::min);
    let max_pop = bucket.pop.iter().copied().fold(0.0, f64::max);

    DailyForecast {
        date: bucket.first_dt,
        temp_high: temp_high.round() as i64,
        temp_low: temp_low.round() as i64,
        description: capitalize_first(most_frequent(&bucket.descriptions)),
        icon_code: most_frequent(&bucket.icons).to_string(),
        humidity: mean(&bucket.humidity).unwrap_or(0.0).round().clamp(0.0, 100.0) as u8,
        wind_speed: round_to_decimals(mean(&bucket.wind_speed).unwrap_or(0.0), 1),
        precipitation_probability: (max_pop * 100.0).round().clamp(0.0, 100.0) as u8,
    }
}

/// Mode of `values`; on a tie the value seen first wins.
fn most_frequent<'a>(values: &[&'a str]) -> &'a str {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(*value).or_insert(0) += 1;
    }

    let mut best = "";
    let mut best_count = 0;
    for value in values {
        let count = counts[value];
        if count > best_count {
            best = *value;
            best_count = count;
        }
    }
    best
}

fn local_date<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.with_timezone(tz).date_naive())
}
