use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveDate, Timelike, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::{collections::BTreeMap, time::Duration};
use tracing::debug;

use crate::{
    Config, Error, Result,
    model::{Coordinates, ResolvedLocation, WeatherSnapshot},
};

use super::{WeatherGateway, clamp_days};

/// OpenWeatherMap geocoding (geo 1.0) and weather (data 2.5) client.
#[derive(Debug, Clone)]
pub struct OpenWeatherGateway {
    api_key: String,
    base_url: String,
    geo_url: String,
    max_forecast_days: u32,
    http: Client,
}

impl OpenWeatherGateway {
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.openweather_api_key().ok_or_else(|| {
            Error::config("No OpenWeatherMap API key configured (OPENWEATHER_API_KEY)")
        })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.openweather.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.to_owned(),
            base_url: config.openweather.base_url.trim_end_matches('/').to_owned(),
            geo_url: config.openweather.geo_url.trim_end_matches('/').to_owned(),
            max_forecast_days: config.max_forecast_days,
            http,
        })
    }

    /// Cheap request to check whether the key is accepted.
    /// `Ok(false)` means the service rejected the key.
    pub async fn verify_api_key(&self) -> Result<bool> {
        let res = self
            .http
            .get(format!("{}/weather", self.base_url))
            .query(&[("q", "London"), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| Error::gateway(format!("Failed to reach OpenWeather: {e}")))?;

        match res.status() {
            s if s.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(false),
            s => Err(Error::gateway(format!("OpenWeather key check failed with status {s}"))),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T> {
        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| Error::gateway(format!("Failed to send request to OpenWeather ({what}): {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| Error::gateway(format!("Failed to read OpenWeather {what} response body: {e}")))?;

        if !status.is_success() {
            return Err(Error::gateway(format!(
                "OpenWeather {what} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::gateway(format!("Failed to parse OpenWeather {what} JSON: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoResult {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: Option<f64>,
    humidity: Option<u8>,
    pressure: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
    deg: Option<f64>,
}

/// Shape shared by the current endpoint and each forecast list entry.
#[derive(Debug, Deserialize)]
struct OwEntry {
    dt: Option<i64>,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    /// Shift from UTC in seconds; only sent by the current endpoint.
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    /// Shift from UTC in seconds.
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: Option<OwCity>,
    #[serde(default)]
    list: Vec<OwEntry>,
}

impl OwEntry {
    fn observed_at(&self) -> DateTime<Utc> {
        self.dt.and_then(unix_to_utc).unwrap_or_else(Utc::now)
    }

    fn into_snapshot(self, utc_offset_secs: i32) -> WeatherSnapshot {
        let observed_at = self.observed_at();
        let description = self
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_else(|| "unknown".to_string());

        WeatherSnapshot {
            observed_at,
            temperature_c: self.main.temp,
            feels_like_c: self.main.feels_like,
            humidity_pct: self.main.humidity,
            pressure_hpa: self.main.pressure,
            description,
            wind_speed_mps: self.wind.as_ref().and_then(|w| w.speed),
            wind_deg: self.wind.as_ref().and_then(|w| w.deg),
            utc_offset_secs,
        }
    }
}

#[async_trait]
impl WeatherGateway for OpenWeatherGateway {
    async fn resolve_location(&self, name: &str) -> Result<ResolvedLocation> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::location_not_found(name));
        }

        let results: Vec<OwGeoResult> = self
            .get_json(
                format!("{}/direct", self.geo_url),
                &[("q", name.to_string()), ("limit", "1".to_string())],
                "geocoding",
            )
            .await?;

        let best = results
            .into_iter()
            .next()
            .ok_or_else(|| Error::location_not_found(name))?;

        Ok(ResolvedLocation {
            name: best.name,
            state: best.state,
            country: best.country,
            coordinates: Coordinates { lat: best.lat, lon: best.lon },
        })
    }

    async fn fetch_current(&self, coordinates: Coordinates) -> Result<WeatherSnapshot> {
        let entry: OwEntry = self
            .get_json(
                format!("{}/weather", self.base_url),
                &coordinate_query(coordinates),
                "current weather",
            )
            .await?;

        let utc_offset_secs = entry.timezone.unwrap_or(0);
        Ok(entry.into_snapshot(utc_offset_secs))
    }

    async fn fetch_forecast(
        &self,
        coordinates: Coordinates,
        days: u32,
    ) -> Result<Vec<WeatherSnapshot>> {
        let days = clamp_days(days, self.max_forecast_days);

        let parsed: OwForecastResponse = self
            .get_json(
                format!("{}/forecast", self.base_url),
                &coordinate_query(coordinates),
                "forecast",
            )
            .await?;

        let offset_secs = parsed.city.as_ref().map_or(0, |c| c.timezone);
        let offset = FixedOffset::east_opt(offset_secs)
            .ok_or_else(|| Error::gateway(format!("Invalid timezone offset {offset_secs}")))?;
        let today = Utc::now().with_timezone(&offset).date_naive();

        let snapshots = daily_snapshots(parsed.list, offset, today, days);
        debug!(requested = days, returned = snapshots.len(), "built daily forecast");

        if snapshots.is_empty() {
            return Err(Error::gateway("OpenWeather forecast response contained no data"));
        }
        Ok(snapshots)
    }

    fn max_forecast_days(&self) -> u32 {
        self.max_forecast_days
    }
}

fn coordinate_query(coordinates: Coordinates) -> [(&'static str, String); 3] {
    [
        ("lat", coordinates.lat.to_string()),
        ("lon", coordinates.lon.to_string()),
        ("units", "metric".to_string()),
    ]
}

/// Pick, for each of the `days` dates after `today`, the 3-hourly entry
/// closest to local noon.
fn daily_snapshots(
    entries: Vec<OwEntry>,
    offset: FixedOffset,
    today: NaiveDate,
    days: u32,
) -> Vec<WeatherSnapshot> {
    let last_day = today + ChronoDuration::days(i64::from(days));
    let mut by_day: BTreeMap<NaiveDate, OwEntry> = BTreeMap::new();

    for entry in entries {
        let local = entry.observed_at().with_timezone(&offset);
        let date = local.date_naive();
        if date <= today || date > last_day {
            continue;
        }

        let distance = noon_distance(local.hour(), local.minute());
        let closer = by_day.get(&date).is_none_or(|current| {
            let current = current.observed_at().with_timezone(&offset);
            distance < noon_distance(current.hour(), current.minute())
        });
        if closer {
            by_day.insert(date, entry);
        }
    }

    by_day
        .into_values()
        .map(|entry| entry.into_snapshot(offset.local_minus_utc()))
        .collect()
}

fn noon_distance(hour: u32, minute: u32) -> u32 {
    (hour * 60 + minute).abs_diff(12 * 60)
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
