use async_trait::async_trait;
use std::fmt::Debug;
use tracing::debug;

use crate::{
    Result,
    interpret::QueryType,
    model::{Coordinates, ResolvedLocation, WeatherReport, WeatherSnapshot},
};

pub mod openweather;

pub use openweather::OpenWeatherGateway;

/// Geocoding plus current/forecast lookups against a weather provider.
#[async_trait]
pub trait WeatherGateway: Send + Sync + Debug {
    /// Resolve a free-form place name. Fails with `Error::LocationNotFound`
    /// when the provider knows no such place.
    async fn resolve_location(&self, name: &str) -> Result<ResolvedLocation>;

    async fn fetch_current(&self, coordinates: Coordinates) -> Result<WeatherSnapshot>;

    /// One snapshot per day ahead. `days` is clamped to the provider maximum.
    async fn fetch_forecast(
        &self,
        coordinates: Coordinates,
        days: u32,
    ) -> Result<Vec<WeatherSnapshot>>;

    /// Largest forecast horizon the provider supports.
    fn max_forecast_days(&self) -> u32;

    async fn resolve_and_fetch(
        &self,
        location: &str,
        query_type: QueryType,
        horizon_days: Option<u32>,
    ) -> Result<WeatherReport> {
        let resolved = self.resolve_location(location).await?;
        debug!(
            query = location,
            resolved = %resolved.display_name(),
            lat = resolved.coordinates.lat,
            lon = resolved.coordinates.lon,
            "resolved location"
        );

        match query_type {
            QueryType::Current => {
                let snapshot = self.fetch_current(resolved.coordinates).await?;
                Ok(WeatherReport::Current { location: resolved.name, snapshot })
            }
            QueryType::Forecast => {
                let days = horizon_days.unwrap_or_else(|| self.max_forecast_days());
                let days = self.fetch_forecast(resolved.coordinates, days).await?;
                Ok(WeatherReport::Forecast { location: resolved.name, days })
            }
        }
    }
}

/// Clamp a requested horizon into `1..=max`.
pub fn clamp_days(days: u32, max: u32) -> u32 {
    days.clamp(1, max.max(1))
}
