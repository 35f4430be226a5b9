//! Wires interpretation, the weather gateway and the composer together.

use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

use crate::{
    Config, Error, Result,
    cache::{Cache, MemoryCache},
    composer::{Composer, no_data_response},
    history::InteractionLog,
    interpret::{Intent, interpret},
    model::WeatherReport,
    provider::{OpenWeatherGateway, WeatherGateway},
};

/// Answers one weather question at a time.
#[derive(Debug)]
pub struct WeatherAssistant {
    gateway: Box<dyn WeatherGateway>,
    composer: Composer,
    cache: Option<Arc<dyn Cache<WeatherReport>>>,
    cache_ttl: Duration,
    history: Option<InteractionLog>,
}

impl WeatherAssistant {
    pub fn new(config: &Config, gateway: Box<dyn WeatherGateway>, composer: Composer) -> Self {
        Self {
            gateway,
            composer,
            cache: None,
            cache_ttl: Duration::from_secs(config.cache_minutes.saturating_mul(60)),
            history: None,
        }
    }

    /// OpenWeatherMap gateway, composer chosen from the config, an in-memory
    /// cache and the interaction log at its configured path.
    pub fn from_config(config: &Config) -> Result<Self> {
        let gateway = OpenWeatherGateway::from_config(config)?;
        let composer = Composer::from_config(config)?;

        let mut assistant = Self::new(config, Box::new(gateway), composer)
            .with_cache(Arc::new(MemoryCache::<WeatherReport>::new()));

        match config.history_file_path() {
            Ok(path) => assistant = assistant.with_history(InteractionLog::new(path)),
            Err(e) => warn!(error = %e, "interaction history disabled"),
        }

        Ok(assistant)
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache<WeatherReport>>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_history(mut self, history: InteractionLog) -> Self {
        self.history = Some(history);
        self
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Answer a raw user query.
    ///
    /// Only a missing query is an error. A query without a location gets a
    /// request to name one; gateway failures get an apology.
    pub async fn process(&self, raw_query: Option<&str>) -> Result<String> {
        let Some(raw_query) = raw_query else {
            return Err(Error::InputMissing);
        };
        let intent = interpret(Some(raw_query))?;

        let response = match self.answer(&intent, raw_query).await {
            Ok(text) => text,
            Err(e @ (Error::Gateway { .. } | Error::LocationNotFound { .. })) => {
                warn!(error = %e, query = raw_query, "could not fetch weather");
                no_data_response(&e)
            }
            Err(e) => {
                debug!(error = %e, query = raw_query, "no answer for query");
                e.user_message()
            }
        };

        if let Some(history) = &self.history {
            if let Err(e) = history.record(raw_query, &response, Utc::now()) {
                warn!(error = %e, "failed to record interaction");
            }
        }

        Ok(response)
    }

    async fn answer(&self, intent: &Intent, raw_query: &str) -> Result<String> {
        let location = intent.location.as_deref().ok_or(Error::NoLocationFound)?;
        let report = self.report_for(location, intent).await?;

        Ok(self.composer.compose(&report, raw_query).await)
    }

    async fn report_for(&self, location: &str, intent: &Intent) -> Result<WeatherReport> {
        let key = cache_key(location, intent);

        if let Some(report) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            return Ok(report);
        }

        info!(
            location,
            query_type = %intent.query_type,
            horizon_days = ?intent.horizon_days,
            "fetching weather"
        );
        let report = self
            .gateway
            .resolve_and_fetch(location, intent.query_type, intent.horizon_days)
            .await?;

        if let Some(cache) = &self.cache {
            cache.put(&key, report.clone(), self.cache_ttl);
        }
        Ok(report)
    }
}

fn cache_key(location: &str, intent: &Intent) -> String {
    let horizon = intent.horizon_days.map_or_else(|| "-".to_string(), |d| d.to_string());
    format!("{}|{}|{horizon}", location.to_lowercase(), intent.query_type)
}
