//! End-to-end tests for the assistant with a recording gateway.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};

use weatherbot_core::composer::no_data_response;
use weatherbot_core::{
    Composer, Config, Coordinates, Error, InteractionLog, MemoryCache, QueryType,
    ResolvedLocation, WeatherAssistant, WeatherGateway, WeatherReport, WeatherSnapshot,
};

type Calls = Arc<Mutex<Vec<(String, QueryType, Option<u32>)>>>;

#[derive(Debug, Default)]
struct RecordingGateway {
    calls: Calls,
    fail: bool,
}

fn snapshot(temp: f64) -> WeatherSnapshot {
    WeatherSnapshot {
        observed_at: Utc::now(),
        temperature_c: temp,
        feels_like_c: Some(temp - 1.0),
        humidity_pct: Some(60),
        pressure_hpa: Some(1013),
        description: "partly cloudy".into(),
        wind_speed_mps: Some(5.2),
        wind_deg: Some(180.0),
        utc_offset_secs: 0,
    }
}

#[async_trait]
impl WeatherGateway for RecordingGateway {
    async fn resolve_location(&self, name: &str) -> weatherbot_core::Result<ResolvedLocation> {
        Ok(ResolvedLocation {
            name: name.to_string(),
            state: None,
            country: Some("US".into()),
            coordinates: Coordinates { lat: 25.76, lon: -80.19 },
        })
    }

    async fn fetch_current(
        &self,
        _coordinates: Coordinates,
    ) -> weatherbot_core::Result<WeatherSnapshot> {
        Ok(snapshot(28.0))
    }

    async fn fetch_forecast(
        &self,
        _coordinates: Coordinates,
        days: u32,
    ) -> weatherbot_core::Result<Vec<WeatherSnapshot>> {
        Ok((0..days.min(5)).map(|d| snapshot(20.0 + f64::from(d))).collect())
    }

    fn max_forecast_days(&self) -> u32 {
        5
    }

    async fn resolve_and_fetch(
        &self,
        location: &str,
        query_type: QueryType,
        horizon_days: Option<u32>,
    ) -> weatherbot_core::Result<WeatherReport> {
        self.calls
            .lock()
            .unwrap()
            .push((location.to_string(), query_type, horizon_days));

        if self.fail {
            return Err(Error::gateway("connection refused"));
        }

        match query_type {
            QueryType::Current => Ok(WeatherReport::Current {
                location: location.to_string(),
                snapshot: self.fetch_current(Coordinates { lat: 0.0, lon: 0.0 }).await?,
            }),
            QueryType::Forecast => Ok(WeatherReport::Forecast {
                location: location.to_string(),
                days: self
                    .fetch_forecast(Coordinates { lat: 0.0, lon: 0.0 }, horizon_days.unwrap_or(5))
                    .await?,
            }),
        }
    }
}

fn assistant(gateway: RecordingGateway) -> WeatherAssistant {
    WeatherAssistant::new(&Config::default(), Box::new(gateway), Composer::Template)
}

#[tokio::test]
async fn current_query_calls_gateway_with_location() {
    let calls = Calls::default();
    let bot = assistant(RecordingGateway { calls: Arc::clone(&calls), fail: false });

    let text = bot
        .process(Some("What's the weather in Miami?"))
        .await
        .expect("answer");

    assert!(!text.is_empty());
    assert!(text.contains("Miami"));
    assert!(text.contains("28.0°C"));
    assert_eq!(
        *calls.lock().unwrap(),
        vec![("Miami".to_string(), QueryType::Current, None)]
    );
}

#[tokio::test]
async fn forecast_query_passes_horizon() {
    let calls = Calls::default();
    let bot = assistant(RecordingGateway { calls: Arc::clone(&calls), fail: false });

    let text = bot
        .process(Some("Weather forecast for Austin tomorrow"))
        .await
        .expect("answer");

    assert!(text.contains("Austin"));
    assert_eq!(
        *calls.lock().unwrap(),
        vec![("Austin".to_string(), QueryType::Forecast, Some(1))]
    );
}

#[tokio::test]
async fn missing_location_never_calls_gateway() {
    let calls = Calls::default();
    let bot = assistant(RecordingGateway { calls: Arc::clone(&calls), fail: false });

    let text = bot.process(Some("What's the weather?")).await.expect("answer");

    let lower = text.to_lowercase();
    assert!(lower.contains("location") || lower.contains("specify"));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_input_is_an_error() {
    let bot = assistant(RecordingGateway::default());

    let err = bot.process(None).await.unwrap_err();
    assert!(matches!(err, Error::InputMissing));
}

#[tokio::test]
async fn gateway_failure_becomes_apology() {
    let bot = assistant(RecordingGateway { calls: Calls::default(), fail: true });

    let text = bot
        .process(Some("How hot is it in Phoenix?"))
        .await
        .expect("answer");

    assert!(text.starts_with("Sorry"));
    assert!(!text.contains("connection refused"));
    assert_eq!(text, no_data_response(&Error::gateway("connection refused")));
}

#[tokio::test]
async fn purpose_phrase_does_not_replace_location() {
    let calls = Calls::default();
    let bot = assistant(RecordingGateway { calls: Arc::clone(&calls), fail: false });

    bot.process(Some("What's the weather in Boston for a picnic?"))
        .await
        .expect("answer");

    assert_eq!(
        *calls.lock().unwrap(),
        vec![("Boston".to_string(), QueryType::Current, None)]
    );
}

#[tokio::test]
async fn huge_cache_minutes_do_not_panic() {
    let calls = Calls::default();
    let mut config = Config::default();
    config.cache_minutes = u64::MAX;
    let bot = WeatherAssistant::new(
        &config,
        Box::new(RecordingGateway { calls: Arc::clone(&calls), fail: false }),
        Composer::Template,
    )
    .with_cache(Arc::new(MemoryCache::<WeatherReport>::new()));

    let text = bot.process(Some("weather in Boston")).await.expect("answer");

    assert!(text.contains("Boston"));
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn cached_report_skips_second_fetch() {
    let calls = Calls::default();
    let bot = assistant(RecordingGateway { calls: Arc::clone(&calls), fail: false })
        .with_cache(Arc::new(MemoryCache::<WeatherReport>::new()));

    let first = bot.process(Some("weather in Boston")).await.expect("answer");
    let second = bot.process(Some("Boston weather")).await.expect("answer");

    assert_eq!(first, second);
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn expired_cache_entries_are_refetched() {
    let calls = Calls::default();
    let mut config = Config::default();
    config.cache_minutes = 0;
    let bot = WeatherAssistant::new(
        &config,
        Box::new(RecordingGateway { calls: Arc::clone(&calls), fail: false }),
        Composer::Template,
    )
    .with_cache(Arc::new(MemoryCache::<WeatherReport>::new()));

    bot.process(Some("weather in Boston")).await.expect("answer");
    bot.process(Some("weather in Boston")).await.expect("answer");

    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn interactions_are_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let log = InteractionLog::new(dir.path().join("history.jsonl"));
    let bot = assistant(RecordingGateway::default()).with_history(log.clone());

    bot.process(Some("weather in Denver")).await.expect("answer");
    bot.process(Some("What's the weather?")).await.expect("answer");

    let recent = log.recent(10).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].query, "weather in Denver");
    assert!(recent[0].response.contains("Denver"));
    assert!(recent[1].response.to_lowercase().contains("location"));
}
