//! Turns a [`WeatherReport`] into the text shown to the user.
//!
//! Answers come from a generative model when one is configured and reachable,
//! otherwise from deterministic templates. Composition itself never fails.

use async_trait::async_trait;
use std::fmt::Debug;
use tracing::{debug, warn};

use crate::{Config, Result, model::WeatherReport, units::format_timestamp};

pub mod gemini;
pub mod template;

pub use gemini::GeminiClient;
pub use template::{fallback_response, no_data_response};

/// A text generation backend.
#[async_trait]
pub trait LanguageModel: Send + Sync + Debug {
    /// Whether the backend is configured well enough to be called.
    fn is_available(&self) -> bool;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// How answers are produced.
#[derive(Debug)]
pub enum Composer {
    Generative(Box<dyn LanguageModel>),
    Template,
}

impl Composer {
    /// Generative when a Gemini key is configured, templates otherwise.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(match GeminiClient::from_config(config)? {
            Some(client) => Composer::Generative(Box::new(client)),
            None => Composer::Template,
        })
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Composer::Generative(model) if model.is_available() => "generative",
            _ => "template",
        }
    }

    /// Answer `original_query` from `report`.
    pub async fn compose(&self, report: &WeatherReport, original_query: &str) -> String {
        let model = match self {
            Composer::Generative(model) if model.is_available() => model,
            _ => return fallback_response(report),
        };

        match model.generate(&build_prompt(report, original_query)).await {
            Ok(text) if !text.trim().is_empty() => {
                debug!(chars = text.len(), "generated response");
                text.trim().to_string()
            }
            Ok(_) => {
                warn!("language model returned an empty response, using template");
                fallback_response(report)
            }
            Err(e) => {
                warn!(error = %e, "language model failed, using template");
                fallback_response(report)
            }
        }
    }
}

fn build_prompt(report: &WeatherReport, original_query: &str) -> String {
    let data = serde_json::to_string_pretty(report).unwrap_or_else(|_| fallback_response(report));
    let observed = match report {
        WeatherReport::Current { snapshot, .. } => Some(snapshot),
        WeatherReport::Forecast { days, .. } => days.first(),
    }
    .and_then(|snap| format_timestamp(snap.observed_at.timestamp()))
    .unwrap_or_else(|| "unknown".to_string());

    format!(
        "You are a friendly weather assistant. Answer the user's question using only the \
         weather data below. Keep it to two or three sentences, mention the location, and give \
         temperatures in both Celsius and Fahrenheit.\n\n\
         Question: {original_query}\n\n\
         Data observed at {observed} UTC.\n\
         Weather data (JSON):\n{data}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, model::WeatherSnapshot};
    use chrono::{TimeZone, Utc};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug)]
    struct FakeModel {
        available: bool,
        reply: std::result::Result<&'static str, &'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeModel {
        fn new(available: bool, reply: std::result::Result<&'static str, &'static str>) -> Self {
            Self { available, reply, calls: Arc::new(AtomicUsize::new(0)) }
        }
    }

    #[async_trait]
    impl LanguageModel for FakeModel {
        fn is_available(&self) -> bool {
            self.available
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(prompt.contains("Boston"));
            self.reply.map(str::to_string).map_err(Error::composer)
        }
    }

    fn boston() -> WeatherReport {
        WeatherReport::Current {
            location: "Boston".into(),
            snapshot: WeatherSnapshot {
                observed_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
                temperature_c: 22.0,
                feels_like_c: None,
                humidity_pct: Some(40),
                pressure_hpa: None,
                description: "sunny".into(),
                wind_speed_mps: None,
                wind_deg: None,
                utc_offset_secs: 0,
            },
        }
    }

    #[tokio::test]
    async fn generative_answer_is_used() {
        let composer = Composer::Generative(Box::new(FakeModel::new(
            true,
            Ok("  Sunny and 22°C in Boston.  "),
        )));

        let text = composer.compose(&boston(), "How's the weather in Boston?").await;
        assert_eq!(text, "Sunny and 22°C in Boston.");
        assert_eq!(composer.mode(), "generative");
    }

    #[tokio::test]
    async fn failing_model_falls_back_to_template() {
        let composer =
            Composer::Generative(Box::new(FakeModel::new(true, Err("quota exceeded"))));

        let text = composer.compose(&boston(), "weather in Boston").await;
        assert_eq!(text, fallback_response(&boston()));
    }

    #[tokio::test]
    async fn blank_model_output_falls_back_to_template() {
        let composer = Composer::Generative(Box::new(FakeModel::new(true, Ok("   "))));

        let text = composer.compose(&boston(), "weather in Boston").await;
        assert_eq!(text, fallback_response(&boston()));
    }

    #[tokio::test]
    async fn unavailable_model_is_never_called() {
        let model = FakeModel::new(false, Ok("should not be used"));
        let calls = Arc::clone(&model.calls);
        let composer = Composer::Generative(Box::new(model));

        let text = composer.compose(&boston(), "weather in Boston").await;
        assert_eq!(text, fallback_response(&boston()));
        assert_eq!(composer.mode(), "template");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn template_mode_without_gemini_key() {
        let composer = Composer::from_config(&Config::default()).expect("composer");
        assert!(matches!(composer, Composer::Template));
    }

    #[test]
    fn prompt_carries_query_and_data() {
        let prompt = build_prompt(&boston(), "Is it warm in Boston?");
        assert!(prompt.contains("Is it warm in Boston?"));
        assert!(prompt.contains("\"temperature_c\": 22.0"));
        assert!(prompt.contains("\"kind\": \"current\""));
        assert!(prompt.contains("Data observed at 2024-01-01 12:00:00 UTC."));
    }
}
