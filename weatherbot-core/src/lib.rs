//! Core library for the `weatherbot` assistant.
//!
//! This crate defines:
//! - Query interpretation (location, current vs. forecast, time horizon)
//! - Abstraction over weather providers, with an OpenWeatherMap implementation
//! - Response composition via Gemini with a template fallback
//! - Configuration, caching and interaction history
//!
//! It is used by `weatherbot-cli`, but can also be reused by other binaries or services.

pub mod assistant;
pub mod cache;
pub mod composer;
pub mod config;
pub mod error;
pub mod history;
pub mod interpret;
pub mod model;
pub mod provider;
pub mod text;
pub mod units;

pub use assistant::WeatherAssistant;
pub use cache::{Cache, MemoryCache};
pub use composer::{Composer, GeminiClient, LanguageModel};
pub use config::Config;
pub use error::Error;
pub use history::{Interaction, InteractionLog};
pub use interpret::{Intent, QueryType, classify_query_type, extract_location, parse_time_horizon};
pub use model::{Coordinates, ResolvedLocation, WeatherReport, WeatherSnapshot};
pub use provider::{OpenWeatherGateway, WeatherGateway};
pub use text::normalize;

pub type Result<T> = std::result::Result<T, Error>;
