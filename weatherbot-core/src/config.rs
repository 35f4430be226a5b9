use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

pub const OPENWEATHER_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

/// OpenWeatherMap endpoints and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenWeatherConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_openweather_base_url")]
    pub base_url: String,
    #[serde(default = "default_openweather_geo_url")]
    pub geo_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Google Gemini settings. Without a key answers come from templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// cache_minutes = 10
///
/// [openweather]
/// api_key = "..."
///
/// [gemini]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_cache_minutes")]
    pub cache_minutes: u64,
    #[serde(default = "default_max_forecast_days")]
    pub max_forecast_days: u32,
    /// Where interactions are appended; defaults to the platform data dir.
    #[serde(default)]
    pub history_file: Option<PathBuf>,
    #[serde(default)]
    pub openweather: OpenWeatherConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

fn default_openweather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_openweather_geo_url() -> String {
    "https://api.openweathermap.org/geo/1.0".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_cache_minutes() -> u64 {
    10
}

fn default_max_forecast_days() -> u32 {
    5
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openweather_base_url(),
            geo_url: default_openweather_geo_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_minutes: default_cache_minutes(),
            max_forecast_days: default_max_forecast_days(),
            history_file: None,
            openweather: OpenWeatherConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk (or defaults on first run), then apply
    /// `OPENWEATHER_API_KEY` / `GEMINI_API_KEY` from the environment.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_env_overrides(|name| env::var(name).ok());
        Ok(cfg)
    }

    /// Load only the config file, without environment overrides.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Override keys from variables returned by `lookup`; blank values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_blank(OPENWEATHER_KEY_ENV) {
            self.openweather.api_key = Some(key);
        }
        if let Some(key) = non_blank(GEMINI_KEY_ENV) {
            self.gemini.api_key = Some(key);
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weatherbot", "weatherbot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path of the interaction history file.
    pub fn history_file_path(&self) -> Result<PathBuf> {
        match &self.history_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("history.jsonl")),
        }
    }

    pub fn openweather_api_key(&self) -> Option<&str> {
        non_empty(self.openweather.api_key.as_deref())
    }

    pub fn gemini_api_key(&self) -> Option<&str> {
        non_empty(self.gemini.api_key.as_deref())
    }

    pub fn set_openweather_api_key(&mut self, api_key: String) {
        self.openweather.api_key = Some(api_key);
    }

    pub fn set_gemini_api_key(&mut self, api_key: String) {
        self.gemini.api_key = Some(api_key);
    }

    /// Checks what is needed to answer questions at all.
    pub fn validate(&self) -> Result<()> {
        if self.openweather_api_key().is_none() {
            return Err(anyhow!(
                "{OPENWEATHER_KEY_ENV} not found.\n\
                 Hint: export {OPENWEATHER_KEY_ENV} or run `weatherbot configure`."
            ));
        }
        if self.max_forecast_days == 0 {
            return Err(anyhow!("max_forecast_days must be at least 1"));
        }
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
