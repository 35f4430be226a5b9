use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A place name resolved by the geocoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    /// Canonical name as reported by the geocoder, e.g. "New York".
    pub name: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub coordinates: Coordinates,
}

impl ResolvedLocation {
    /// Name with state and country appended when known.
    pub fn display_name(&self) -> String {
        [Some(self.name.as_str()), self.state.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Weather conditions at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub observed_at: DateTime<Utc>,
    pub temperature_c: f64,
    pub feels_like_c: Option<f64>,
    pub humidity_pct: Option<u8>,
    pub pressure_hpa: Option<u32>,
    pub description: String,
    pub wind_speed_mps: Option<f64>,
    pub wind_deg: Option<f64>,
    /// Offset of the place's local time from UTC, in seconds.
    #[serde(default)]
    pub utc_offset_secs: i32,
}

impl WeatherSnapshot {
    /// `observed_at` on the place's own clock.
    pub fn local_time(&self) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.utc_offset_secs).unwrap_or_else(|| Utc.fix());
        self.observed_at.with_timezone(&offset)
    }
}

/// What the gateway hands back for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WeatherReport {
    Current {
        location: String,
        snapshot: WeatherSnapshot,
    },
    Forecast {
        location: String,
        days: Vec<WeatherSnapshot>,
    },
}

impl WeatherReport {
    pub fn location(&self) -> &str {
        match self {
            WeatherReport::Current { location, .. } | WeatherReport::Forecast { location, .. } => {
                location
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_skips_missing_parts() {
        let loc = ResolvedLocation {
            name: "Dallas".into(),
            state: Some("Texas".into()),
            country: Some("US".into()),
            coordinates: Coordinates { lat: 32.78, lon: -96.8 },
        };
        assert_eq!(loc.display_name(), "Dallas, Texas, US");

        let loc = ResolvedLocation { state: None, ..loc };
        assert_eq!(loc.display_name(), "Dallas, US");
    }

    #[test]
    fn local_time_applies_offset() {
        use chrono::TimeZone;

        let snap = WeatherSnapshot {
            observed_at: Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap(),
            temperature_c: 20.0,
            feels_like_c: None,
            humidity_pct: None,
            pressure_hpa: None,
            description: "clear sky".into(),
            wind_speed_mps: None,
            wind_deg: None,
            utc_offset_secs: 13 * 3600,
        };
        assert_eq!(snap.local_time().format("%Y-%m-%d %H:%M").to_string(), "2024-01-02 12:00");

        let snap = WeatherSnapshot { utc_offset_secs: 0, ..snap };
        assert_eq!(snap.local_time().format("%Y-%m-%d").to_string(), "2024-01-01");
    }
}
