use std::fmt::Write;

use crate::{
    Error,
    model::{WeatherReport, WeatherSnapshot},
    units::{convert_units, wind_direction},
};

/// Deterministic answer built only from the report.
pub fn fallback_response(report: &WeatherReport) -> String {
    match report {
        WeatherReport::Current { location, snapshot } => current_text(location, snapshot),
        WeatherReport::Forecast { location, days } => forecast_text(location, days),
    }
}

/// Apology used when the weather for a question could not be fetched.
pub fn no_data_response(error: &Error) -> String {
    match error {
        Error::LocationNotFound { name } => format!(
            "Sorry, I couldn't find a place called \"{name}\". \
             Please check the spelling or add a country."
        ),
        _ => "Sorry, I couldn't reach the weather service right now. \
              Please try again in a moment."
            .to_string(),
    }
}

fn current_text(location: &str, snap: &WeatherSnapshot) -> String {
    let mut out = format!(
        "Right now in {location} it's {}, {}.",
        snap.description,
        temperature(snap.temperature_c)
    );

    if let Some(feels_like) = snap.feels_like_c {
        let _ = write!(out, " It feels like {feels_like:.1}°C.");
    }
    if let Some(humidity) = snap.humidity_pct {
        let _ = write!(out, " Humidity is {humidity}%.");
    }
    if let Some(wind) = wind_text(snap) {
        let _ = write!(out, " {wind}.");
    }

    out
}

fn forecast_text(location: &str, days: &[WeatherSnapshot]) -> String {
    if days.is_empty() {
        return format!("I don't have any forecast data for {location} right now.");
    }

    let mut out = format!("Here's the forecast for {location}:");
    for day in days {
        let _ = write!(
            out,
            "\n- {}: {}, {}",
            day.local_time().format("%a %d %b"),
            day.description,
            temperature(day.temperature_c)
        );
        if let Some(humidity) = day.humidity_pct {
            let _ = write!(out, ", humidity {humidity}%");
        }
    }

    out
}

fn temperature(celsius: f64) -> String {
    let (c, f, _) = convert_units(celsius);
    format!("{c:.1}°C ({f:.1}°F)")
}

fn wind_text(snap: &WeatherSnapshot) -> Option<String> {
    let speed = snap.wind_speed_mps?;
    Some(match snap.wind_deg {
        Some(deg) => format!("Wind {speed:.1} m/s from the {}", wind_direction(deg)),
        None => format!("Wind {speed:.1} m/s"),
    })
}
