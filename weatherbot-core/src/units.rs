use chrono::{DateTime, Utc};

const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Celsius to `(celsius, fahrenheit, kelvin)`, rounded to two decimals.
pub fn convert_units(celsius: f64) -> (f64, f64, f64) {
    let round2 = |v: f64| (v * 100.0).round() / 100.0;
    (celsius, round2(celsius * 9.0 / 5.0 + 32.0), round2(celsius + 273.15))
}

/// 8-point compass name for a bearing in degrees. Any angle is accepted.
pub fn wind_direction(degrees: f64) -> &'static str {
    let normalized = degrees.rem_euclid(360.0);
    let sector = ((normalized + 22.5) / 45.0).floor() as usize % COMPASS_POINTS.len();
    COMPASS_POINTS[sector]
}

/// Unix seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn format_timestamp(unix_timestamp: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(unix_timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}
