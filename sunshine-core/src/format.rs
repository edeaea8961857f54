//! Text used by list and detail views.

use chrono::DateTime;

use crate::model::{Units, Weather};

pub const SHARE_HASHTAG: &str = "#SunshineApp";

/// `"Sat May 17"` for an epoch-seconds date.
pub fn readable_date(epoch_secs: i64) -> String {
    DateTime::from_timestamp(epoch_secs, 0)
        .map(|dt| dt.format("%a %b %-d").to_string())
        .unwrap_or_else(|| epoch_secs.to_string())
}

/// Rounded `"high/low"`.
pub fn format_high_lows(high: f64, low: f64) -> String {
    format!("{}/{}", high.round() as i64, low.round() as i64)
}

/// One list entry, e.g. `"Sat May 17 - Clear - 21/12"`.
pub fn forecast_line(weather: &Weather) -> String {
    let day = &weather.day;
    format!(
        "{} - {} - {}",
        readable_date(day.date),
        day.short_desc,
        format_high_lows(day.max_temp, day.min_temp)
    )
}

/// Compass point for a wind direction in meteorological degrees.
pub fn wind_direction(degrees: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let idx = (degrees.rem_euclid(360.0) / 45.0).round() as usize % POINTS.len();
    POINTS[idx]
}

/// `"1.2 m/s NW"`; the provider reports wind in m/s for metric and mph for imperial.
pub fn format_wind(speed: f64, degrees: f64, units: Units) -> String {
    let unit = match units {
        Units::Metric => "m/s",
        Units::Imperial => "mph",
    };
    format!("{speed:.1} {unit} {}", wind_direction(degrees))
}

pub fn share_text(forecast: &str) -> String {
    format!("{forecast} {SHARE_HASHTAG}")
}

/// Geo URI that map applications understand for a free-form location query.
pub fn map_uri(location: &str) -> String {
    format!("geo:0,0?q={}", location.replace(' ', "+"))
}
