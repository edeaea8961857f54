use serde::{Deserialize, Serialize};

/// Unit system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial]
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported units: metric, imperial."
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForecastRequest {
    /// Location setting code, e.g. a postal code.
    pub query: String,
    pub units: Units,
    pub days: u8,
}

/// Location as reported by the provider, before it has a row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    pub location_setting: String,
    pub city_name: String,
    pub coord_lat: f64,
    pub coord_long: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub location_setting: String,
    pub city_name: String,
    pub coord_lat: f64,
    pub coord_long: f64,
}

/// One forecast day parsed from a provider payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    /// Epoch seconds at the start of the (UTC) day.
    pub date: i64,
    pub weather_id: i64,
    pub short_desc: String,
    pub min_temp: f64,
    pub max_temp: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub degrees: f64,
    /// Unit system the provider reported temperatures and wind speed in.
    pub units: Units,
}

impl DayForecast {
    pub fn for_location(&self, location_id: i64) -> NewWeather {
        NewWeather { location_id, day: self.clone() }
    }
}

/// A forecast day bound to a location row, ready to be upserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWeather {
    pub location_id: i64,
    pub day: DayForecast,
}

/// Stored forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub id: i64,
    pub location_id: i64,
    #[serde(flatten)]
    pub day: DayForecast,
}

/// Parsed provider response: the place plus its forecast days.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPayload {
    pub location: NewLocation,
    pub days: Vec<DayForecast>,
}

/// Truncate an epoch timestamp to the start of its UTC day.
pub fn normalize_date(epoch_secs: i64) -> i64 {
    const DAY: i64 = 24 * 60 * 60;
    epoch_secs.div_euclid(DAY) * DAY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_as_str_roundtrip() {
        for units in Units::all() {
            let parsed = Units::try_from(units.as_str()).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn unknown_units_error() {
        let err = Units::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn normalize_date_truncates_to_day_start() {
        // 2014-05-17 20:00:00 UTC
        assert_eq!(normalize_date(1_400_356_800), 1_400_284_800);
        assert_eq!(normalize_date(1_400_284_800), 1_400_284_800);
        assert_eq!(normalize_date(-1), -86_400);
    }
}
