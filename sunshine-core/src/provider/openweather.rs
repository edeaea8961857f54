use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::FetchError,
    model::{DayForecast, ForecastPayload, ForecastRequest, NewLocation, Units, normalize_date},
};

use super::ForecastProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn daily_url(&self) -> String {
        format!("{}/data/2.5/forecast/daily", self.base_url)
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn daily_forecast(&self, request: &ForecastRequest) -> Result<ForecastPayload, FetchError> {
        let url = self.daily_url();
        let days = request.days.to_string();

        tracing::debug!(%url, query = %request.query, units = %request.units, days = request.days, "requesting daily forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", request.query.as_str()),
                ("mode", "json"),
                ("units", request.units.as_str()),
                ("cnt", days.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), body: truncate_body(&body) });
        }

        parse_daily_forecast(&body, &request.query, request.units)
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    coord: OwCoord,
}

#[derive(Debug, Deserialize)]
struct OwTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: i64,
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwDay {
    dt: i64,
    temp: OwTemp,
    pressure: f64,
    humidity: f64,
    speed: f64,
    #[serde(default)]
    deg: f64,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwDailyResponse {
    city: OwCity,
    list: Vec<OwDay>,
}

/// Parse an OpenWeatherMap daily forecast body requested in `units`.
///
/// The location row is keyed by `location_setting`, the query the user asked for,
/// not by anything the provider echoes back.
pub fn parse_daily_forecast(
    body: &str,
    location_setting: &str,
    units: Units,
) -> Result<ForecastPayload, FetchError> {
    let parsed: OwDailyResponse = serde_json::from_str(body)?;

    if parsed.list.is_empty() {
        return Err(FetchError::Parse("forecast response contained no days".to_string()));
    }

    let location = NewLocation {
        location_setting: location_setting.to_string(),
        city_name: parsed.city.name,
        coord_lat: parsed.city.coord.lat,
        coord_long: parsed.city.coord.lon,
    };

    let days = parsed
        .list
        .into_iter()
        .map(|day| {
            let (weather_id, short_desc) = day
                .weather
                .into_iter()
                .next()
                .map(|w| (w.id, w.main))
                .unwrap_or_else(|| (0, "Unknown".to_string()));

            DayForecast {
                date: normalize_date(day.dt),
                weather_id,
                short_desc,
                min_temp: day.temp.min,
                max_temp: day.temp.max,
                humidity: day.humidity,
                pressure: day.pressure,
                wind_speed: day.speed,
                degrees: day.deg,
                units,
            }
        })
        .collect();

    Ok(ForecastPayload { location, days })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    pub(crate) const MOUNTAIN_VIEW: &str = r#"{
        "city": {"id": 5375480, "name": "Mountain View", "coord": {"lon": -122.0838, "lat": 37.3861}, "country": "US"},
        "cod": "200",
        "cnt": 2,
        "list": [
            {"dt": 1400356800, "temp": {"day": 20.1, "min": 11.8, "max": 21.3, "night": 11.8, "eve": 18.5, "morn": 12.0},
             "pressure": 1002.6, "humidity": 68, "weather": [{"id": 800, "main": "Clear", "description": "sky is clear", "icon": "01d"}],
             "speed": 1.16, "deg": 320, "clouds": 0},
            {"dt": 1400443200, "temp": {"day": 19.5, "min": 10.2, "max": 20.7, "night": 10.2, "eve": 17.9, "morn": 11.4},
             "pressure": 1004.1, "humidity": 72, "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
             "speed": 2.4, "deg": 290, "clouds": 20, "rain": 0.5}
        ]
    }"#;

    fn request(query: &str) -> ForecastRequest {
        ForecastRequest { query: query.to_string(), units: Units::Metric, days: 7 }
    }

    #[test]
    fn parses_location_and_days() {
        let payload = parse_daily_forecast(MOUNTAIN_VIEW, "94043", Units::Metric).expect("payload should parse");

        assert_eq!(payload.location.location_setting, "94043");
        assert_eq!(payload.location.city_name, "Mountain View");
        assert_eq!(payload.location.coord_lat, 37.3861);
        assert_eq!(payload.location.coord_long, -122.0838);

        assert_eq!(payload.days.len(), 2);
        let first = &payload.days[0];
        assert_eq!(first.date, 1_400_284_800);
        assert_eq!(first.weather_id, 800);
        assert_eq!(first.short_desc, "Clear");
        assert_eq!(first.min_temp, 11.8);
        assert_eq!(first.max_temp, 21.3);
        assert_eq!(first.humidity, 68.0);
        assert_eq!(first.pressure, 1002.6);
        assert_eq!(first.wind_speed, 1.16);
        assert_eq!(first.degrees, 320.0);
        assert_eq!(first.units, Units::Metric);

        assert_eq!(payload.days[1].short_desc, "Rain");
        assert_eq!(payload.days[1].date, 1_400_371_200);
    }

    #[test]
    fn missing_condition_defaults_to_unknown() {
        let body = r#"{"city": {"name": "X", "coord": {"lat": 1.0, "lon": 2.0}},
            "list": [{"dt": 86400, "temp": {"min": 1.0, "max": 2.0}, "pressure": 1.0,
                      "humidity": 1, "speed": 1.0, "weather": []}]}"#;

        let payload = parse_daily_forecast(body, "x", Units::Metric).expect("payload should parse");
        assert_eq!(payload.days[0].weather_id, 0);
        assert_eq!(payload.days[0].short_desc, "Unknown");
        assert_eq!(payload.days[0].degrees, 0.0);
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        let err = parse_daily_forecast(r#"{"cod": "404", "message": "city not found"}"#, "x", Units::Metric).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));

        let err = parse_daily_forecast("not json", "x", Units::Metric).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn empty_day_list_is_a_parse_error() {
        let body = r#"{"city": {"name": "X", "coord": {"lat": 1.0, "lon": 2.0}}, "list": []}"#;
        let err = parse_daily_forecast(body, "x", Units::Metric).unwrap_err();
        assert!(err.to_string().contains("no days"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[tokio::test]
    async fn daily_forecast_sends_query_and_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast/daily"))
            .and(query_param("q", "94043"))
            .and(query_param("units", "imperial"))
            .and(query_param("cnt", "7"))
            .and(query_param("mode", "json"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOUNTAIN_VIEW))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), &server.uri());
        let mut req = request("94043");
        req.units = Units::Imperial;

        let payload = provider.daily_forecast(&req).await.expect("forecast");
        assert_eq!(payload.location.city_name, "Mountain View");
        assert_eq!(payload.days.len(), 2);
        assert!(payload.days.iter().all(|d| d.units == Units::Imperial));
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"cod":401,"message":"Invalid API key"}"#))
            .mount(&server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("BAD".into(), &format!("{}/", server.uri()));
        let err = provider.daily_forecast(&request("94043")).await.unwrap_err();

        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
