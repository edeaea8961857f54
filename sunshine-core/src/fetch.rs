//! Background fetch: ask the provider for a forecast and upsert it into the local store.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::{
    data::{WeatherDbHelper, store},
    error::{FetchError, StoreError},
    model::{ForecastPayload, ForecastRequest, Units},
    provider::ForecastProvider,
};

#[derive(Debug, Clone)]
pub struct FetchWeatherTask {
    provider: Arc<dyn ForecastProvider>,
    db: WeatherDbHelper,
    days: u8,
}

impl FetchWeatherTask {
    pub fn new(provider: Arc<dyn ForecastProvider>, db: WeatherDbHelper) -> Self {
        Self { provider, db, days: crate::config::DEFAULT_FORECAST_DAYS }
    }

    pub fn with_days(mut self, days: u8) -> Self {
        self.days = days;
        self
    }

    /// Fetch and store the forecast for `query`, returning the number of days written.
    pub async fn try_run(&self, query: &str, units: Units) -> Result<usize, FetchError> {
        let request = ForecastRequest { query: query.to_string(), units, days: self.days };
        let payload = self.provider.daily_forecast(&request).await?;

        let db = self.db.clone();
        let written = tokio::task::spawn_blocking(move || persist(&db, &payload)).await??;

        tracing::info!(query, days = written, "forecast stored");
        Ok(written)
    }

    /// Like [`FetchWeatherTask::try_run`], but any failure is logged and reported as zero days.
    pub async fn run(&self, query: &str, units: Units) -> usize {
        match self.try_run(query, units).await {
            Ok(written) => written,
            Err(err) => {
                tracing::warn!(query, error = %err, "forecast fetch failed, nothing stored");
                0
            }
        }
    }

    /// Run the fetch on its own task. Await the handle to get the number of days written.
    pub fn spawn(self, query: String, units: Units) -> JoinHandle<usize> {
        tokio::spawn(async move { self.run(&query, units).await })
    }
}

fn persist(db: &WeatherDbHelper, payload: &ForecastPayload) -> Result<usize, StoreError> {
    let mut conn = db.writable()?;
    store::store_forecast(&mut conn, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{OpenWeatherProvider, openweather::tests::MOUNTAIN_VIEW};
    use tempfile::TempDir;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn server_with(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast/daily"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    fn task(server: &MockServer, db: WeatherDbHelper) -> FetchWeatherTask {
        let provider = OpenWeatherProvider::with_base_url("KEY".into(), &server.uri());
        FetchWeatherTask::new(Arc::new(provider), db)
    }

    fn stored_days(db: &WeatherDbHelper, setting: &str) -> usize {
        let conn = db.writable().expect("store should open");
        store::weather_for_location(&conn, setting, None).expect("query").len()
    }

    #[tokio::test]
    async fn successful_fetch_stores_location_and_days() {
        let dir = TempDir::new().expect("tempdir");
        let db = WeatherDbHelper::in_dir(dir.path());
        let server = server_with(200, MOUNTAIN_VIEW).await;

        let written = task(&server, db.clone()).run("94043", Units::Metric).await;
        assert_eq!(written, 2);

        let conn = db.writable().expect("store should open");
        let loc = store::find_location(&conn, "94043").expect("query").expect("location stored");
        assert_eq!(loc.city_name, "Mountain View");
        assert_eq!(stored_days(&db, "94043"), 2);
    }

    #[tokio::test]
    async fn refetch_replaces_days_instead_of_duplicating() {
        let dir = TempDir::new().expect("tempdir");
        let db = WeatherDbHelper::in_dir(dir.path());
        let server = server_with(200, MOUNTAIN_VIEW).await;
        let task = task(&server, db.clone());

        assert_eq!(task.run("94043", Units::Metric).await, 2);
        assert_eq!(task.run("94043", Units::Metric).await, 2);

        assert_eq!(stored_days(&db, "94043"), 2);
    }

    #[tokio::test]
    async fn http_error_degrades_to_zero_days() {
        let dir = TempDir::new().expect("tempdir");
        let db = WeatherDbHelper::in_dir(dir.path());
        let server = server_with(500, "boom").await;
        let task = task(&server, db.clone());

        let err = task.try_run("94043", Units::Metric).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));

        assert_eq!(task.run("94043", Units::Metric).await, 0);
        assert_eq!(stored_days(&db, "94043"), 0);
    }

    #[tokio::test]
    async fn malformed_payload_degrades_to_zero_days() {
        let dir = TempDir::new().expect("tempdir");
        let db = WeatherDbHelper::in_dir(dir.path());
        let server = server_with(200, r#"{"list": "nope"}"#).await;

        assert_eq!(task(&server, db.clone()).run("94043", Units::Metric).await, 0);
        assert_eq!(stored_days(&db, "94043"), 0);
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_network_error() {
        let dir = TempDir::new().expect("tempdir");
        let db = WeatherDbHelper::in_dir(dir.path());
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), &uri);
        let task = FetchWeatherTask::new(Arc::new(provider), db);

        let err = task.try_run("94043", Units::Metric).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn unavailable_store_degrades_to_zero_days() {
        let dir = TempDir::new().expect("tempdir");
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").expect("write blocker");
        let server = server_with(200, MOUNTAIN_VIEW).await;

        let task = task(&server, WeatherDbHelper::in_dir(&blocker));
        let err = task.try_run("94043", Units::Metric).await.unwrap_err();
        assert!(matches!(err, FetchError::Store(StoreError::Unavailable { .. })));
        assert_eq!(task.run("94043", Units::Metric).await, 0);
    }

    #[tokio::test]
    async fn spawned_fetch_reports_days_through_handle() {
        let dir = TempDir::new().expect("tempdir");
        let db = WeatherDbHelper::in_dir(dir.path());
        let server = server_with(200, MOUNTAIN_VIEW).await;

        let handle = task(&server, db.clone()).spawn("94043".to_string(), Units::Metric);
        assert_eq!(handle.await.expect("task should not panic"), 2);
        assert_eq!(stored_days(&db, "94043"), 2);
    }
}
