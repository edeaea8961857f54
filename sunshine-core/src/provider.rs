use crate::{Config, ForecastPayload, ForecastRequest, error::FetchError};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    /// Fetch and parse a daily forecast for `request.query`.
    async fn daily_forecast(&self, request: &ForecastRequest) -> Result<ForecastPayload, FetchError>;
}

/// Construct the forecast provider described by the config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeatherMap API key configured.\n\
                 Hint: run `sunshine configure` and enter your API key."
        )
    })?;

    let provider = match config.api_base_url.as_deref() {
        Some(base) => OpenWeatherProvider::with_base_url(api_key.to_owned(), base),
        None => OpenWeatherProvider::new(api_key.to_owned()),
    };

    Ok(Box::new(provider))
}
