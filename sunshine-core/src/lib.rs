//! Core library for the `sunshine` forecast CLI.
//!
//! This crate defines:
//! - The local forecast store (schema contract, versioned database helper, row access)
//! - The OpenWeatherMap daily forecast client
//! - The background fetch task that ties the two together
//! - Configuration and display formatting shared by front ends

pub mod config;
pub mod data;
pub mod error;
pub mod fetch;
pub mod format;
pub mod model;
pub mod provider;

pub use config::Config;
pub use data::WeatherDbHelper;
pub use error::{FetchError, StoreError};
pub use fetch::FetchWeatherTask;
pub use model::{
    DayForecast, ForecastPayload, ForecastRequest, Location, NewLocation, NewWeather, Units,
    Weather,
};
pub use provider::{ForecastProvider, OpenWeatherProvider, provider_from_config};
