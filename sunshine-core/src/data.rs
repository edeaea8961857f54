//! Local forecast store: schema contract, database helper and row access.

pub mod contract;
pub mod db;
pub mod store;

pub use db::WeatherDbHelper;
