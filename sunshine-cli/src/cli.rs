use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use inquire::{Password, Select, Text};
use std::sync::Arc;

use sunshine_core::{
    Config, FetchWeatherTask, Units, Weather, WeatherDbHelper,
    data::store,
    format,
    model::normalize_date,
    provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "sunshine", version, about = "Daily weather forecast CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, default location and unit system.
    Configure,

    /// Fetch the forecast from OpenWeatherMap and store it locally.
    Refresh {
        /// Location setting, e.g. a postal code; defaults to the configured one.
        #[arg(long)]
        location: Option<String>,

        /// Unit system; defaults to the configured one.
        #[arg(long)]
        units: Option<String>,
    },

    /// List stored forecast days from today on.
    Forecast {
        #[arg(long)]
        location: Option<String>,

        /// Fetch before listing.
        #[arg(long)]
        refresh: bool,
    },

    /// Show everything stored for one day.
    Detail {
        /// Day as YYYY-MM-DD.
        date: String,

        #[arg(long)]
        location: Option<String>,
    },

    /// Print a shareable one-line forecast for a day.
    Share {
        /// Day as YYYY-MM-DD.
        date: String,

        #[arg(long)]
        location: Option<String>,
    },

    /// Print a geo URI for the location.
    Map {
        #[arg(long)]
        location: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;
        tracing::debug!(
            location = %config.location,
            units = %config.units,
            configured = config.is_configured(),
            "loaded configuration"
        );

        match self.command {
            Command::Configure => configure(config)?,
            Command::Refresh { location, units } => {
                let location = location.unwrap_or_else(|| config.location.clone());
                let units = match units {
                    Some(u) => Units::try_from(u.as_str())?,
                    None => config.units,
                };
                refresh(&config, &location, units).await?;
            }
            Command::Forecast { location, refresh: fetch_first } => {
                let location = location.unwrap_or_else(|| config.location.clone());
                if fetch_first {
                    refresh(&config, &location, config.units).await?;
                }
                list(&config, &location)?;
            }
            Command::Detail { date, location } => {
                let location = location.unwrap_or_else(|| config.location.clone());
                let weather = day(&config, &location, &date)?;
                print_detail(&weather);
            }
            Command::Share { date, location } => {
                let location = location.unwrap_or_else(|| config.location.clone());
                let weather = day(&config, &location, &date)?;
                println!("{}", format::share_text(&format::forecast_line(&weather)));
            }
            Command::Map { location } => {
                let location = location.unwrap_or_else(|| config.location.clone());
                println!("{}", format::map_uri(&location));
            }
        }

        Ok(())
    }
}

fn configure(mut config: Config) -> Result<()> {
    let api_key = Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }
    config.set_api_key(api_key.trim().to_string());

    let location = Text::new("Location (postal code or city):")
        .with_default(&config.location)
        .prompt()
        .context("Failed to read location")?;
    config.location = location;

    let starting = Units::all().iter().position(|u| *u == config.units).unwrap_or(0);
    config.units = Select::new("Units:", Units::all().to_vec())
        .with_starting_cursor(starting)
        .prompt()
        .context("Failed to read units")?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn db_helper(config: &Config) -> Result<WeatherDbHelper> {
    Ok(WeatherDbHelper::new(config.database_path()?))
}

async fn refresh(config: &Config, location: &str, units: Units) -> Result<()> {
    let provider = provider_from_config(config)?;
    let task = FetchWeatherTask::new(Arc::from(provider), db_helper(config)?)
        .with_days(config.forecast_days);

    let days = task
        .spawn(location.to_string(), units)
        .await
        .context("Forecast fetch task failed")?;

    if days == 0 {
        println!("No forecast data fetched for {location}.");
    } else {
        println!("Fetched {days} forecast days for {location}.");
    }
    Ok(())
}

fn list(config: &Config, location: &str) -> Result<()> {
    let conn = db_helper(config)?.writable()?;
    let today = normalize_date(Utc::now().timestamp());
    let days = store::weather_for_location(&conn, location, Some(today))?;

    if days.is_empty() {
        println!("No stored forecast for {location}.\nHint: run `sunshine refresh` first.");
        return Ok(());
    }

    if let Some(loc) = store::find_location(&conn, location)? {
        println!("{} ({location})", loc.city_name);
    }
    for weather in &days {
        println!("{}", format::forecast_line(weather));
    }
    Ok(())
}

fn day(config: &Config, location: &str, date: &str) -> Result<Weather> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{date}', expected YYYY-MM-DD"))?;
    let epoch = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid date {date}"))?
        .and_utc()
        .timestamp();

    let conn = db_helper(config)?.writable()?;
    store::weather_for_location_and_date(&conn, location, epoch)?
        .ok_or_else(|| anyhow!("No stored forecast for {location} on {date}.\nHint: run `sunshine refresh` first."))
}

fn print_detail(weather: &Weather) {
    for line in detail_lines(weather) {
        println!("{line}");
    }
}

// Units come from the row, not the config: the day may have been fetched with `--units`.
fn detail_lines(weather: &Weather) -> Vec<String> {
    let day = &weather.day;
    vec![
        format::readable_date(day.date),
        day.short_desc.clone(),
        format!("High/Low: {}", format::format_high_lows(day.max_temp, day.min_temp)),
        format!("Humidity: {:.0} %", day.humidity),
        format!("Pressure: {:.0} hPa", day.pressure),
        format!("Wind: {}", format::format_wind(day.wind_speed, day.degrees, day.units)),
    ]
}
