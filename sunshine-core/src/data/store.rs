//! Row-level access to the forecast store.
//!
//! All functions take a connection obtained from
//! [`WeatherDbHelper::writable`](super::WeatherDbHelper::writable).

use rusqlite::{
    Connection, OptionalExtension, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};

use super::contract::{self, location, weather};
use crate::{
    error::StoreError,
    model::{DayForecast, ForecastPayload, Location, NewLocation, NewWeather, Units, Weather},
};

/// Insert a new location row and return its id. Fails if the setting code already exists.
pub fn insert_location(conn: &Connection, loc: &NewLocation) -> Result<i64, StoreError> {
    conn.execute(
        &format!(
            "INSERT INTO {} ({}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4)",
            location::TABLE,
            location::LOCATION_SETTING,
            location::CITY_NAME,
            location::COORD_LAT,
            location::COORD_LONG,
        ),
        params![loc.location_setting, loc.city_name, loc.coord_lat, loc.coord_long],
    )
    .map_err(|source| StoreError::Insert { table: location::TABLE, source })?;

    Ok(conn.last_insert_rowid())
}

pub fn find_location(conn: &Connection, setting: &str) -> Result<Option<Location>, StoreError> {
    let loc = conn
        .query_row(
            &format!(
                "SELECT {}, {}, {}, {}, {} FROM {} WHERE {} = ?1",
                contract::ID,
                location::LOCATION_SETTING,
                location::CITY_NAME,
                location::COORD_LAT,
                location::COORD_LONG,
                location::TABLE,
                location::LOCATION_SETTING,
            ),
            [setting],
            |row| {
                Ok(Location {
                    id: row.get(0)?,
                    location_setting: row.get(1)?,
                    city_name: row.get(2)?,
                    coord_lat: row.get(3)?,
                    coord_long: row.get(4)?,
                })
            },
        )
        .optional()?;

    Ok(loc)
}

/// Return the id of the location with this setting code, inserting it first if needed.
///
/// Existing rows are left untouched: locations are reference data keyed by their code.
pub fn add_location(conn: &Connection, loc: &NewLocation) -> Result<i64, StoreError> {
    if let Some(existing) = find_location(conn, &loc.location_setting)? {
        return Ok(existing.id);
    }

    let id = insert_location(conn, loc)?;
    tracing::debug!(id, setting = %loc.location_setting, city = %loc.city_name, "added location");
    Ok(id)
}

/// Insert a forecast day, replacing any row for the same location and date.
pub fn upsert_weather(conn: &Connection, entry: &NewWeather) -> Result<i64, StoreError> {
    let day = &entry.day;
    conn.execute(
        &format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            weather::TABLE,
            weather::LOCATION_ID,
            weather::DATE,
            weather::WEATHER_ID,
            weather::SHORT_DESC,
            weather::MIN_TEMP,
            weather::MAX_TEMP,
            weather::HUMIDITY,
            weather::PRESSURE,
            weather::WIND_SPEED,
            weather::DEGREES,
            weather::UNITS,
        ),
        params![
            entry.location_id,
            day.date,
            day.weather_id,
            day.short_desc,
            day.min_temp,
            day.max_temp,
            day.humidity,
            day.pressure,
            day.wind_speed,
            day.degrees,
            day.units,
        ],
    )
    .map_err(|source| StoreError::Insert { table: weather::TABLE, source })?;

    Ok(conn.last_insert_rowid())
}

/// Upsert all entries in a single transaction. Returns the number of rows written.
pub fn bulk_upsert_weather(conn: &mut Connection, entries: &[NewWeather]) -> Result<usize, StoreError> {
    let tx = conn.transaction()?;
    for entry in entries {
        upsert_weather(&tx, entry)?;
    }
    tx.commit()?;

    Ok(entries.len())
}

/// Store a parsed forecast: get-or-insert its location, then upsert every day.
///
/// Runs in one transaction, so a failed day leaves neither days nor a new location behind.
pub fn store_forecast(conn: &mut Connection, payload: &ForecastPayload) -> Result<usize, StoreError> {
    let tx = conn.transaction()?;
    let location_id = add_location(&tx, &payload.location)?;
    for day in &payload.days {
        upsert_weather(&tx, &day.for_location(location_id))?;
    }
    tx.commit()?;

    Ok(payload.days.len())
}

/// Forecast days for a location setting, oldest first, optionally starting at `start_date`.
pub fn weather_for_location(
    conn: &Connection,
    setting: &str,
    start_date: Option<i64>,
) -> Result<Vec<Weather>, StoreError> {
    let mut stmt = conn.prepare(&contract::weather_by_location_setting(start_date.is_some()))?;

    let rows = match start_date {
        Some(start) => stmt.query_map(params![setting, start], weather_from_row)?,
        None => stmt.query_map(params![setting], weather_from_row)?,
    };

    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn weather_for_location_and_date(
    conn: &Connection,
    setting: &str,
    date: i64,
) -> Result<Option<Weather>, StoreError> {
    let found = conn
        .query_row(
            &contract::weather_by_location_setting_and_date(),
            params![setting, date],
            weather_from_row,
        )
        .optional()?;

    Ok(found)
}

/// Names of all tables in the store, including SQLite's own bookkeeping tables.
pub fn table_names(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let names = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Column names of `table` in declaration order.
pub fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let names = stmt.query_map([table], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

impl ToSql for Units {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Units {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Units::try_from(text).map_err(|e| FromSqlError::Other(e.into()))
    }
}

// Column order matches `weather::COLUMNS`.
fn weather_from_row(row: &Row<'_>) -> rusqlite::Result<Weather> {
    Ok(Weather {
        id: row.get(0)?,
        location_id: row.get(1)?,
        day: DayForecast {
            date: row.get(2)?,
            weather_id: row.get(3)?,
            short_desc: row.get(4)?,
            min_temp: row.get(5)?,
            max_temp: row.get(6)?,
            humidity: row.get(7)?,
            pressure: row.get(8)?,
            wind_speed: row.get(9)?,
            degrees: row.get(10)?,
            units: row.get(11)?,
        },
    })
}
