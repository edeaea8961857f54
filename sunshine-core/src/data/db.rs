use rusqlite::{Connection, TransactionBehavior};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use super::contract::{self, location, weather};
use crate::error::StoreError;

/// How long an opener waits for another connection holding the write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Called with `(old_version, new_version)` when an existing store has an outdated schema.
pub type UpgradeHook = fn(&Connection, i32, i32) -> rusqlite::Result<()>;

/// Owns the location of the versioned forecast store and hands out connections to it.
///
/// The helper itself holds no open handle: every call to [`WeatherDbHelper::writable`]
/// opens a fresh connection which is released when the caller drops it. Cloning is
/// cheap, so the helper can be moved into background workers.
#[derive(Debug, Clone)]
pub struct WeatherDbHelper {
    path: PathBuf,
    version: i32,
    on_upgrade: UpgradeHook,
}

impl WeatherDbHelper {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            version: contract::DATABASE_VERSION,
            on_upgrade: recreate_on_upgrade,
        }
    }

    /// Store named [`contract::DATABASE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(contract::DATABASE_NAME))
    }

    pub fn with_upgrade_hook(mut self, hook: UpgradeHook) -> Self {
        self.on_upgrade = hook;
        self
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Open the store for reading and writing, creating or upgrading the schema first.
    pub fn writable(&self) -> Result<Connection, StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.unavailable(e))?;
        }

        let mut conn = Connection::open(&self.path).map_err(|e| self.unavailable(e))?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(|e| self.unavailable(e))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| self.unavailable(e))?;

        if self.schema_version(&conn)? != self.version {
            // Take the write lock before re-reading the version so that concurrent
            // openers of a fresh store create the schema exactly once.
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| self.unavailable(e))?;
            let current = self.schema_version(&tx)?;

            if current == 0 {
                tracing::debug!(path = %self.path.display(), version = self.version, "creating forecast store");
                create_schema(&tx).map_err(StoreError::Schema)?;
            } else if current != self.version {
                tracing::info!(
                    path = %self.path.display(),
                    from = current,
                    to = self.version,
                    "upgrading forecast store"
                );
                (self.on_upgrade)(&tx, current, self.version).map_err(StoreError::Schema)?;
            }
            tx.pragma_update(None, "user_version", self.version)
                .map_err(StoreError::Schema)?;
            tx.commit().map_err(StoreError::Schema)?;
        }

        Ok(conn)
    }

    /// Remove the store file, if any. The next [`WeatherDbHelper::writable`] starts from scratch.
    pub fn delete_database(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.unavailable(e)),
        }
    }

    fn schema_version(&self, conn: &Connection) -> Result<i32, StoreError> {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .map_err(|e| self.unavailable(e))
    }

    fn unavailable<E>(&self, err: E) -> StoreError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Unavailable { path: self.path.clone(), source: Box::new(err) }
    }
}

/// Create the location and weather tables.
pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "CREATE TABLE {table} (
              {id} INTEGER PRIMARY KEY AUTOINCREMENT,
              {setting} TEXT UNIQUE NOT NULL,
              {city} TEXT NOT NULL,
              {lat} REAL NOT NULL,
              {long} REAL NOT NULL
            )",
            table = location::TABLE,
            id = contract::ID,
            setting = location::LOCATION_SETTING,
            city = location::CITY_NAME,
            lat = location::COORD_LAT,
            long = location::COORD_LONG,
        ),
        (),
    )?;

    // One row per location and day; a newer forecast for the same day replaces the old one.
    conn.execute(
        &format!(
            "CREATE TABLE {table} (
              {id} INTEGER PRIMARY KEY AUTOINCREMENT,
              {loc_key} INTEGER NOT NULL,
              {date} INTEGER NOT NULL,
              {weather_id} INTEGER NOT NULL,
              {short_desc} TEXT NOT NULL,
              {min} REAL NOT NULL,
              {max} REAL NOT NULL,
              {humidity} REAL NOT NULL,
              {pressure} REAL NOT NULL,
              {wind} REAL NOT NULL,
              {degrees} REAL NOT NULL,
              {units} TEXT NOT NULL,
              FOREIGN KEY ({loc_key}) REFERENCES {loc_table} ({loc_id}),
              UNIQUE ({date}, {loc_key}) ON CONFLICT REPLACE
            )",
            table = weather::TABLE,
            id = contract::ID,
            loc_key = weather::LOCATION_ID,
            date = weather::DATE,
            weather_id = weather::WEATHER_ID,
            short_desc = weather::SHORT_DESC,
            min = weather::MIN_TEMP,
            max = weather::MAX_TEMP,
            humidity = weather::HUMIDITY,
            pressure = weather::PRESSURE,
            wind = weather::WIND_SPEED,
            degrees = weather::DEGREES,
            units = weather::UNITS,
            loc_table = location::TABLE,
            loc_id = contract::ID,
        ),
        (),
    )?;

    Ok(())
}

/// Default upgrade: the store only caches provider data, so throw it away and start over.
pub fn recreate_on_upgrade(conn: &Connection, old: i32, new: i32) -> rusqlite::Result<()> {
    tracing::debug!(old, new, "dropping forecast tables");
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {};
         DROP TABLE IF EXISTS {};",
        weather::TABLE,
        location::TABLE,
    ))?;
    create_schema(conn)
}
