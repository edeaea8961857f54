//! Table and column names shared by the schema, the store and its queries.

pub const DATABASE_NAME: &str = "weather.db";

/// Bump whenever the schema changes; the helper runs its upgrade hook on mismatch.
pub const DATABASE_VERSION: i32 = 3;

/// Primary key column name used by both tables.
pub const ID: &str = "_id";

pub mod location {
    pub const TABLE: &str = "location";
    /// Query string sent to the provider, e.g. a postal code.
    pub const LOCATION_SETTING: &str = "location_setting";
    /// Human readable city name reported by the provider.
    pub const CITY_NAME: &str = "city_name";
    pub const COORD_LAT: &str = "coord_lat";
    pub const COORD_LONG: &str = "coord_long";

    pub const COLUMNS: &[&str] = &[super::ID, LOCATION_SETTING, CITY_NAME, COORD_LAT, COORD_LONG];
}

pub mod weather {
    pub const TABLE: &str = "weather";
    /// Foreign key into the location table.
    pub const LOCATION_ID: &str = "location_id";
    /// Epoch seconds truncated to the start of the day.
    pub const DATE: &str = "date";
    /// Provider condition id, used to pick an icon.
    pub const WEATHER_ID: &str = "weather_id";
    pub const SHORT_DESC: &str = "short_desc";
    pub const MIN_TEMP: &str = "min";
    pub const MAX_TEMP: &str = "max";
    pub const HUMIDITY: &str = "humidity";
    pub const PRESSURE: &str = "pressure";
    pub const WIND_SPEED: &str = "wind";
    /// Wind direction in meteorological degrees.
    pub const DEGREES: &str = "degrees";
    /// `metric` or `imperial`, as requested from the provider.
    pub const UNITS: &str = "units";

    pub const COLUMNS: &[&str] = &[
        super::ID,
        LOCATION_ID,
        DATE,
        WEATHER_ID,
        SHORT_DESC,
        MIN_TEMP,
        MAX_TEMP,
        HUMIDITY,
        PRESSURE,
        WIND_SPEED,
        DEGREES,
        UNITS,
    ];
}

/// `table.column`
pub fn qualified(table: &str, column: &str) -> String {
    format!("{table}.{column}")
}

fn weather_join_select() -> String {
    let cols = weather::COLUMNS
        .iter()
        .map(|c| qualified(weather::TABLE, c))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT {cols} FROM {w} INNER JOIN {l} ON {w_loc} = {l_id}",
        w = weather::TABLE,
        l = location::TABLE,
        w_loc = qualified(weather::TABLE, weather::LOCATION_ID),
        l_id = qualified(location::TABLE, ID),
    )
}

/// Weather rows for a location setting (`?1`), optionally from a start date (`?2`) on.
pub fn weather_by_location_setting(with_start_date: bool) -> String {
    let mut sql = format!(
        "{} WHERE {} = ?1",
        weather_join_select(),
        qualified(location::TABLE, location::LOCATION_SETTING),
    );
    if with_start_date {
        sql.push_str(&format!(" AND {} >= ?2", qualified(weather::TABLE, weather::DATE)));
    }
    sql.push_str(&format!(" ORDER BY {} ASC", qualified(weather::TABLE, weather::DATE)));
    sql
}

/// Weather row for a location setting (`?1`) on an exact day (`?2`).
pub fn weather_by_location_setting_and_date() -> String {
    format!(
        "{} WHERE {} = ?1 AND {} = ?2",
        weather_join_select(),
        qualified(location::TABLE, location::LOCATION_SETTING),
        qualified(weather::TABLE, weather::DATE),
    )
}
