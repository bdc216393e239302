//! Load stage: persist a [`RecordSet`] into the `weather_data` table.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::fmt::Debug;

use crate::{config::DatabaseConfig, model::RecordSet};

/// Chain one `.bind(..)` per column of [`INSERT_COLUMNS`], in order.
macro_rules! bind_record {
    ($query:expr, $record:expr) => {{
        let record = $record;
        $query
            .bind(record.city.as_deref())
            .bind(record.country.as_deref())
            .bind(record.weather_main.as_deref())
            .bind(record.weather_description.as_deref())
            .bind(record.temp)
            .bind(record.feels_like)
            .bind(record.temp_min)
            .bind(record.temp_max)
            .bind(record.pressure)
            .bind(record.humidity)
            .bind(record.wind_speed)
            .bind(record.wind_deg)
            .bind(record.clouds_all)
            .bind(record.date.map(|ts| ts.naive_utc()))
            .bind(record.sunrise.map(|ts| ts.naive_utc()))
            .bind(record.sunset.map(|ts| ts.naive_utc()))
    }};
}

pub mod postgres;
pub mod sqlite;

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Destination table for every backend.
pub const TABLE_NAME: &str = "weather_data";

/// Column order shared by the DDL and the positional INSERT binds.
pub const INSERT_COLUMNS: [&str; 16] = [
    "city",
    "country",
    "weather_main",
    "weather_description",
    "temp",
    "feels_like",
    "temp_min",
    "temp_max",
    "pressure",
    "humidity",
    "wind_speed",
    "wind_deg",
    "clouds_all",
    "date",
    "sunrise",
    "sunset",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Postgres => "postgres",
            Backend::Sqlite => "sqlite",
        }
    }

    /// Backend implied by a connection URL scheme.
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url.split(':').next().unwrap_or_default().to_lowercase();

        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "sqlite" => Ok(Backend::Sqlite),
            _ => Err(anyhow!(
                "Unsupported database URL scheme '{scheme}'. Supported: postgres, postgresql, sqlite."
            )),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One open connection with the run's transaction already begun.
///
/// Nothing is visible to other connections until [`WeatherStore::commit`].
/// [`WeatherStore::close`] drops the transaction, which rolls it back.
#[async_trait]
pub trait WeatherStore: Send + Debug {
    fn backend(&self) -> Backend;

    /// `CREATE TABLE IF NOT EXISTS`; safe to call on every run.
    async fn ensure_table(&mut self) -> Result<()>;

    /// One parameterized INSERT per record. Returns the number of rows written.
    async fn insert(&mut self, records: &RecordSet) -> Result<u64>;

    /// Commit the run and release the connection.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Release the connection without committing.
    async fn close(self: Box<Self>);
}

/// Open a store for the configured database.
///
/// `database.url` selects the backend when set; otherwise the individual
/// fields describe a PostgreSQL server.
pub async fn connect(config: &DatabaseConfig) -> Result<Box<dyn WeatherStore>> {
    let store: Box<dyn WeatherStore> = match config.url.as_deref() {
        Some(url) => match Backend::from_url(url)? {
            Backend::Postgres => Box::new(PostgresStore::connect_url(url).await?),
            Backend::Sqlite => Box::new(SqliteStore::connect_url(url).await?),
        },
        None => Box::new(PostgresStore::connect(config).await?),
    };

    log::info!("Connected to {} database", store.backend());
    Ok(store)
}

/// `INSERT INTO weather_data (...) VALUES (...)` with one placeholder per
/// column, rendered by `placeholder(position)` (1-based).
fn insert_statement(placeholder: impl Fn(usize) -> String) -> String {
    let values: Vec<String> = (1..=INSERT_COLUMNS.len()).map(placeholder).collect();

    format!(
        "INSERT INTO {TABLE_NAME} ({}) VALUES ({})",
        INSERT_COLUMNS.join(", "),
        values.join(", ")
    )
}

/// Create the table, insert the records and commit, releasing the
/// connection on every path.
pub async fn load(mut store: Box<dyn WeatherStore>, records: &RecordSet) -> Result<u64> {
    let written = match write_records(store.as_mut(), records).await {
        Ok(written) => written,
        Err(err) => {
            store.close().await;
            return Err(err);
        }
    };

    store
        .commit()
        .await
        .context("Failed to commit weather data")?;

    Ok(written)
}

async fn write_records(store: &mut dyn WeatherStore, records: &RecordSet) -> Result<u64> {
    store
        .ensure_table()
        .await
        .with_context(|| format!("Failed to create table {TABLE_NAME}"))?;

    store
        .insert(records)
        .await
        .with_context(|| format!("Failed to insert into {TABLE_NAME}"))
}
