use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    Sqlite, SqlitePool, Transaction,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{path::Path, str::FromStr};

use crate::model::RecordSet;

use super::{Backend, WeatherStore, insert_statement};

const CREATE_TABLE: &str = "
CREATE TABLE IF NOT EXISTS weather_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    city VARCHAR(100),
    country VARCHAR(50),
    weather_main VARCHAR(50),
    weather_description VARCHAR(100),
    temp REAL,
    feels_like REAL,
    temp_min REAL,
    temp_max REAL,
    pressure INTEGER,
    humidity INTEGER,
    wind_speed REAL,
    wind_deg INTEGER,
    clouds_all INTEGER,
    date TIMESTAMP,
    sunrise TIMESTAMP,
    sunset TIMESTAMP
)";

/// File-backed store, used for local runs and tests.
pub struct SqliteStore {
    pool: SqlitePool,
    tx: Transaction<'static, Sqlite>,
}

impl SqliteStore {
    pub async fn connect_url(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .context("Invalid SQLite connection URL")?
            .create_if_missing(true);

        Self::open(options)
            .await
            .with_context(|| format!("Failed to open SQLite database {url}"))
    }

    pub async fn connect_path(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        Self::open(options)
            .await
            .with_context(|| format!("Failed to open SQLite database {}", path.display()))
    }

    async fn open(options: SqliteConnectOptions) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let tx = pool.begin().await?;

        Ok(Self { pool, tx })
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WeatherStore for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    async fn ensure_table(&mut self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn insert(&mut self, records: &RecordSet) -> Result<u64> {
        let sql = insert_statement(|i| format!("?{i}"));

        let mut written = 0;
        for record in records {
            let result = bind_record!(sqlx::query(&sql), record)
                .execute(&mut *self.tx)
                .await?;
            written += result.rows_affected();
        }

        log::debug!("Inserted {written} row(s) into SQLite");
        Ok(written)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self { pool, tx } = *self;

        let result = tx.commit().await;
        pool.close().await;

        result.context("Failed to commit SQLite transaction")
    }

    async fn close(self: Box<Self>) {
        let Self { pool, tx } = *self;

        if let Err(err) = tx.rollback().await {
            log::warn!("SQLite rollback failed: {err}");
        }
        pool.close().await;
    }
}
