use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    PgPool, Postgres, Transaction,
    postgres::{PgConnectOptions, PgPoolOptions},
};

use crate::{config::DatabaseConfig, model::RecordSet};

use super::{Backend, WeatherStore, insert_statement};

const CREATE_TABLE: &str = "
CREATE TABLE IF NOT EXISTS weather_data (
    id SERIAL PRIMARY KEY,
    city VARCHAR(100),
    country VARCHAR(50),
    weather_main VARCHAR(50),
    weather_description VARCHAR(100),
    temp FLOAT,
    feels_like FLOAT,
    temp_min FLOAT,
    temp_max FLOAT,
    pressure INT,
    humidity INT,
    wind_speed FLOAT,
    wind_deg INT,
    clouds_all INT,
    date TIMESTAMP,
    sunrise TIMESTAMP,
    sunset TIMESTAMP
)";

pub struct PostgresStore {
    pool: PgPool,
    tx: Transaction<'static, Postgres>,
}

impl PostgresStore {
    /// Connect using the discrete host/port/credential fields.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.dbname);

        Self::open(options).await.with_context(|| {
            format!(
                "Failed to connect to PostgreSQL at {}:{}/{}",
                config.host, config.port, config.dbname
            )
        })
    }

    pub async fn connect_url(url: &str) -> Result<Self> {
        let options: PgConnectOptions = url
            .parse()
            .context("Invalid PostgreSQL connection URL")?;

        Self::open(options)
            .await
            .context("Failed to connect to PostgreSQL")
    }

    async fn open(options: PgConnectOptions) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let tx = pool.begin().await?;

        Ok(Self { pool, tx })
    }
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WeatherStore for PostgresStore {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    async fn ensure_table(&mut self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn insert(&mut self, records: &RecordSet) -> Result<u64> {
        let sql = insert_statement(|i| format!("${i}"));

        let mut written = 0;
        for record in records {
            let result = bind_record!(sqlx::query(&sql), record)
                .execute(&mut *self.tx)
                .await?;
            written += result.rows_affected();
        }

        log::debug!("Inserted {written} row(s) into PostgreSQL");
        Ok(written)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self { pool, tx } = *self;

        let result = tx.commit().await;
        pool.close().await;

        result.context("Failed to commit PostgreSQL transaction")
    }

    async fn close(self: Box<Self>) {
        let Self { pool, tx } = *self;

        if let Err(err) = tx.rollback().await {
            log::warn!("PostgreSQL rollback failed: {err}");
        }
        pool.close().await;
    }
}
