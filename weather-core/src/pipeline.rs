//! Fetch → transform → load, once.

use log::{error, info, warn};
use thiserror::Error;

use crate::{
    config::Config,
    fetch::{FetchError, WeatherFetcher},
    load,
    model::RecordSet,
    transform::transform,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Rows written and committed.
    Loaded(u64),
    /// Transform produced nothing; the database was not touched.
    NothingToLoad,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No data fetched")]
    NoData(#[source] FetchError),

    #[error("Failed to load weather data")]
    Load(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Extract and transform only.
pub async fn extract_and_transform(config: &Config) -> Result<RecordSet, PipelineError> {
    let fetcher = WeatherFetcher::new(config.api.clone());

    let raw = match fetcher.fetch().await {
        Ok(raw) => raw,
        Err(err) => {
            error!("No data fetched. Exiting.");
            return Err(PipelineError::NoData(err));
        }
    };

    Ok(transform(Some(&raw)))
}

/// Run the whole job once.
pub async fn run(config: &Config) -> Result<RunOutcome, PipelineError> {
    let records = extract_and_transform(config).await?;

    if records.is_empty() {
        warn!("Transformed record set is empty. Nothing to load.");
        return Ok(RunOutcome::NothingToLoad);
    }

    let store = load::connect(&config.database)
        .await
        .map_err(|e| PipelineError::Load(e.into()))?;
    let written = load::load(store, &records)
        .await
        .map_err(|e| PipelineError::Load(e.into()))?;

    info!("ETL job completed successfully! ({written} row(s) loaded)");
    Ok(RunOutcome::Loaded(written))
}
