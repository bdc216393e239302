//! Core library for the `weather-etl` job.
//!
//! This crate defines:
//! - Configuration loading (`config/config.yaml`)
//! - The three pipeline stages: fetch, transform, load
//! - The orchestration that runs them once, in order
//!
//! Logging goes through the `log` facade; the binary decides where it ends up.

pub mod config;
pub mod fetch;
pub mod load;
pub mod model;
pub mod pipeline;
pub mod transform;

pub use config::{ApiConfig, Config, ConfigError, DatabaseConfig, Location};
pub use fetch::{FetchError, WeatherFetcher};
pub use load::{Backend, WeatherStore};
pub use model::{RawWeatherResponse, RecordSet, WeatherRecord};
pub use pipeline::{PipelineError, RunOutcome};
pub use transform::transform;
