use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use weather_etl_core::{
    Config, RunOutcome, WeatherFetcher,
    config::DEFAULT_CONFIG_PATH,
    pipeline,
};

use crate::logging::DEFAULT_LOG_FILE;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-etl",
    version,
    about = "Fetch current weather and load it into a database"
)]
pub struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log file, appended to on every run.
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Fetch, transform and load one observation.
    Run,

    /// Fetch only and print the `main` section of the response.
    Fetch,

    /// Fetch and transform, print the record without loading it.
    Transform,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load(&self.config)?;

        match self.command.unwrap_or(Command::Run) {
            Command::Run => match pipeline::run(&config).await? {
                RunOutcome::Loaded(rows) => info!("Loaded {rows} row(s)"),
                RunOutcome::NothingToLoad => info!("Nothing loaded"),
            },
            Command::Fetch => {
                let raw = WeatherFetcher::new(config.api).fetch().await?;
                let main = raw.get("main").cloned().unwrap_or_default();
                println!("Sample weather data: {main}");
            }
            Command::Transform => {
                let records = pipeline::extract_and_transform(&config).await?;
                match records.first() {
                    Some(record) => println!(
                        "{}",
                        serde_json::to_string_pretty(record)
                            .context("Failed to render weather record")?
                    ),
                    None => error!("Transformation returned an empty record set."),
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_run_with_standard_paths() {
        let cli = Cli::try_parse_from(["weather-etl"]).unwrap();

        assert_eq!(cli.command, None);
        assert_eq!(cli.config, PathBuf::from("config/config.yaml"));
        assert_eq!(cli.log_file, PathBuf::from("logs/etl.log"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["weather-etl", "transform", "--config", "alt.yaml"]).unwrap();

        assert_eq!(cli.command, Some(Command::Transform));
        assert_eq!(cli.config, PathBuf::from("alt.yaml"));
    }

    #[tokio::test]
    async fn missing_config_file_fails() {
        let cli =
            Cli::try_parse_from(["weather-etl", "--config", "no/such/config.yaml"]).unwrap();

        let err = cli.run().await.unwrap_err();
        assert!(format!("{err:#}").contains("no/such/config.yaml"));
    }
}
