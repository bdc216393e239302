//! Binary crate for the `weather-etl` job.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Setting up logging once for the whole process
//! - Mapping the job result to an exit code

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cmd = cli::Cli::parse();

    if let Err(err) = logging::init(&cmd.log_file) {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    match cmd.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("ETL job failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}
