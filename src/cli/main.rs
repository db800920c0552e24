//! `data-alchemy` command line client
//!
//! Uploads CSV/Excel files, follows backend type inference, prints the
//! inferred column types and applies type overrides.

mod commands;
mod error;
mod logging;
mod output;
mod progress;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use data_alchemy_sdk::{ClientConfig, InferenceSession};

use crate::commands::set_type::{SetTypeArgs, handle_set_type};
use crate::commands::show::{ShowArgs, handle_show};
use crate::commands::status::{StatusArgs, handle_status};
use crate::commands::upload::{UploadArgs, handle_upload};
use crate::error::CliError;
use crate::logging::{LogConfig, init_logging};
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "data-alchemy", version, about = "Upload datasets and review inferred column types")]
struct Cli {
    /// Base URL of the dataset API
    #[arg(long, env = "DATA_ALCHEMY_API_URL", global = true)]
    api_url: Option<String>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Interval between task status polls
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a CSV or Excel file and wait for type inference
    Upload {
        file: PathBuf,
        /// Override the MIME type derived from the file extension
        #[arg(long)]
        mime: Option<String>,
    },
    /// Show the column types and one page of rows of a dataset
    Show {
        dataset_id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Override the type of a column and wait for the conversion
    SetType {
        dataset_id: String,
        column: String,
        /// integer, decimal, text, datetime, boolean or category
        #[arg(value_name = "TYPE")]
        data_type: String,
    },
    /// Read the status of a backend task once
    Status { dataset_id: String, task_id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config =
        LogConfig::from_verbosity(cli.verbose).with_ansi(std::io::stderr().is_terminal());
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    config.validate().map_err(CliError::Config)?;
    let format = cli.format;

    match cli.command {
        Command::Upload { file, mime } => {
            let session = InferenceSession::from_config(&config)?;
            handle_upload(&session, &UploadArgs { file, mime, format }).await
        }
        Command::Show { dataset_id, page } => {
            let session = InferenceSession::from_config(&config)?;
            let args = ShowArgs {
                dataset_id,
                page,
                format,
            };
            handle_show(&session, &args).await
        }
        Command::SetType {
            dataset_id,
            column,
            data_type,
        } => {
            let session = InferenceSession::from_config(&config)?;
            let args = SetTypeArgs {
                dataset_id,
                column,
                data_type,
                format,
            };
            handle_set_type(&session, &args).await
        }
        Command::Status {
            dataset_id,
            task_id,
        } => {
            let args = StatusArgs {
                dataset_id,
                task_id,
                format,
            };
            handle_status(&config, &args).await
        }
    }
}

/// Merge the config file (if any) with command line overrides
fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url.as_str());
    }
    if let Some(ms) = cli.poll_interval_ms {
        config = config.with_poll_interval_ms(ms);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set_type() {
        let cli = Cli::try_parse_from([
            "data-alchemy",
            "--api-url",
            "http://api.test/api/v1",
            "set-type",
            "d1",
            "age",
            "text",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Command::SetType { ref column, ref data_type, .. } if column == "age" && data_type == "text"
        ));

        let config = load_config(&cli).unwrap();
        assert_eq!(config.base_url, "http://api.test/api/v1");
    }

    #[test]
    fn test_poll_interval_override() {
        let cli = Cli::try_parse_from(["data-alchemy", "--poll-interval-ms", "250", "show", "d1"])
            .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert!(matches!(cli.command, Command::Show { page: 1, .. }));
    }
}
