//! CLI command for reading a task status once

use data_alchemy_sdk::{ClientConfig, DatasetApi, HttpDatasetApi};

use crate::error::CliError;
use crate::output::{self, OutputFormat};

/// Arguments for the `status` command
pub struct StatusArgs {
    pub dataset_id: String,
    pub task_id: String,
    pub format: OutputFormat,
}

/// Handle the `status` command
pub async fn handle_status(config: &ClientConfig, args: &StatusArgs) -> Result<(), CliError> {
    let api = HttpDatasetApi::new(config)?;
    let status = api.poll_status(&args.dataset_id, &args.task_id).await?;
    println!(
        "{}",
        output::format_status(&args.task_id, &status, args.format)?
    );
    Ok(())
}
