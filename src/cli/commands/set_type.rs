//! CLI command for overriding a column type

use data_alchemy_sdk::{DataType, InferenceSession};

use super::{follow_job, print_snapshot};
use crate::error::CliError;
use crate::output::OutputFormat;

/// Arguments for the `set-type` command
pub struct SetTypeArgs {
    pub dataset_id: String,
    /// Column name
    pub column: String,
    /// Target type (integer, decimal, text, datetime, boolean, category)
    pub data_type: String,
    pub format: OutputFormat,
}

/// Handle the `set-type` command
pub async fn handle_set_type(
    session: &InferenceSession,
    args: &SetTypeArgs,
) -> Result<(), CliError> {
    let new_type: DataType = args
        .data_type
        .parse()
        .map_err(|e: data_alchemy_sdk::models::UnknownDataType| {
            CliError::InvalidArgument(e.to_string())
        })?;

    session.open_dataset(&args.dataset_id).await?;
    let column = session.column(&args.column)?;

    if !session.set_type_override(&column, Some(new_type)) {
        eprintln!(
            "Column '{}' already has type {}, nothing to apply",
            column.name,
            column.effective_type()
        );
        return print_snapshot(session, args.format);
    }

    eprintln!(
        "Converting '{}' from {} to {}...",
        column.name,
        column.effective_type(),
        new_type
    );
    session.apply_override().await?;
    follow_job(session, "Converting", args.format).await?;
    print_snapshot(session, args.format)
}
