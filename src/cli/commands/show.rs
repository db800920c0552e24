//! CLI command for showing a processed dataset

use data_alchemy_sdk::InferenceSession;

use super::print_snapshot;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Arguments for the `show` command
pub struct ShowArgs {
    pub dataset_id: String,
    /// 1-based page to print
    pub page: u32,
    pub format: OutputFormat,
}

/// Handle the `show` command
pub async fn handle_show(session: &InferenceSession, args: &ShowArgs) -> Result<(), CliError> {
    session.open_dataset(&args.dataset_id).await?;
    if args.page != 1 {
        session.change_page(args.page).await?;
    }
    print_snapshot(session, args.format)
}
