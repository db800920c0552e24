//! CLI command for uploading a file

use std::path::PathBuf;

use data_alchemy_sdk::{FileCandidate, InferenceSession};

use super::{follow_job, print_snapshot};
use crate::error::CliError;
use crate::output::OutputFormat;

/// Arguments for the `upload` command
pub struct UploadArgs {
    /// CSV or Excel file to upload
    pub file: PathBuf,
    /// MIME type to send instead of the one derived from the extension
    pub mime: Option<String>,
    pub format: OutputFormat,
}

/// Handle the `upload` command
pub async fn handle_upload(session: &InferenceSession, args: &UploadArgs) -> Result<(), CliError> {
    let mut file = FileCandidate::from_path(&args.file).map_err(|e| {
        CliError::InvalidArgument(format!("Cannot read {}: {}", args.file.display(), e))
    })?;
    if let Some(mime) = &args.mime {
        file = file.with_mime(mime);
    }

    eprintln!("Uploading {} ({} bytes)...", file.name, file.size);
    let ticket = session.submit_file(file).await?;
    eprintln!(
        "  Dataset: {}\n  Task: {}",
        ticket.dataset_id(),
        ticket.task_id().unwrap_or("-")
    );

    follow_job(session, "Inferring types", args.format).await?;
    print_snapshot(session, args.format)
}
