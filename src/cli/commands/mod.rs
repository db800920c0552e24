//! CLI command implementations

pub mod set_type;
pub mod show;
pub mod status;
pub mod upload;

use data_alchemy_sdk::InferenceSession;

use crate::error::CliError;
use crate::output::{self, OutputFormat};
use crate::progress::JobProgress;

/// Show progress of the running job and wait for it to finish
async fn follow_job(
    session: &InferenceSession,
    label: &str,
    format: OutputFormat,
) -> Result<(), CliError> {
    let progress = JobProgress::new(label, format == OutputFormat::Table);
    let (_, result) = tokio::join!(
        progress.follow(session.subscribe()),
        session.wait_until_idle()
    );
    Ok(result?)
}

/// Print the current snapshot on stdout
fn print_snapshot(session: &InferenceSession, format: OutputFormat) -> Result<(), CliError> {
    let state = session.state();
    let Some(snapshot) = state.snapshot.as_deref() else {
        return Err(CliError::Output("No dataset loaded".to_string()));
    };
    println!(
        "{}",
        output::format_snapshot(snapshot, &state, format)?
    );
    Ok(())
}
