//! Progress bar for running jobs
//!
//! Fed from store notifications rather than polling the session itself.

use std::time::Duration;

use data_alchemy_sdk::ViewState;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;

pub struct JobProgress {
    bar: ProgressBar,
}

impl JobProgress {
    /// Create a progress bar, or a hidden one when `visible` is false
    pub fn new(label: &str, visible: bool) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new(100);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} {prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  "),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_prefix(label.to_string());
        Self { bar }
    }

    /// Mirror store updates until no job is loading
    pub async fn follow(&self, mut updates: watch::Receiver<ViewState>) {
        loop {
            {
                let state = updates.borrow_and_update();
                self.bar.set_position(state.displayed_progress() as u64);
                self.bar
                    .set_message(state.stage.clone().unwrap_or_default());
                if !state.loading {
                    break;
                }
            }
            if updates.changed().await.is_err() {
                break;
            }
        }
        self.bar.finish_and_clear();
    }
}
