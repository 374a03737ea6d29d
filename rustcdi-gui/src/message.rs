//! Application message types for async communication.
//!
//! Messages are sent from background stage workers to the main UI thread
//! via channels to report starts, completions, and errors.

use std::time::Duration;

use rustcdi_experiment::StageKind;

/// Messages sent from background workers to the UI thread.
pub enum AppMessage {
    /// A processing stage started.
    StageStarted(StageKind),

    /// A processing stage finished successfully.
    StageFinished(StageKind, Duration),

    /// A processing stage failed; carries the error text.
    StageFailed(StageKind, String),

    /// A run-everything sequence finished successfully.
    AllFinished(Duration),
}
