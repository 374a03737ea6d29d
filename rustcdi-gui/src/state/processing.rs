//! Processing state for background stage runs.

use rustcdi_experiment::StageKind;

/// Tracks the state of background stage runs.
pub struct ProcessingState {
    /// Stage currently running, if any.
    pub running: Option<StageKind>,
    /// Whether a run-everything sequence is in flight.
    pub run_all: bool,
    /// User-facing status message.
    pub status_text: String,
}

impl Default for ProcessingState {
    fn default() -> Self {
        Self {
            running: None,
            run_all: false,
            status_text: "Ready".to_string(),
        }
    }
}

impl ProcessingState {
    /// Returns true while any stage work is in flight.
    pub fn is_busy(&self) -> bool {
        self.running.is_some() || self.run_all
    }
}
