//! Background workers launching the external processing stages.
//!
//! Each worker runs on its own thread and reports back to the UI thread
//! over the app channel. The external programs inherit stdio, so their
//! output lands in the terminal the GUI was launched from.

use std::sync::mpsc::Sender;
use std::time::Instant;

use rustcdi_experiment::{run_stage, Experiment, RunOptions, StageKind, Toolchain};

use crate::message::AppMessage;

/// Runs a single stage and reports the outcome.
pub fn stage_worker(
    toolchain: &Toolchain,
    stage: StageKind,
    experiment: &Experiment,
    options: &RunOptions,
    tx: &Sender<AppMessage>,
) {
    let _ = tx.send(AppMessage::StageStarted(stage));
    match run_stage(toolchain, stage, experiment, options) {
        Ok(run) => {
            let _ = tx.send(AppMessage::StageFinished(stage, run.elapsed));
        }
        Err(err) => {
            log::warn!("stage {stage} failed: {err}");
            let _ = tx.send(AppMessage::StageFailed(stage, err.to_string()));
        }
    }
}

/// Runs all four stages in order, stopping at the first failure.
pub fn run_all_worker(
    toolchain: &Toolchain,
    experiment: &Experiment,
    options: &RunOptions,
    tx: &Sender<AppMessage>,
) {
    let start = Instant::now();
    for stage in StageKind::ALL {
        let _ = tx.send(AppMessage::StageStarted(stage));
        match run_stage(toolchain, stage, experiment, options) {
            Ok(run) => {
                let _ = tx.send(AppMessage::StageFinished(stage, run.elapsed));
            }
            Err(err) => {
                log::warn!("stage {stage} failed: {err}");
                let _ = tx.send(AppMessage::StageFailed(stage, err.to_string()));
                return;
            }
        }
    }
    let _ = tx.send(AppMessage::AllFinished(start.elapsed()));
}
