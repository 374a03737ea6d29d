//! Processing stage definitions and launchers.
//!
//! The four stages (preparation, data formatting, reconstruction,
//! visualization) are external programs; this module assembles their
//! command lines, gates them on the presence of the previous stage's
//! output, and runs them in order.

use std::fmt;
use std::process::Command;
use std::time::{Duration, Instant};

use rustcdi_config::Stage;

use crate::{Error, Experiment, Result, Toolchain};

/// A processing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Raw-data preparation.
    Prep,
    /// Data formatting.
    Data,
    /// Reconstruction.
    Rec,
    /// Visualization.
    Disp,
}

impl StageKind {
    /// All stages, in processing order.
    pub const ALL: [StageKind; 4] = [
        StageKind::Prep,
        StageKind::Data,
        StageKind::Rec,
        StageKind::Disp,
    ];

    /// The configuration stage driving this processing stage.
    pub fn config_stage(self) -> Stage {
        match self {
            StageKind::Prep => Stage::Prep,
            StageKind::Data => Stage::Data,
            StageKind::Rec => Stage::Rec,
            StageKind::Disp => Stage::Disp,
        }
    }

    /// Human-readable stage name.
    pub fn label(self) -> &'static str {
        match self {
            StageKind::Prep => "data preparation",
            StageKind::Data => "data formatting",
            StageKind::Rec => "reconstruction",
            StageKind::Disp => "visualization",
        }
    }

    /// File names whose presence marks this stage's input as available,
    /// or `None` when the stage has no prerequisite.
    pub fn input_files(self) -> Option<&'static [&'static str]> {
        match self {
            StageKind::Prep => None,
            StageKind::Data => Some(&["prep_data.tif"]),
            StageKind::Rec => Some(&["data.tif", "data.npy"]),
            StageKind::Disp => Some(&["image.npy"]),
        }
    }

    /// What has to happen before this stage can run.
    pub fn requirement_hint(self) -> &'static str {
        match self {
            StageKind::Prep => "an experiment directory",
            StageKind::Data => "prepared data (run data preparation first)",
            StageKind::Rec => "formatted data (run data formatting first)",
            StageKind::Disp => "reconstruction results (run reconstruction first)",
        }
    }

    /// Returns true if the stage's input data exists in the experiment.
    pub fn is_ready(self, experiment: &Experiment) -> bool {
        self.input_files()
            .is_none_or(|names| experiment.contains_file(names))
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::Prep => "prep",
            StageKind::Data => "data",
            StageKind::Rec => "rec",
            StageKind::Disp => "disp",
        };
        f.write_str(name)
    }
}

/// Options forwarded to the stage programs.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Alternate reconstruction configuration id.
    pub rec_id: Option<String>,
    /// Downgrade configuration verification to warnings.
    pub no_verify: bool,
}

/// Outcome of a completed stage run.
#[derive(Debug)]
pub struct StageRun {
    /// Stage that ran.
    pub stage: StageKind,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Runs one processing stage to completion.
///
/// The stage program receives the experiment directory as its first
/// argument, plus `--rec-id` (reconstruction and visualization) and
/// `--no-verify` when set. The program's stdio is inherited.
///
/// # Errors
///
/// Fails when the stage's input data is missing, the program cannot be
/// spawned, or it exits with a failure status.
pub fn run_stage(
    toolchain: &Toolchain,
    stage: StageKind,
    experiment: &Experiment,
    options: &RunOptions,
) -> Result<StageRun> {
    if !stage.is_ready(experiment) {
        return Err(Error::StageNotReady {
            stage,
            requirement: stage.requirement_hint(),
        });
    }

    let program = toolchain.program(stage);
    let mut command = Command::new(&program);
    command.arg(experiment.dir());
    if matches!(stage, StageKind::Rec | StageKind::Disp) {
        if let Some(rec_id) = &options.rec_id {
            command.arg("--rec-id").arg(rec_id);
        }
    }
    if options.no_verify {
        command.arg("--no-verify");
    }

    let start = Instant::now();
    let status = command.status().map_err(|source| Error::StageSpawn {
        stage,
        program: program.display().to_string(),
        source,
    })?;
    if !status.success() {
        return Err(Error::StageFailed {
            stage,
            program: program.display().to_string(),
            status,
        });
    }
    Ok(StageRun {
        stage,
        elapsed: start.elapsed(),
    })
}

/// Runs all four stages in order, stopping at the first failure.
///
/// # Errors
///
/// Propagates the first stage error.
pub fn run_all(
    toolchain: &Toolchain,
    experiment: &Experiment,
    options: &RunOptions,
) -> Result<Vec<StageRun>> {
    let mut runs = Vec::with_capacity(StageKind::ALL.len());
    for stage in StageKind::ALL {
        runs.push(run_stage(toolchain, stage, experiment, options)?);
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiment() -> (tempfile::TempDir, Experiment) {
        let work = tempfile::tempdir().unwrap();
        let experiment = Experiment::create(work.path(), "ab", None).unwrap();
        (work, experiment)
    }

    #[test]
    fn test_run_stage_success() {
        let (_work, experiment) = experiment();
        let toolchain = Toolchain {
            prep: "true".to_string(),
            ..Toolchain::default()
        };
        let run = run_stage(&toolchain, StageKind::Prep, &experiment, &RunOptions::default())
            .unwrap();
        assert_eq!(run.stage, StageKind::Prep);
    }

    #[test]
    fn test_run_stage_failure_status() {
        let (_work, experiment) = experiment();
        let toolchain = Toolchain {
            prep: "false".to_string(),
            ..Toolchain::default()
        };
        let err = run_stage(&toolchain, StageKind::Prep, &experiment, &RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::StageFailed { stage: StageKind::Prep, .. }), "{err}");
    }

    #[test]
    fn test_run_stage_missing_program() {
        let (_work, experiment) = experiment();
        let toolchain = Toolchain {
            prep: "rustcdi-no-such-stage-program".to_string(),
            ..Toolchain::default()
        };
        let err = run_stage(&toolchain, StageKind::Prep, &experiment, &RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::StageSpawn { .. }), "{err}");
    }

    #[test]
    fn test_stage_gating_on_missing_input() {
        let (_work, experiment) = experiment();
        let toolchain = Toolchain {
            rec: "true".to_string(),
            ..Toolchain::default()
        };
        let err = run_stage(&toolchain, StageKind::Rec, &experiment, &RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::StageNotReady { .. }), "{err}");

        std::fs::write(experiment.dir().join("data.npy"), b"").unwrap();
        assert!(run_stage(&toolchain, StageKind::Rec, &experiment, &RunOptions::default()).is_ok());
    }
}
