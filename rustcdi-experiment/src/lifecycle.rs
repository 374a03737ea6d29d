//! Configuration lifecycle: read, migrate, verify.
//!
//! Loading an experiment's configuration set is always the same dance: read
//! the main file, migrate the whole conf directory when it was written
//! under an older schema, then verify and collect the requested stage
//! files. Conversion runs before verification, since a pre-versioning file
//! cannot be expected to satisfy the current schema.

use std::path::Path;

use rustcdi_config::{convert, read_config, verify, ConfigMap, Stage, VerifyError};

use crate::{Experiment, Result};

/// Options for loading an experiment's configuration set.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Alternate reconstruction configuration id.
    pub rec_id: Option<String>,
    /// Collect verification failures as warnings instead of failing.
    pub no_verify: bool,
}

/// A loaded configuration set.
#[derive(Debug, Default)]
pub struct LoadedConfigs {
    /// The main configuration.
    pub main: ConfigMap,
    /// Requested stage configurations that were present on disk.
    pub stages: Vec<(Stage, ConfigMap)>,
    /// Whether a schema migration ran while loading.
    pub converted: bool,
    /// Verification failures downgraded by `no_verify`.
    pub warnings: Vec<VerifyError>,
}

impl LoadedConfigs {
    /// Returns a loaded stage configuration.
    pub fn stage(&self, stage: Stage) -> Option<&ConfigMap> {
        self.stages
            .iter()
            .find_map(|(s, map)| (*s == stage).then_some(map))
    }
}

/// Loads, migrates, and verifies an experiment's configuration files.
///
/// The main configuration is always loaded; `stages` names the additional
/// files wanted by the caller. Stage files absent from disk are skipped
/// silently. With `no_verify` set, verification failures are collected in
/// [`LoadedConfigs::warnings`] instead of aborting the load.
///
/// # Errors
///
/// Fails when the directory is not an experiment, a file does not parse,
/// or (without `no_verify`) a configuration violates its schema.
pub fn load_config_maps(
    experiment_dir: &Path,
    stages: &[Stage],
    options: &LoadOptions,
) -> Result<LoadedConfigs> {
    let experiment = Experiment::open(experiment_dir)?;
    let main_path = experiment.main_config_path();
    let mut main = read_config(&main_path)?;

    let mut converted = false;
    let stored = main.get_int("converter_ver");
    if stored.is_none_or(|v| v < convert::version()) {
        convert::convert_dir(&experiment.conf_dir())?;
        main = read_config(&main_path)?;
        converted = true;
    }

    let mut loaded = LoadedConfigs {
        converted,
        ..LoadedConfigs::default()
    };

    check(Stage::Main, &main, options.no_verify, &mut loaded.warnings)?;
    loaded.main = main;

    for &stage in stages {
        if stage == Stage::Main {
            continue;
        }
        let rec_id = (stage == Stage::Rec)
            .then_some(options.rec_id.as_deref())
            .flatten();
        let path = experiment.stage_config_path(stage, rec_id);
        if !path.is_file() {
            continue;
        }
        let map = read_config(&path)?;
        check(stage, &map, options.no_verify, &mut loaded.warnings)?;
        loaded.stages.push((stage, map));
    }

    Ok(loaded)
}

fn check(
    stage: Stage,
    map: &ConfigMap,
    no_verify: bool,
    warnings: &mut Vec<VerifyError>,
) -> Result<()> {
    if let Err(err) = verify(stage, map) {
        if no_verify {
            warnings.push(err);
        } else {
            return Err(rustcdi_config::Error::Verify(err).into());
        }
    }
    Ok(())
}
