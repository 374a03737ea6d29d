//! Version-driven migration of stale configuration files.
//!
//! The main configuration records the schema version it was written under
//! in `converter_ver`; an absent key means the file predates versioning.
//! Migration runs every step between the stored version and
//! [`CONVERTER_VERSION`], in order. Only keys named by a step are touched.
//!
//! Version history:
//! - v1: the support/partial-coherence rename wave (`support_*` became
//!   `shrink_wrap_*`, `beta` became `hio_beta`, and so on).
//! - v2: structural changes: `pcdi_trigger` collapsed to the scalar
//!   `pc_interval`, `aliens` without an algorithm selection implies
//!   `alien_alg = "block_aliens"`, and the retired `simulation` flag is
//!   dropped.

use std::fs;
use std::path::Path;

use crate::codec::{read_config, write_config};
use crate::verify::Stage;
use crate::{ConfigMap, Result, Value};

/// Schema version written by this crate.
pub const CONVERTER_VERSION: i64 = 2;

/// Returns the current schema version.
pub fn version() -> i64 {
    CONVERTER_VERSION
}

static PREP_RENAMES_V1: &[(&str, &str)] = &[
    ("darkfile", "darkfield_filename"),
    ("whitefile", "whitefield_filename"),
];

static DATA_RENAMES_V1: &[(&str, &str)] = &[("amp_threshold", "intensity_threshold")];

static REC_RENAMES_V1: &[(&str, &str)] = &[
    ("samples", "reconstructions"),
    ("beta", "hio_beta"),
    ("support_area", "initial_support_area"),
    ("amp_support_trigger", "shrink_wrap_trigger"),
    ("support_type", "shrink_wrap_type"),
    ("support_threshold", "shrink_wrap_threshold"),
    ("support_sigma", "shrink_wrap_gauss_sigma"),
    ("generations", "ga_generations"),
    ("ga_support_thresholds", "ga_shrink_wrap_thresholds"),
    ("ga_support_sigmas", "ga_shrink_wrap_gauss_sigmas"),
    ("ga_low_resolution_sigmas", "ga_lowpass_filter_sigmas"),
    ("iter_res_sigma_range", "lowpass_filter_sw_sigma_range"),
    ("iter_res_det_range", "lowpass_filter_range"),
    ("partial_coherence_type", "pc_type"),
    ("partial_coherence_iteration_num", "pc_LUCY_iterations"),
    ("partial_coherence_normalize", "pc_normalize"),
    ("partial_coherence_roi", "pc_LUCY_kernel"),
];

/// Migrates a mapping from `from_version` to the current schema.
///
/// Returns true if the mapping changed.
pub fn convert_map(stage: Stage, map: &mut ConfigMap, from_version: i64) -> bool {
    let mut changed = false;
    if from_version < 1 {
        changed |= rename_step(stage, map);
    }
    if from_version < 2 {
        changed |= restructure_step(stage, map);
    }
    changed
}

fn rename_step(stage: Stage, map: &mut ConfigMap) -> bool {
    let renames: &[(&str, &str)] = match stage {
        Stage::Prep => PREP_RENAMES_V1,
        Stage::Data => DATA_RENAMES_V1,
        Stage::Rec => REC_RENAMES_V1,
        Stage::Main | Stage::Disp => &[],
    };
    let mut changed = false;
    for (old, new) in renames {
        changed |= map.rename(old, new);
    }
    changed
}

fn restructure_step(stage: Stage, map: &mut ConfigMap) -> bool {
    match stage {
        Stage::Main => map.remove("simulation").is_some(),
        Stage::Data => {
            if map.contains("aliens") && !map.contains("alien_alg") {
                map.insert("alien_alg", Value::Str("block_aliens".to_string()));
                true
            } else {
                false
            }
        }
        Stage::Rec => {
            if let Some(trigger) = map.remove("pcdi_trigger") {
                // (start, interval[, stop]) carried the interval in its
                // second element; a bare or one-element trigger is the
                // interval itself.
                let interval = match trigger.items() {
                    Some(items) if items.len() >= 2 => items[1].as_int(),
                    Some(items) => items.first().and_then(Value::as_int),
                    None => trigger.as_int(),
                };
                if let Some(interval) = interval {
                    map.insert("pc_interval", Value::Int(interval));
                }
                true
            } else {
                false
            }
        }
        Stage::Prep | Stage::Disp => false,
    }
}

/// Migrates every configuration file in an experiment's conf directory.
///
/// Reads the stored version from the main configuration, rewrites every
/// recognized stage file (including `config_rec_<id>` alternates), and
/// stamps the current version into the main configuration. Unrecognized
/// files are left alone.
///
/// Returns true if a migration ran, false when already current.
///
/// # Errors
///
/// Fails if the main configuration is missing or any recognized file does
/// not parse.
pub fn convert_dir(conf_dir: &Path) -> Result<bool> {
    let main_path = conf_dir.join("config");
    let mut main = read_config(&main_path)?;
    let from_version = main.get_int("converter_ver").unwrap_or(0);
    if from_version >= CONVERTER_VERSION {
        return Ok(false);
    }

    convert_map(Stage::Main, &mut main, from_version);
    main.insert("converter_ver", Value::Int(CONVERTER_VERSION));
    write_config(&main, &main_path)?;

    for entry in fs::read_dir(conf_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == "config" {
            continue;
        }
        let Some(stage) = Stage::from_config_name(&name) else {
            continue;
        };
        let mut map = read_config(entry.path())?;
        if convert_map(stage, &mut map, from_version) {
            write_config(&map, entry.path())?;
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rec_rename_wave() {
        let mut map = ConfigMap::new();
        map.insert("samples", Value::Int(5));
        map.insert("beta", Value::Float(0.9));
        map.insert(
            "amp_support_trigger",
            Value::Tuple(vec![Value::Int(1), Value::Int(1)]),
        );
        map.insert("support_type", Value::Str("GAUSS".to_string()));

        assert!(convert_map(Stage::Rec, &mut map, 0));

        assert_eq!(map.get_int("reconstructions"), Some(5));
        assert_eq!(map.get_float("hio_beta"), Some(0.9));
        assert!(map.contains("shrink_wrap_trigger"));
        assert_eq!(map.get_str("shrink_wrap_type"), Some("GAUSS"));
        assert!(!map.contains("samples"));
        assert!(!map.contains("beta"));
    }

    #[test]
    fn test_pcdi_trigger_collapses_to_interval() {
        let mut map = ConfigMap::new();
        map.insert(
            "pcdi_trigger",
            Value::Tuple(vec![Value::Int(50), Value::Int(50)]),
        );
        assert!(convert_map(Stage::Rec, &mut map, 1));
        assert_eq!(map.get_int("pc_interval"), Some(50));
        assert!(!map.contains("pcdi_trigger"));
    }

    #[test]
    fn test_aliens_implies_block_aliens() {
        let mut map = ConfigMap::new();
        map.insert(
            "aliens",
            Value::List(vec![Value::List(vec![Value::Int(0), Value::Int(10)])]),
        );
        assert!(convert_map(Stage::Data, &mut map, 1));
        assert_eq!(map.get_str("alien_alg"), Some("block_aliens"));
    }

    #[test]
    fn test_current_version_is_noop() {
        let mut map = ConfigMap::new();
        map.insert("beta", Value::Float(0.9));
        assert!(!convert_map(Stage::Rec, &mut map, CONVERTER_VERSION));
        // an untouched legacy key stays untouched at current version
        assert!(map.contains("beta"));
    }

    #[test]
    fn test_values_preserved_verbatim() {
        let mut map = ConfigMap::new();
        map.insert("support_area", Value::parse("(0.5,0.5,0.5)").unwrap());
        convert_map(Stage::Rec, &mut map, 0);
        assert_eq!(
            map.get("initial_support_area").unwrap().to_string(),
            "(0.5,0.5,0.5)"
        );
    }
}
