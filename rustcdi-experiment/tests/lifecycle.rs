//! End-to-end configuration lifecycle over a real experiment directory.

use std::fs;

use rustcdi_config::{Stage, CONVERTER_VERSION};
use rustcdi_experiment::{load_config_maps, Experiment, LoadOptions};

fn stale_experiment(work: &std::path::Path) -> Experiment {
    let experiment = Experiment::create(work, "ab", Some("54")).unwrap();
    let conf = experiment.conf_dir();
    fs::write(
        conf.join("config"),
        "working_dir = \"/data/cdi\"\nexperiment_id = \"ab\"\nscan = \"54\"\n",
    )
    .unwrap();
    fs::write(
        conf.join("config_data"),
        "amp_threshold = 25\nbinning = (1,1,1)\n",
    )
    .unwrap();
    fs::write(
        conf.join("config_rec"),
        "algorithm_sequence = \"(20*ER)\"\nbeta = .9\n",
    )
    .unwrap();
    fs::write(
        conf.join("config_rec_lowres"),
        "algorithm_sequence = \"(20*ER)\"\nsamples = 1\n",
    )
    .unwrap();
    experiment
}

#[test]
fn test_load_converts_stale_configs() {
    let work = tempfile::tempdir().unwrap();
    let experiment = stale_experiment(work.path());

    let loaded = load_config_maps(
        experiment.dir(),
        &[Stage::Data, Stage::Rec],
        &LoadOptions::default(),
    )
    .unwrap();

    assert!(loaded.converted);
    assert_eq!(loaded.main.get_int("converter_ver"), Some(CONVERTER_VERSION));
    assert_eq!(
        loaded.stage(Stage::Data).unwrap().get_float("intensity_threshold"),
        Some(25.0)
    );
    assert_eq!(
        loaded.stage(Stage::Rec).unwrap().get_float("hio_beta"),
        Some(0.9)
    );
    // absent stage files are skipped silently
    assert!(loaded.stage(Stage::Prep).is_none());
    assert!(loaded.warnings.is_empty());

    // a second load sees current files and does not convert again
    let again = load_config_maps(experiment.dir(), &[Stage::Rec], &LoadOptions::default()).unwrap();
    assert!(!again.converted);
}

#[test]
fn test_load_honors_rec_id() {
    let work = tempfile::tempdir().unwrap();
    let experiment = stale_experiment(work.path());

    let options = LoadOptions {
        rec_id: Some("lowres".to_string()),
        no_verify: false,
    };
    let loaded = load_config_maps(experiment.dir(), &[Stage::Rec], &options).unwrap();
    assert_eq!(
        loaded.stage(Stage::Rec).unwrap().get_int("reconstructions"),
        Some(1)
    );
}

#[test]
fn test_load_rejects_bad_config_unless_no_verify() {
    let work = tempfile::tempdir().unwrap();
    let experiment = stale_experiment(work.path());
    fs::write(
        experiment.conf_dir().join("config_disp"),
        "crop = (0.5,0.5,0.5)\nmystery_knob = 7\n",
    )
    .unwrap();

    let err =
        load_config_maps(experiment.dir(), &[Stage::Disp], &LoadOptions::default()).unwrap_err();
    assert!(err.to_string().contains("mystery_knob"), "{err}");

    let options = LoadOptions {
        rec_id: None,
        no_verify: true,
    };
    let loaded = load_config_maps(experiment.dir(), &[Stage::Disp], &options).unwrap();
    assert_eq!(loaded.warnings.len(), 1);
    assert!(loaded.stage(Stage::Disp).is_some());
}

#[test]
fn test_load_requires_main_config() {
    let work = tempfile::tempdir().unwrap();
    let missing = work.path().join("nope");
    assert!(load_config_maps(&missing, &[], &LoadOptions::default()).is_err());
}
