//! Directory-level migration of a stale experiment conf directory.

use std::fs;

use rustcdi_config::{convert_dir, read_config, verify, Stage, CONVERTER_VERSION};

fn write(dir: &std::path::Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).unwrap();
}

#[test]
fn test_stale_conf_dir_migrates_to_current_schema() {
    let dir = tempfile::tempdir().unwrap();
    let conf = dir.path();

    write(
        conf,
        "config",
        "working_dir = \"/data/cdi\"\nexperiment_id = \"ab\"\nscan = \"54\"\nsimulation = False\n",
    );
    write(
        conf,
        "config_prep",
        "darkfile = \"dark.tif\"\nwhitefile = \"white.tif\"\n",
    );
    write(
        conf,
        "config_data",
        "amp_threshold = 25\naliens = [[170,220,112,195,0,35]]\n",
    );
    write(
        conf,
        "config_rec",
        "samples = 5\nbeta = .9\nalgorithm_sequence = \"((3,(\\\"ER\\\",20),(\\\"HIO\\\",180)))\"\npcdi_trigger = (50,50)\n",
    );
    write(conf, "config_rec_lowres", "samples = 1\nbeta = .8\nalgorithm_sequence = \"(20*ER)\"\n");
    write(conf, "notes.txt", "scratch file, not a config\n");

    assert!(convert_dir(conf).unwrap());

    let main = read_config(conf.join("config")).unwrap();
    assert_eq!(main.get_int("converter_ver"), Some(CONVERTER_VERSION));
    assert!(!main.contains("simulation"));
    verify(Stage::Main, &main).unwrap();

    let prep = read_config(conf.join("config_prep")).unwrap();
    assert_eq!(prep.get_str("darkfield_filename"), Some("dark.tif"));
    verify(Stage::Prep, &prep).unwrap();

    let data = read_config(conf.join("config_data")).unwrap();
    assert_eq!(data.get_float("intensity_threshold"), Some(25.0));
    assert_eq!(data.get_str("alien_alg"), Some("block_aliens"));
    verify(Stage::Data, &data).unwrap();

    let rec = read_config(conf.join("config_rec")).unwrap();
    assert_eq!(rec.get_int("reconstructions"), Some(5));
    assert_eq!(rec.get_int("pc_interval"), Some(50));
    verify(Stage::Rec, &rec).unwrap();

    // alternate reconstruction configs migrate too
    let alt = read_config(conf.join("config_rec_lowres")).unwrap();
    assert_eq!(alt.get_int("reconstructions"), Some(1));
    verify(Stage::Rec, &alt).unwrap();

    // unrecognized files are untouched
    assert_eq!(
        fs::read_to_string(conf.join("notes.txt")).unwrap(),
        "scratch file, not a config\n"
    );
}

#[test]
fn test_current_conf_dir_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let conf = dir.path();
    let text = format!(
        "working_dir = \"/data/cdi\"\nexperiment_id = \"ab\"\nconverter_ver = {CONVERTER_VERSION}\n"
    );
    write(conf, "config", &text);

    assert!(!convert_dir(conf).unwrap());
    assert_eq!(fs::read_to_string(conf.join("config")).unwrap(), text);
}
