//! Experiment directory conventions.
//!
//! An experiment lives at `<working_dir>/<name>` where the name is the
//! experiment id, suffixed with `_<scan>` when a scan selection is present.
//! Configuration files live in the `conf` subdirectory; processing stages
//! drop their outputs elsewhere under the experiment directory.

use std::fs;
use std::path::{Path, PathBuf};

use rustcdi_config::Stage;

use crate::{Error, Result};

/// Builds the experiment directory name from id and optional scan.
///
/// Whitespace is stripped from the scan (`"54 - 57"` and `"54-57"` name the
/// same experiment).
pub fn experiment_name(id: &str, scan: Option<&str>) -> String {
    let id = id.trim();
    let scan: Option<String> = scan
        .map(|s| s.split_whitespace().collect())
        .filter(|s: &String| !s.is_empty());
    match scan {
        Some(scan) => format!("{id}_{scan}"),
        None => id.to_string(),
    }
}

/// Handle to an experiment directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experiment {
    dir: PathBuf,
}

impl Experiment {
    /// Creates (or reuses) the experiment directory for the given identity
    /// under the working directory, including its `conf` subdirectory.
    ///
    /// # Errors
    ///
    /// Fails on an empty id or when the directories cannot be created.
    pub fn create(working_dir: &Path, id: &str, scan: Option<&str>) -> Result<Self> {
        if id.trim().is_empty() {
            return Err(Error::EmptyId);
        }
        let experiment = Self {
            dir: working_dir.join(experiment_name(id, scan)),
        };
        experiment.assure_dirs()?;
        Ok(experiment)
    }

    /// Opens an existing experiment directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAnExperiment`] when `conf/config` is missing.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.join("conf").join("config").is_file() {
            return Err(Error::NotAnExperiment(dir));
        }
        Ok(Self { dir })
    }

    /// The experiment directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The configuration directory.
    pub fn conf_dir(&self) -> PathBuf {
        self.dir.join("conf")
    }

    /// Creates the experiment and conf directories if missing.
    pub fn assure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.conf_dir())?;
        Ok(())
    }

    /// Path of the main configuration file.
    pub fn main_config_path(&self) -> PathBuf {
        self.conf_dir().join(Stage::Main.config_name())
    }

    /// Path of a stage configuration file.
    ///
    /// A `rec_id` selects the alternate reconstruction configuration
    /// `config_rec_<id>`; it is ignored for every other stage.
    pub fn stage_config_path(&self, stage: Stage, rec_id: Option<&str>) -> PathBuf {
        match (stage, rec_id) {
            (Stage::Rec, Some(id)) => self.conf_dir().join(format!("config_rec_{id}")),
            _ => self.conf_dir().join(stage.config_name()),
        }
    }

    /// Lists the alternate reconstruction configuration ids, sorted.
    pub fn rec_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.conf_dir())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(id) = name.strip_prefix("config_rec_") {
                if !id.is_empty() {
                    ids.push(id.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Clones the main reconstruction configuration into a new alternate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecIdInUse`] when the alternate already exists and
    /// an I/O error when `config_rec` cannot be copied.
    pub fn add_rec_config(&self, id: &str) -> Result<PathBuf> {
        let dest = self.stage_config_path(Stage::Rec, Some(id));
        if dest.exists() {
            return Err(Error::RecIdInUse(id.to_string()));
        }
        let src = self.stage_config_path(Stage::Rec, None);
        fs::copy(&src, &dest)?;
        Ok(dest)
    }

    /// Returns true if any of the named files exists anywhere under the
    /// experiment directory.
    ///
    /// Stage outputs land at beamline-dependent depths, so the probe walks
    /// the whole tree. Unreadable subdirectories are skipped.
    pub fn contains_file(&self, names: &[&str]) -> bool {
        walk_contains(&self.dir, names)
    }
}

fn walk_contains(dir: &Path, names: &[&str]) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if walk_contains(&path, names) {
                return true;
            }
        } else if path
            .file_name()
            .is_some_and(|name| names.iter().any(|n| name == std::ffi::OsStr::new(n)))
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_name() {
        assert_eq!(experiment_name("ab", None), "ab");
        assert_eq!(experiment_name(" ab ", Some("54")), "ab_54");
        assert_eq!(experiment_name("ab", Some("54 - 57")), "ab_54-57");
        assert_eq!(experiment_name("ab", Some("  ")), "ab");
    }

    #[test]
    fn test_create_makes_conf_dir() {
        let work = tempfile::tempdir().unwrap();
        let experiment = Experiment::create(work.path(), "ab", Some("54")).unwrap();
        assert_eq!(experiment.dir(), work.path().join("ab_54"));
        assert!(experiment.conf_dir().is_dir());
    }

    #[test]
    fn test_create_rejects_empty_id() {
        let work = tempfile::tempdir().unwrap();
        assert!(matches!(
            Experiment::create(work.path(), "  ", None),
            Err(Error::EmptyId)
        ));
    }

    #[test]
    fn test_open_requires_main_config() {
        let work = tempfile::tempdir().unwrap();
        let experiment = Experiment::create(work.path(), "ab", None).unwrap();
        assert!(matches!(
            Experiment::open(experiment.dir()),
            Err(Error::NotAnExperiment(_))
        ));

        std::fs::write(experiment.main_config_path(), "experiment_id = \"ab\"\n").unwrap();
        assert!(Experiment::open(experiment.dir()).is_ok());
    }

    #[test]
    fn test_rec_ids_and_add_rec_config() {
        let work = tempfile::tempdir().unwrap();
        let experiment = Experiment::create(work.path(), "ab", None).unwrap();
        std::fs::write(
            experiment.stage_config_path(Stage::Rec, None),
            "algorithm_sequence = \"(20*ER)\"\n",
        )
        .unwrap();

        assert!(experiment.rec_ids().unwrap().is_empty());
        experiment.add_rec_config("lowres").unwrap();
        experiment.add_rec_config("ga").unwrap();
        assert_eq!(experiment.rec_ids().unwrap(), ["ga", "lowres"]);

        assert!(matches!(
            experiment.add_rec_config("ga"),
            Err(Error::RecIdInUse(_))
        ));
    }

    #[test]
    fn test_contains_file_walks_subdirectories() {
        let work = tempfile::tempdir().unwrap();
        let experiment = Experiment::create(work.path(), "ab", None).unwrap();
        let nested = experiment.dir().join("preprocessed_data");
        std::fs::create_dir_all(&nested).unwrap();

        assert!(!experiment.contains_file(&["prep_data.tif"]));
        std::fs::write(nested.join("prep_data.tif"), b"").unwrap();
        assert!(experiment.contains_file(&["prep_data.tif"]));
        assert!(experiment.contains_file(&["data.npy", "prep_data.tif"]));
    }
}
