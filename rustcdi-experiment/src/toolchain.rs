//! External stage program descriptions.
//!
//! A beamline points the launcher at its own processing scripts through a
//! small JSON file; without one the standard program names are used and
//! resolved through `PATH`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::stages::StageKind;
use crate::{Error, Result};

/// The external programs implementing the four processing stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Toolchain {
    /// Directory prepended to bare program names, if set.
    pub scripts_dir: Option<PathBuf>,
    /// Raw-data preparation program.
    pub prep: String,
    /// Data formatting program.
    pub data: String,
    /// Reconstruction program.
    pub rec: String,
    /// Visualization program.
    pub disp: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            scripts_dir: None,
            prep: "cdi-prep".to_string(),
            data: "cdi-format".to_string(),
            rec: "cdi-rec".to_string(),
            disp: "cdi-disp".to_string(),
        }
    }
}

impl Toolchain {
    /// Resolves the program path for a stage.
    ///
    /// `scripts_dir` is prepended to bare names only; a name that already
    /// carries a path is used as written.
    pub fn program(&self, stage: StageKind) -> PathBuf {
        let name = match stage {
            StageKind::Prep => &self.prep,
            StageKind::Data => &self.data,
            StageKind::Rec => &self.rec,
            StageKind::Disp => &self.disp,
        };
        if let Some(dir) = &self.scripts_dir {
            if Path::new(name).components().count() == 1 {
                return dir.join(name);
            }
        }
        PathBuf::from(name)
    }

    /// Loads a toolchain description from a JSON file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not a valid description.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|source| Error::Toolchain {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Saves the toolchain description to a JSON file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self).map_err(|source| Error::Toolchain {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let toolchain = Toolchain::default();
        assert_eq!(toolchain.program(StageKind::Prep), PathBuf::from("cdi-prep"));
        assert_eq!(toolchain.program(StageKind::Disp), PathBuf::from("cdi-disp"));
    }

    #[test]
    fn test_scripts_dir_applies_to_bare_names_only() {
        let toolchain = Toolchain {
            scripts_dir: Some(PathBuf::from("/opt/beamline/bin")),
            rec: "/usr/local/bin/custom-rec".to_string(),
            ..Toolchain::default()
        };
        assert_eq!(
            toolchain.program(StageKind::Prep),
            PathBuf::from("/opt/beamline/bin/cdi-prep")
        );
        assert_eq!(
            toolchain.program(StageKind::Rec),
            PathBuf::from("/usr/local/bin/custom-rec")
        );
    }

    #[test]
    fn test_json_round_trip_with_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolchain.json");
        // missing fields fall back to the defaults
        std::fs::write(&path, "{\"prep\": \"beamline-prep\"}").unwrap();
        let toolchain = Toolchain::from_file(&path).unwrap();
        assert_eq!(toolchain.prep, "beamline-prep");
        assert_eq!(toolchain.data, "cdi-format");

        toolchain.to_file(&path).unwrap();
        assert_eq!(Toolchain::from_file(&path).unwrap(), toolchain);
    }
}
