//! Line-oriented configuration file codec.
//!
//! A configuration file holds one `name = literal` pair per line. Blank
//! lines and `//` comment lines are allowed and dropped on read. Insertion
//! order is preserved on write so saved files stay diffable.

use std::fs;
use std::path::{Path, PathBuf};

use crate::verify::{self, Stage};
use crate::{Error, Result, Value};

/// An ordered mapping of parameter name to literal value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigMap {
    entries: Vec<(String, Value)>,
}

impl ConfigMap {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the mapping has no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the parameter is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    /// Returns the value of a parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == name).then_some(v))
    }

    /// Returns a string parameter.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Returns an integer parameter.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    /// Returns a numeric parameter, widening integers to floats.
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    /// Returns a boolean parameter.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Sets a parameter, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Removes a parameter, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Renames a parameter in place, keeping its position.
    ///
    /// When the new name already exists the old entry is dropped and the
    /// existing value wins. Returns true if the mapping changed.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        if self.contains(new) {
            return self.remove(old).is_some();
        }
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == old) {
            entry.0 = new.to_string();
            return true;
        }
        false
    }

    /// Iterates over parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parses configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] with the offending line number on malformed
    /// lines, bad literals, or duplicate parameters.
    pub fn parse(text: &str) -> Result<Self> {
        let mut map = Self::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
            let Some((name, literal)) = trimmed.split_once('=') else {
                return Err(Error::Parse {
                    line,
                    reason: format!("expected 'name = value', found '{trimmed}'"),
                });
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::Parse {
                    line,
                    reason: "empty parameter name".to_string(),
                });
            }
            if map.contains(name) {
                return Err(Error::Parse {
                    line,
                    reason: format!("duplicate parameter '{name}'"),
                });
            }
            let value = Value::parse(literal.trim()).map_err(|err| Error::Parse {
                line,
                reason: err.to_string(),
            })?;
            map.entries.push((name.to_string(), value));
        }
        Ok(map)
    }

    /// Serializes the mapping to configuration text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.entries {
            out.push_str(name);
            out.push_str(" = ");
            out.push_str(&value.to_string());
            out.push('\n');
        }
        out
    }
}

/// Reads and parses a configuration file.
pub fn read_config<P: AsRef<Path>>(path: P) -> Result<ConfigMap> {
    let text = fs::read_to_string(path)?;
    ConfigMap::parse(&text)
}

/// Writes a configuration file without verification.
pub fn write_config<P: AsRef<Path>>(map: &ConfigMap, path: P) -> Result<()> {
    fs::write(path, map.to_text())?;
    Ok(())
}

/// Writes a stage configuration file through a verified temp file.
///
/// The mapping is serialized to a `temp` file inside the conf directory and
/// verified against the schema derived from `name`. Only a mapping that
/// passes verification replaces the destination file; on failure the temp
/// file is removed and the error returned. Files whose name maps to no
/// known stage are written without verification.
pub fn write_config_verified(map: &ConfigMap, conf_dir: &Path, name: &str) -> Result<PathBuf> {
    fs::create_dir_all(conf_dir)?;
    let temp = conf_dir.join("temp");
    fs::write(&temp, map.to_text())?;
    if let Some(stage) = Stage::from_config_name(name) {
        if let Err(err) = verify::verify(stage, map) {
            let _ = fs::remove_file(&temp);
            return Err(err.into());
        }
    }
    let dest = conf_dir.join(name);
    fs::rename(&temp, &dest)?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let text = "\n// main configuration\nworking_dir = \"/data/cdi\"\n\nexperiment_id = \"ab\"\n";
        let map = ConfigMap::parse(text).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_str("working_dir"), Some("/data/cdi"));
        assert_eq!(map.get_str("experiment_id"), Some("ab"));
    }

    #[test]
    fn test_parse_reports_line_numbers() {
        let text = "working_dir = \"/data\"\nbroken line\n";
        let err = ConfigMap::parse(text).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        let text = "scan = \"54\"\nscan = \"57\"\n";
        let err = ConfigMap::parse(text).unwrap_err();
        assert!(err.to_string().contains("duplicate"), "{err}");
    }

    #[test]
    fn test_to_text_preserves_insertion_order() {
        let mut map = ConfigMap::new();
        map.insert("working_dir", Value::Str("/data".to_string()));
        map.insert("experiment_id", Value::Str("ab".to_string()));
        map.insert("scan", Value::Str("54".to_string()));
        assert_eq!(
            map.to_text(),
            "working_dir = \"/data\"\nexperiment_id = \"ab\"\nscan = \"54\"\n"
        );
    }

    #[test]
    fn test_rename_keeps_position() {
        let mut map = ConfigMap::new();
        map.insert("beta", Value::Float(0.9));
        map.insert("device", Value::Tuple(vec![Value::Int(0)]));
        assert!(map.rename("beta", "hio_beta"));
        let names: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["hio_beta", "device"]);
        assert!(!map.rename("beta", "hio_beta"));
    }

    #[test]
    fn test_write_config_verified_rejects_bad_stage_config() {
        let dir = tempfile::tempdir().unwrap();
        // Missing the required intensity_threshold.
        let mut map = ConfigMap::new();
        map.insert("binning", Value::Tuple(vec![Value::Int(1), Value::Int(1)]));
        let err = write_config_verified(&map, dir.path(), "config_data").unwrap_err();
        assert!(matches!(err, Error::Verify(_)), "{err}");
        assert!(!dir.path().join("config_data").exists());
        assert!(!dir.path().join("temp").exists());
    }

    #[test]
    fn test_write_config_verified_writes_good_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = ConfigMap::new();
        map.insert("intensity_threshold", Value::Float(2.0));
        let dest = write_config_verified(&map, dir.path(), "config_data").unwrap();
        assert_eq!(read_config(dest).unwrap(), map);
        assert!(!dir.path().join("temp").exists());
    }
}
