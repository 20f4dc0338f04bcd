use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use thiserror::Error;
use tracing::debug;

use crate::catalog::ColumnKey;

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to read preferences '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse preferences '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to encode preferences '{path}': {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write preferences '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where column choices live between sessions. Values are the strings
/// `"true"` / `"false"`, one entry per optional column, the same shape a
/// browser cookie jar would hold.
pub trait PreferenceChannel {
    fn load(&self) -> Result<HashMap<String, String>, PreferenceError>;

    fn store(&mut self, key: ColumnKey, visible: bool) -> Result<(), PreferenceError>;

    fn store_many(&mut self, changes: &[(ColumnKey, bool)]) -> Result<(), PreferenceError> {
        for (key, visible) in changes {
            self.store(*key, *visible)?;
        }
        Ok(())
    }
}

pub fn is_truthy(value: &str) -> bool {
    value.trim() == "true"
}

fn flag(visible: bool) -> String {
    let value = if visible { "true" } else { "false" };
    value.to_string()
}

#[derive(Clone, Debug, Default)]
pub struct MemoryPreferences {
    entries: HashMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: ColumnKey) -> Option<&str> {
        self.entries.get(key.as_str()).map(String::as_str)
    }
}

impl PreferenceChannel for MemoryPreferences {
    fn load(&self) -> Result<HashMap<String, String>, PreferenceError> {
        Ok(self.entries.clone())
    }

    fn store(&mut self, key: ColumnKey, visible: bool) -> Result<(), PreferenceError> {
        self.entries.insert(key.as_str().to_string(), flag(visible));
        Ok(())
    }
}

/// A YAML map on disk, e.g. `~/.avrsearch/columns.yml`.
#[derive(Clone, Debug)]
pub struct PreferenceFile {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl PreferenceFile {
    /// Reads the file if it exists; a missing file is an empty preference set.
    pub fn open(path: &Path) -> Result<Self, PreferenceError> {
        let entries = match std::fs::read_to_string(path) {
            Ok(contents) => parse_entries(&contents).map_err(|source| PreferenceError::Parse {
                path: path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored column preferences");
                BTreeMap::new()
            }
            Err(source) => {
                return Err(PreferenceError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), PreferenceError> {
        let write_err = |source| PreferenceError::Write {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let body = serde_yaml::to_string(&self.entries).map_err(|source| PreferenceError::Encode {
            path: self.path.display().to_string(),
            source,
        })?;
        let out = format!("# Column visibility, written by avrsearch\n{body}");
        std::fs::write(&self.path, out).map_err(write_err)
    }
}

// Accept quoted strings as well as bare YAML booleans, so hand-edited files
// with `host: true` keep working.
fn parse_entries(contents: &str) -> Result<BTreeMap<String, String>, serde_yaml::Error> {
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let raw: BTreeMap<String, Value> = serde_yaml::from_str(contents)?;
    Ok(raw
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::Bool(b) => Some((k, flag(b))),
            Value::String(s) => Some((k, s)),
            _ => None,
        })
        .collect())
}

impl PreferenceChannel for PreferenceFile {
    fn load(&self) -> Result<HashMap<String, String>, PreferenceError> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn store(&mut self, key: ColumnKey, visible: bool) -> Result<(), PreferenceError> {
        self.entries.insert(key.as_str().to_string(), flag(visible));
        self.flush()
    }

    fn store_many(&mut self, changes: &[(ColumnKey, bool)]) -> Result<(), PreferenceError> {
        for (key, visible) in changes {
            self.entries.insert(key.as_str().to_string(), flag(*visible));
        }
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("avrsearch-prefs-{}-{name}", std::process::id()))
            .join("columns.yml")
    }

    #[test]
    fn missing_file_is_empty() {
        let prefs = PreferenceFile::open(&temp_path("missing")).unwrap();
        assert!(prefs.load().unwrap().is_empty());
    }

    #[test]
    fn stored_values_survive_reopen() {
        let path = temp_path("reopen");
        let mut prefs = PreferenceFile::open(&path).unwrap();
        prefs.store(ColumnKey::LotNumber, true).unwrap();
        prefs
            .store_many(&[(ColumnKey::Host, false), (ColumnKey::Rrid, true)])
            .unwrap();

        let reopened = PreferenceFile::open(&path).unwrap().load().unwrap();
        assert_eq!(reopened.get("lot_number").map(String::as_str), Some("true"));
        assert_eq!(reopened.get("host").map(String::as_str), Some("false"));
        assert_eq!(reopened.get("rrid").map(String::as_str), Some("true"));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn hand_edited_entries_survive_a_toggle() {
        let path = temp_path("hand-edited");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "\"note: x\": 'say \"hi\"'\nhost: true\n").unwrap();

        let mut prefs = PreferenceFile::open(&path).unwrap();
        prefs.store(ColumnKey::LotNumber, true).unwrap();

        let reopened = PreferenceFile::open(&path).unwrap().load().unwrap();
        assert_eq!(reopened.get("note: x").map(String::as_str), Some("say \"hi\""));
        assert_eq!(reopened.get("host").map(String::as_str), Some("true"));
        assert_eq!(reopened.get("lot_number").map(String::as_str), Some("true"));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn bare_booleans_are_accepted() {
        let parsed = parse_entries("host: true\nrrid: \"false\"\nnested: [1]\n").unwrap();
        assert_eq!(parsed.get("host").map(String::as_str), Some("true"));
        assert_eq!(parsed.get("rrid").map(String::as_str), Some("false"));
        assert!(!parsed.contains_key("nested"));
    }

    #[test]
    fn truthiness_is_exact() {
        assert!(is_truthy("true"));
        assert!(is_truthy(" true "));
        assert!(!is_truthy("TRUE1"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("1"));
    }
}
