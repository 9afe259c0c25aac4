use atomic_write_file::AtomicWriteFile;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use super::types::{History, HISTORY_VERSION};
use crate::error::{Error, Result};

/// Persistent per-ruleset monitoring history.
///
/// Callers serialise read-modify-write cycles per name; implementations
/// only need each single call to be safe.
pub trait HistoryStore: Send + Sync {
    /// Load the history of `name`. A missing history is empty, not an error.
    fn load(&self, name: &str) -> Result<History>;

    fn save(&self, name: &str, history: &History) -> Result<()>;

    /// Identifies where `name` is stored. Runs whose names share a key
    /// touch the same history and are serialised together.
    fn lock_key(&self, name: &str) -> String {
        name.to_string()
    }
}

/// One pretty-printed JSON file per ruleset inside a directory.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    dir: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the history of `name`. Bytes outside `[A-Za-z0-9_-]`
    /// are percent-encoded, so distinct names get distinct files and no
    /// name can escape the directory.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.history.json", encode_name(name)))
    }
}

fn encode_name(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self, name: &str) -> Result<History> {
        let path = self.path_for(name);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(History::new()),
            Err(e) => return Err(Error::io(path, e)),
        };

        let history: History = serde_json::from_reader(file).map_err(|source| Error::CorruptHistory {
            name: name.to_string(),
            source,
        })?;
        if history.version != HISTORY_VERSION {
            return Err(Error::UnsupportedHistoryVersion {
                name: name.to_string(),
                version: history.version,
            });
        }
        Ok(history)
    }

    /// Written atomically, so a crash never leaves a half-written file.
    fn save(&self, name: &str, history: &History) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;

        let path = self.path_for(name);
        let mut file = AtomicWriteFile::open(&path).map_err(|e| Error::io(&path, e))?;
        serde_json::to_writer_pretty(&mut file, history).map_err(|e| Error::Serialize(e.to_string()))?;
        file.commit().map_err(|e| Error::io(&path, e))?;

        debug!(path = %path.display(), points = history.points().len(), "saved history");
        Ok(())
    }

    fn lock_key(&self, name: &str) -> String {
        self.path_for(name).to_string_lossy().into_owned()
    }
}

/// In-process store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    histories: Mutex<HashMap<String, History>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self, name: &str) -> Result<History> {
        let histories = self.histories.lock().unwrap_or_else(|e| e.into_inner());
        Ok(histories.get(name).cloned().unwrap_or_default())
    }

    fn save(&self, name: &str, history: &History) -> Result<()> {
        let mut histories = self.histories.lock().unwrap_or_else(|e| e.into_inner());
        histories.insert(name.to_string(), history.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::types::HistoryPoint;
    use chrono::Utc;

    fn sample_history() -> History {
        let mut history = History::new();
        history.push(HistoryPoint {
            timestamp: Utc::now(),
            quality_score: 85,
            test_accuracy: 0.95,
            performance_speed: 12000.0,
            validation_passed: true,
            issues_found: 1,
        });
        history
    }

    #[test]
    fn test_load_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path());
        let history = store.load("de_hydraulics").unwrap();
        assert_eq!(history.version, HISTORY_VERSION);
        assert!(history.points().is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        // nested directory is created on save
        let store = JsonHistoryStore::new(dir.path().join("history"));
        let history = sample_history();

        store.save("de_hydraulics", &history).unwrap();
        let loaded = store.load("de_hydraulics").unwrap();
        assert_eq!(loaded, history);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path());
        fs::write(store.path_for("broken"), "{ not json").unwrap();

        let err = store.load("broken").unwrap_err();
        assert!(matches!(err, Error::CorruptHistory { ref name, .. } if name == "broken"));
    }

    #[test]
    fn test_unsupported_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path());
        fs::write(store.path_for("old"), r#"{"version": 7, "points": []}"#).unwrap();

        let err = store.load("old").unwrap_err();
        assert!(matches!(err, Error::UnsupportedHistoryVersion { version: 7, .. }));
    }

    #[test]
    fn test_path_is_sanitised() {
        let store = JsonHistoryStore::new("/tmp/h");
        assert_eq!(
            store.path_for("../etc/passwd"),
            PathBuf::from("/tmp/h/%2E%2E%2Fetc%2Fpasswd.history.json")
        );
        assert_eq!(
            store.path_for("de_hydraulics"),
            PathBuf::from("/tmp/h/de_hydraulics.history.json")
        );
    }

    #[test]
    fn test_similar_names_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path());
        let names = ["a.b", "a_b", "a%2Eb", "a/b"];

        let paths: std::collections::HashSet<PathBuf> = names.iter().map(|n| store.path_for(n)).collect();
        assert_eq!(paths.len(), names.len());

        store.save("a.b", &sample_history()).unwrap();
        assert!(store.load("a_b").unwrap().points().is_empty());
        assert_eq!(store.load("a.b").unwrap().points().len(), 1);
        assert_ne!(store.lock_key("a.b"), store.lock_key("a_b"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryHistoryStore::new();
        assert!(store.load("x").unwrap().points().is_empty());
        store.save("x", &sample_history()).unwrap();
        assert_eq!(store.load("x").unwrap().points().len(), 1);
    }
}
