//! Durable storage of the data store with file locking.
//!
//! The whole store is written as one JSON document. Writes go to a temp file
//! in the same directory under an exclusive lock and are renamed over the
//! target, so readers never observe a half-written store.

use crate::{schema, DataStore, Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Durable-commit operation for the store
pub trait StoreSink {
    fn commit(&mut self, store: &DataStore) -> Result<()>;
}

/// JSON-file-backed store sink
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store this sink writes to
    pub fn load(&self) -> Result<DataStore> {
        DataStore::load(&self.path)
    }
}

impl StoreSink for JsonFileSink {
    fn commit(&mut self, store: &DataStore) -> Result<()> {
        store.save(&self.path)
    }
}

impl DataStore {
    /// Load the store from a file with shared locking
    ///
    /// Returns an empty store if the file doesn't exist. A file that exists
    /// but cannot be decoded is an error, since committing an empty store
    /// over it would destroy the user's data.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No store file at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let store = schema::decode(&contents).map_err(|e| {
            Error::Store(format!("store file {:?} is unreadable: {}", path, e))
        })?;

        tracing::debug!(
            "Loaded store from {:?} ({} routines, {} templates, {} logs)",
            path,
            store.routines.len(),
            store.templates.len(),
            store.logs.len()
        );
        Ok(store)
    }

    /// Save the store to a file with exclusive locking
    ///
    /// Atomically writes the store by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;

        // Serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = schema::encode(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved store to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnalyticsLog;
    use chrono::Utc;

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");

        let mut store = DataStore::new();
        let routine = store.add_routine("Push Day", Utc::now());
        let bench = store.add_template("Bench Press", "Chest").unwrap();
        let exercise = store.add_exercise(routine, bench, 90).unwrap();
        store.add_set(exercise, 135.0, 5).unwrap();

        store.save(&path).unwrap();
        let loaded = DataStore::load(&path).unwrap();

        assert_eq!(loaded, store);
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = DataStore::load(&temp_dir.path().join("missing.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupted_store_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let result = DataStore::load(&path);
        assert!(matches!(result, Err(Error::Store(_))));
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");

        DataStore::new().save(&path).unwrap();

        assert!(path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "store.json")
            .collect();
        assert!(extras.is_empty(), "Expected only store.json, found extras: {:?}", extras);
    }

    #[test]
    fn test_commit_through_trait_object() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut json = JsonFileSink::new(temp_dir.path().join("store.json"));
        let sink: &mut dyn StoreSink = &mut json;

        let mut store = DataStore::new();
        store.add_log(AnalyticsLog::new("Bodyweight", 180.0, Utc::now()));
        sink.commit(&store).unwrap();

        assert_eq!(json.load().unwrap(), store);
    }

    #[test]
    fn test_commit_fails_when_parent_is_a_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocker = temp_dir.path().join("data");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut sink = JsonFileSink::new(blocker.join("store.json"));
        assert!(sink.commit(&DataStore::new()).is_err());
        assert_eq!(std::fs::read_to_string(&blocker).unwrap(), "not a directory");
    }

    #[test]
    fn test_json_sink_commit() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut sink = JsonFileSink::new(temp_dir.path().join("data").join("store.json"));

        let mut store = DataStore::new();
        store.add_template("Squat", "Legs").unwrap();

        sink.commit(&store).unwrap();
        assert_eq!(sink.load().unwrap(), store);
    }
}
