// SPDX-License-Identifier: AGPL-3.0-or-later

//! Filesystem-backed JSON store.
//!
//! Every entity is a single JSON file; writes go through a temp file and an
//! atomic rename, so a file either holds the previous committed state or the
//! new one. That rename is the commit point for each logical step of the
//! wallet pipeline.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use super::StoragePaths;

/// Error type for store operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations
    Io(io::Error),
    /// JSON serialization/deserialization error
    Json(serde_json::Error),
    /// Entity not found
    NotFound(String),
    /// Entity already exists (unique constraint violation)
    AlreadyExists(String),
    /// Store not initialized
    NotInitialized,
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::Json(e) => write!(f, "JSON error: {e}"),
            StorageError::NotFound(entity) => write!(f, "not found: {entity}"),
            StorageError::AlreadyExists(entity) => write!(f, "already exists: {entity}"),
            StorageError::NotInitialized => write!(f, "store not initialized"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(e.to_string())
        } else {
            StorageError::Io(e)
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Json(e)
    }
}

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// JSON-file store for accounts and transaction records.
#[derive(Debug, Clone)]
pub struct JsonStore {
    paths: StoragePaths,
    initialized: bool,
}

impl JsonStore {
    /// Create a new JsonStore instance.
    ///
    /// Does NOT create the directory structure. Call `initialize()` first.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create the directory structure under the root.
    ///
    /// Safe to call multiple times (idempotent).
    pub fn initialize(&mut self) -> StorageResult<()> {
        let dirs = [self.paths.accounts_dir(), self.paths.txs_dir()];

        for dir in dirs {
            fs::create_dir_all(&dir)?;
        }

        self.initialized = true;
        Ok(())
    }

    /// Read a JSON file and deserialize it.
    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> StorageResult<T> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let value = serde_json::from_reader(reader)?;
        Ok(value)
    }

    /// Write a JSON file (atomic write via rename).
    pub fn write_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }

        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Write a JSON file only if it does not exist yet.
    ///
    /// Uses `O_CREAT | O_EXCL`, so of two concurrent creators exactly one
    /// wins; the loser gets `AlreadyExists` without touching the winner's
    /// file. An exists-then-write sequence cannot give that guarantee.
    pub fn create_json<T: Serialize>(
        &self,
        path: impl AsRef<Path>,
        value: &T,
    ) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        Ok(())
    }

    /// Check if a file exists.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    /// Delete a file.
    pub fn delete(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }
        fs::remove_file(path.as_ref())?;
        Ok(())
    }

    /// List the file stems (entity keys) in a directory for one extension.
    pub fn list_keys(&self, dir: impl AsRef<Path>, extension: &str) -> StorageResult<Vec<String>> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file()
                && path.extension().is_some_and(|ext| ext == extension)
            {
                if let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) {
                    keys.push(key.to_string());
                }
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    fn test_store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = JsonStore::new(StoragePaths::new(dir.path()));
        store.initialize().expect("initialize store");
        (dir, store)
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        id: String,
        value: i32,
    }

    #[test]
    fn initialize_creates_directories() {
        let (_dir, store) = test_store();

        assert!(store.paths().accounts_dir().exists());
        assert!(store.paths().txs_dir().exists());
    }

    #[test]
    fn write_and_read_json() {
        let (_dir, store) = test_store();
        let data = TestData {
            id: "test-1".to_string(),
            value: 42,
        };

        let path = store.paths().txs_dir().join("test.json");
        store.write_json(&path, &data).unwrap();

        let read: TestData = store.read_json(&path).unwrap();
        assert_eq!(read, data);
    }

    #[test]
    fn list_keys_returns_stems() {
        let (_dir, store) = test_store();

        for i in 1..=3 {
            let path = store.paths().txs_dir().join(format!("0xtx{i}.json"));
            store
                .write_json(
                    &path,
                    &TestData {
                        id: format!("0xtx{i}"),
                        value: i,
                    },
                )
                .unwrap();
        }

        let keys = store.list_keys(store.paths().txs_dir(), "json").unwrap();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&"0xtx1".to_string()));
        assert!(keys.contains(&"0xtx3".to_string()));
    }

    #[test]
    fn create_json_refuses_existing_file() {
        let (_dir, store) = test_store();
        let path = store.paths().accounts_dir().join("owner-1.json");

        let first = TestData {
            id: "first".to_string(),
            value: 1,
        };
        store.create_json(&path, &first).unwrap();

        // The losing writer fails and the winner's content survives.
        let second = TestData {
            id: "second".to_string(),
            value: 2,
        };
        let result = store.create_json(&path, &second);
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));

        let read: TestData = store.read_json(&path).unwrap();
        assert_eq!(read, first);
    }

    #[test]
    fn delete_file_removes_it() {
        let (_dir, store) = test_store();

        let path = store.paths().accounts_dir().join("to-delete.json");
        store
            .write_json(
                &path,
                &TestData {
                    id: "del".to_string(),
                    value: 0,
                },
            )
            .unwrap();

        assert!(store.exists(&path));
        store.delete(&path).unwrap();
        assert!(!store.exists(&path));
    }

    #[test]
    fn uninitialized_store_returns_error() {
        let store = JsonStore::new(StoragePaths::new("/tmp/never-init"));

        let result = store.read_json::<TestData>("/tmp/any.json");
        assert!(matches!(result, Err(StorageError::NotInitialized)));
    }

    #[test]
    fn reading_missing_file_is_not_found() {
        let (_dir, store) = test_store();

        let result = store.read_json::<TestData>(store.paths().txs_dir().join("missing.json"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
