//! On-disk store of per row solutions, the resume state of a batch
//!
//! Each solved row is a file `<key>.json` in the store directory. Writes go to a
//! hidden temporary file first and are persisted into place, so a crash never
//! leaves a partial record under a valid key.
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Name of the store directory, next to the results file
pub const CHECKPOINT_DIRECTORY: &str = "_tmp";
const EXTENSION: &str = "json";
/// Prefix of records still being written
const PARTIAL_PREFIX: &str = ".partial-";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckpointStore {
    directory: PathBuf,
}

impl CheckpointStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Store used for a results file: `<results_path>/../_tmp`
    ///
    /// # Examples
    /// ```rust
    /// use std::path::Path;
    /// use mmon_gcm_core::batch::checkpoint::CheckpointStore;
    /// let store = CheckpointStore::for_results("runs/results.csv");
    /// assert_eq!(store.directory(), Path::new("runs/_tmp"));
    /// ```
    pub fn for_results<P: AsRef<Path>>(results_path: P) -> Self {
        let parent = results_path
            .as_ref()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::new(parent.join(CHECKPOINT_DIRECTORY))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn exists(&self) -> bool {
        self.directory.is_dir()
    }

    /// Create the store directory if needed
    pub fn ensure(&self) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.directory).map_err(|err| CheckpointError::io(&self.directory, err))
    }

    fn path(&self, key: usize) -> PathBuf {
        self.directory.join(format!("{}.{}", key, EXTENSION))
    }

    pub fn contains(&self, key: usize) -> bool {
        self.path(key).is_file()
    }

    /// Keys of all stored records, files with other names are ignored
    pub fn keys(&self) -> Result<BTreeSet<usize>, CheckpointError> {
        let entries =
            fs::read_dir(&self.directory).map_err(|err| CheckpointError::io(&self.directory, err))?;
        let mut keys = BTreeSet::new();
        for entry in entries {
            let path = entry
                .map_err(|err| CheckpointError::io(&self.directory, err))?
                .path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(key) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<usize>().ok())
            {
                keys.insert(key);
            }
        }
        Ok(keys)
    }

    /// Store a record, replacing any existing record with the same key
    pub fn write<T: Serialize>(&self, key: usize, record: &T) -> Result<(), CheckpointError> {
        let contents = serde_json::to_vec(record).map_err(|err| CheckpointError::Serialize {
            key,
            message: err.to_string(),
        })?;
        let mut partial = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(&self.directory)
            .map_err(|err| CheckpointError::io(&self.directory, err))?;
        partial
            .write_all(&contents)
            .and_then(|()| partial.flush())
            .map_err(|err| CheckpointError::io(partial.path(), err))?;
        let destination = self.path(key);
        partial
            .persist(&destination)
            .map(|_| ())
            .map_err(|err| CheckpointError::io(&destination, err.error))
    }

    /// Delete records left half written by an interrupted run, returns how many
    pub fn remove_partial(&self) -> Result<usize, CheckpointError> {
        let entries =
            fs::read_dir(&self.directory).map_err(|err| CheckpointError::io(&self.directory, err))?;
        let mut removed = 0;
        for entry in entries {
            let path = entry
                .map_err(|err| CheckpointError::io(&self.directory, err))?
                .path();
            let is_partial = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(PARTIAL_PREFIX));
            if is_partial && path.is_file() {
                fs::remove_file(&path).map_err(|err| CheckpointError::io(&path, err))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn read<T: DeserializeOwned>(&self, key: usize) -> Result<T, CheckpointError> {
        let path = self.path(key);
        let contents = fs::read(&path).map_err(|err| CheckpointError::io(&path, err))?;
        serde_json::from_slice(&contents).map_err(|err| CheckpointError::Corrupt {
            key,
            message: err.to_string(),
        })
    }

    pub fn remove_key(&self, key: usize) -> Result<(), CheckpointError> {
        let path = self.path(key);
        fs::remove_file(&path).map_err(|err| CheckpointError::io(&path, err))
    }

    /// Delete the whole store
    pub fn remove(&self) -> Result<(), CheckpointError> {
        fs::remove_dir_all(&self.directory).map_err(|err| CheckpointError::io(&self.directory, err))
    }
}

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Checkpoint I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to serialize record {key}: {message}")]
    Serialize { key: usize, message: String },
    #[error("Checkpoint {key} is corrupt: {message}")]
    Corrupt { key: usize, message: String },
}

impl CheckpointError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
