//! Directory-backed storage: one JSON file per record key.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{TrackerError, TrackerResult};

use super::KeyValueStore;

/// Stores each record as `<directory>/<key>.json`.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// record, so a crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    /// Opens (and creates if needed) the storage directory.
    pub fn open<P: AsRef<Path>>(directory: P) -> TrackerResult<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).map_err(|e| TrackerError::Storage {
            key: directory.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { directory })
    }

    /// The directory holding the record files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", key))
    }
}

fn storage_error(key: &str, error: std::io::Error) -> TrackerError {
    TrackerError::Storage {
        key: key.to_string(),
        message: error.to_string(),
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> TrackerResult<Option<String>> {
        match fs::read_to_string(self.record_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(key, e)),
        }
    }

    fn put(&self, key: &str, value: &str) -> TrackerResult<()> {
        let path = self.record_path(key);
        let staging = self.directory.join(format!(".{}.json.tmp", key));
        fs::write(&staging, value).map_err(|e| storage_error(key, e))?;
        fs::rename(&staging, &path).map_err(|e| storage_error(key, e))?;
        debug!(key, bytes = value.len(), path = %path.display(), "Record written");
        Ok(())
    }
}
