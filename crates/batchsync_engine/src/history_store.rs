use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

const HISTORY_FILENAME: &str = "translation_history.ron";

#[derive(Debug, Error)]
pub enum HistoryStoreError {
    #[error("cannot use history directory {path:?}: {source}")]
    Dir { path: PathBuf, source: io::Error },
    #[error("cannot access history file {path:?}: {source}")]
    File { path: PathBuf, source: io::Error },
}

/// On-device home of the single-image translation history.
///
/// The store deals in the serialized document only; the caller owns the
/// format. Saves replace the file in one rename, so a crash mid-write leaves
/// the previous history intact.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILENAME)
    }

    /// The stored document, or `None` before the first save.
    pub fn load(&self) -> Result<Option<String>, HistoryStoreError> {
        let path = self.path();
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(HistoryStoreError::File { path, source }),
        }
    }

    pub fn save(&self, document: &str) -> Result<PathBuf, HistoryStoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| self.dir_error(source))?;

        let path = self.path();
        let file_error = |source: io::Error| HistoryStoreError::File {
            path: path.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|source| self.dir_error(source))?;
        tmp.write_all(document.as_bytes()).map_err(file_error)?;
        tmp.as_file_mut().sync_all().map_err(file_error)?;
        tmp.persist(&path).map_err(|err| file_error(err.error))?;
        Ok(path)
    }

    fn dir_error(&self, source: io::Error) -> HistoryStoreError {
        HistoryStoreError::Dir {
            path: self.dir.clone(),
            source,
        }
    }
}

