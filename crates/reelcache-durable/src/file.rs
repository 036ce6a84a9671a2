use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{DurableError, DurableKv, Result, check_quota};

/// Storage kept in a single JSON document on disk.
///
/// Every write rewrites the document through a temporary file that is renamed
/// over the original, so readers never observe a half-written file.
#[derive(Debug)]
pub struct FileKv {
    path: PathBuf,
    quota: Option<usize>,
    guard: Mutex<()>,
}

impl FileKv {
    /// Open (or lazily create) storage at `path`.
    ///
    /// The file itself is only created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            quota: None,
            guard: Mutex::new(()),
        }
    }

    /// Reject writes that would grow the document beyond `bytes` of keys plus values.
    #[must_use]
    pub const fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Entries to rewrite from. A corrupt document is unreadable by `get`
    /// anyway, so it is replaced rather than blocking every later write.
    fn entries_for_update(&self) -> Result<BTreeMap<String, String>> {
        match self.read_entries() {
            Err(DurableError::Json(err)) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Replacing corrupt durable storage file"
                );
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            info!(dir = %dir.display(), "Created durable storage directory");
        }

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, entries)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        debug!(path = %self.path.display(), entries = entries.len(), "Rewrote durable storage file");
        Ok(())
    }
}

impl DurableKv for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.guard.lock().map_err(|_| DurableError::LockError)?;
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.guard.lock().map_err(|_| DurableError::LockError)?;
        let mut entries = self.entries_for_update()?;
        check_quota(&entries, key, value, self.quota)?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.guard.lock().map_err(|_| DurableError::LockError)?;
        let mut entries = self.entries_for_update()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let _guard = self.guard.lock().map_err(|_| DurableError::LockError)?;
        Ok(self.read_entries()?.into_keys().collect())
    }
}
