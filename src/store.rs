//! Persistent dataset store: owns the active snapshot and mirrors it to a JSON file.

use color_eyre::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::cache::{CacheManager, STORE_FILE};
use crate::snapshot::DatasetSnapshot;

/// Notification sent to subscribers after every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Replaced,
    Cleared,
}

pub struct DatasetStore {
    path: PathBuf,
    snapshot: Option<DatasetSnapshot>,
    subscribers: Vec<Sender<StoreChange>>,
}

impl DatasetStore {
    /// Open the store at `path`, loading any persisted snapshot.
    /// A missing, unreadable or malformed file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snapshot = Self::load(&path);
        Self {
            path,
            snapshot,
            subscribers: Vec::new(),
        }
    }

    /// Open the store in the application's cache directory.
    pub fn in_cache(cache: &CacheManager) -> Self {
        Self::open(cache.cache_file(STORE_FILE))
    }

    fn load(path: &Path) -> Option<DatasetSnapshot> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read stored dataset");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed stored dataset");
                None
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Option<&DatasetSnapshot> {
        self.snapshot.as_ref()
    }

    /// Replace the snapshot, persist it, and notify subscribers.
    /// The in-memory value is replaced even when persisting fails.
    pub fn set(&mut self, snapshot: DatasetSnapshot) -> Result<()> {
        let persisted = self.persist(&snapshot);
        self.snapshot = Some(snapshot);
        self.broadcast(StoreChange::Replaced);
        persisted
    }

    /// Drop the snapshot, remove the persisted file, and notify subscribers.
    pub fn clear(&mut self) -> Result<()> {
        self.snapshot = None;
        let removed = match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        };
        tracing::debug!(path = %self.path.display(), "stored dataset cleared");
        self.broadcast(StoreChange::Cleared);
        removed
    }

    pub fn subscribe(&mut self) -> Receiver<StoreChange> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn broadcast(&mut self, change: StoreChange) {
        self.subscribers.retain(|tx| tx.send(change).is_ok());
    }

    /// Write to a temp file beside the target, then rename over it.
    fn persist(&self, snapshot: &DatasetSnapshot) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, snapshot)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(
            path = %self.path.display(),
            rows = snapshot.rows,
            columns = snapshot.columns.len(),
            "stored dataset written"
        );
        Ok(())
    }
}
