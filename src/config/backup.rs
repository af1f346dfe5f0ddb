//! Rotating history of successfully resolved configurations.
//!
//! The ring holds at most [`BACKUP_GENERATIONS`] entries. Entry `n` lives in
//! slot `n % BACKUP_GENERATIONS`, so writing the 11th entry overwrites the
//! oldest. Nothing is written until a resolve commits; an aborted or dropped
//! [`ResolveGuard`] leaves the ring exactly as it was.

use super::types::EffectiveConfig;
use crate::error::{BackupError, IoError, ParseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Number of generations kept.
pub const BACKUP_GENERATIONS: usize = 10;

/// A snapshot of one successful resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Monotonic across restarts.
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    pub config: EffectiveConfig,
}

impl BackupEntry {
    pub fn slot(&self) -> usize {
        slot_of(self.sequence)
    }
}

fn slot_of(sequence: u64) -> usize {
    (sequence % BACKUP_GENERATIONS as u64) as usize
}

/// Durable storage for the ring, addressed by slot.
pub trait BackupStore: fmt::Debug + Send + Sync {
    /// Every readable entry, in any order.
    fn load_all(&self) -> Result<Vec<BackupEntry>, BackupError>;

    /// Replace the contents of `slot`. Must not leave a partial entry behind.
    fn write(&self, slot: usize, entry: &BackupEntry) -> Result<(), BackupError>;
}

/// One JSON file per slot (`backup-<slot>.json`) in a dedicated directory.
#[derive(Debug, Clone)]
pub struct FileBackupStore {
    dir: PathBuf,
}

impl FileBackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, slot: usize) -> PathBuf {
        self.dir.join(format!("backup-{}.json", slot))
    }

    fn read_slot(&self, path: &Path) -> Result<BackupEntry, BackupError> {
        let content = std::fs::read_to_string(path).map_err(|e| IoError::new(path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| BackupError::Corrupt(ParseError::new(path, e.to_string())))
    }
}

impl BackupStore for FileBackupStore {
    fn load_all(&self) -> Result<Vec<BackupEntry>, BackupError> {
        let mut entries = Vec::new();
        for slot in 0..BACKUP_GENERATIONS {
            let path = self.slot_path(slot);
            if !path.try_exists().map_err(|e| IoError::new(&path, e))? {
                continue;
            }
            match self.read_slot(&path) {
                Ok(entry) if entry.sequence == u64::MAX => warn!(
                    path = %path.display(),
                    "skipping backup whose sequence cannot be advanced"
                ),
                Ok(entry) if entry.slot() == slot => entries.push(entry),
                Ok(entry) => warn!(
                    path = %path.display(),
                    sequence = entry.sequence,
                    "skipping backup stored in the wrong slot"
                ),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable backup"),
            }
        }
        Ok(entries)
    }

    fn write(&self, slot: usize, entry: &BackupEntry) -> Result<(), BackupError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| IoError::new(&self.dir, e))?;

        let path = self.slot_path(slot);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(entry)
            .map_err(|e| BackupError::Corrupt(ParseError::new(&path, e.to_string())))?;

        std::fs::write(&tmp, content).map_err(|e| IoError::new(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(IoError::new(&path, e).into());
        }
        Ok(())
    }
}

/// In-process ring, for embedding without a disk store.
#[derive(Debug, Default)]
pub struct MemoryBackupStore {
    slots: Mutex<BTreeMap<usize, BackupEntry>>,
}

impl MemoryBackupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BackupStore for MemoryBackupStore {
    fn load_all(&self) -> Result<Vec<BackupEntry>, BackupError> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slots.values().cloned().collect())
    }

    fn write(&self, slot: usize, entry: &BackupEntry) -> Result<(), BackupError> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.insert(slot, entry.clone());
        Ok(())
    }
}

/// Owner of the backup ring.
#[derive(Debug)]
pub struct BackupManager {
    store: Box<dyn BackupStore>,
}

impl BackupManager {
    pub fn new(store: impl BackupStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Ring backed by files in `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileBackupStore::new(dir))
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackupStore::new())
    }

    /// Start a resolve. The ring is only touched if the guard is committed.
    pub fn begin_resolve(&self) -> ResolveGuard<'_> {
        ResolveGuard {
            manager: self,
            finished: false,
        }
    }

    /// Stored entries, oldest first.
    pub fn list(&self) -> Result<Vec<BackupEntry>, BackupError> {
        let mut entries = self.store.load_all()?;
        entries.sort_by_key(|e| e.sequence);
        Ok(entries)
    }

    pub fn latest(&self) -> Result<Option<BackupEntry>, BackupError> {
        Ok(self.list()?.pop())
    }

    /// Configuration stored under `sequence`.
    pub fn restore(&self, sequence: u64) -> Result<EffectiveConfig, BackupError> {
        self.list()?
            .into_iter()
            .find(|e| e.sequence == sequence)
            .map(|e| e.config)
            .ok_or(BackupError::NotFound { sequence })
    }

    fn record(&self, config: &EffectiveConfig) -> Result<BackupEntry, BackupError> {
        let next = match self.store.load_all()?.iter().map(|e| e.sequence).max() {
            Some(last) => last
                .checked_add(1)
                .ok_or(BackupError::SequenceExhausted { sequence: last })?,
            None => 0,
        };

        let entry = BackupEntry {
            sequence: next,
            created_at: Utc::now(),
            config: config.clone(),
        };
        self.store.write(entry.slot(), &entry)?;
        info!(sequence = entry.sequence, slot = entry.slot(), "recorded config backup");
        Ok(entry)
    }
}

/// Scope of one resolve attempt against the backup ring.
#[must_use = "dropping the guard aborts the backup"]
pub struct ResolveGuard<'a> {
    manager: &'a BackupManager,
    finished: bool,
}

impl ResolveGuard<'_> {
    /// Record `config` as the newest generation, evicting the oldest if full.
    pub fn commit(mut self, config: &EffectiveConfig) -> Result<BackupEntry, BackupError> {
        self.finished = true;
        self.manager.record(config)
    }

    /// End the attempt without writing anything.
    pub fn abort(mut self) {
        self.finished = true;
        debug!("resolve aborted; backup ring left unchanged");
    }
}

impl Drop for ResolveGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!("resolve guard dropped without commit; backup ring left unchanged");
        }
    }
}
