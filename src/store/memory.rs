use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::app::{MimicError, Result};
use crate::domain::Snapshot;
use crate::store::SnapshotStore;

/// In-process store for embedding and tests.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<Snapshot>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Make subsequent saves fail with a persistence error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<Snapshot> {
        self.snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        Ok(self.stored())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(MimicError::Persistence {
                path: PathBuf::from(":memory:"),
                source: io::Error::other("saves disabled"),
            });
        }

        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
