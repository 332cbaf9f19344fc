pub mod json;
pub mod memory;

use crate::app::Result;
use crate::domain::Snapshot;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

/// Durable home of the cached user-agent list.
pub trait SnapshotStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Snapshot>>;
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}
