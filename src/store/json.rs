use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::app::{MimicError, Result};
use crate::domain::Snapshot;
use crate::store::SnapshotStore;

pub const DEFAULT_FILE_NAME: &str = "user-agents.json";

/// Snapshot stored as a JSON record on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `<data_dir>/mimic/user-agents.json`
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| MimicError::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("mimic").join(DEFAULT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persistence_error(&self, source: std::io::Error) -> MimicError {
        MimicError::Persistence {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.persistence_error(e)),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let snapshot: Snapshot = serde_json::from_str(&content)?;
        Ok(Some(snapshot.normalized()))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.persistence_error(e))?;
            }
        }

        let content = serde_json::to_string_pretty(snapshot)?;

        // Write next to the target and rename so readers never see half a file.
        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path).map_err(|e| self.persistence_error(e))?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| self.persistence_error(e))?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|e| self.persistence_error(e))?;
        Ok(())
    }
}
