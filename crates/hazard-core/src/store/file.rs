use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{HazardStateStore, StoreResult};
use crate::domain::NearbySet;

/// JSON snapshot of the current nearby set on disk.
///
/// Only the latest committed set is kept; writes go to a temp file in the
/// same directory and are renamed over the snapshot.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Create a store at `path`. Creates the parent directory if needed.
    pub fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    fn write_snapshot(&self, set: &NearbySet) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(set)?;
        let mut tmp = NamedTempFile::new_in(self.parent_dir())?;
        tmp.write_all(&bytes)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[async_trait]
impl HazardStateStore for FileStateStore {
    async fn load(&self) -> StoreResult<NearbySet> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state snapshot yet");
                Ok(NearbySet::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn commit(&self, set: NearbySet) -> StoreResult<()> {
        self.write_snapshot(&set)
    }

    async fn clear(&self) -> StoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
