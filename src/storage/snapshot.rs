use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::bot::error::Error;
use crate::storage::records::StoreSnapshot;

/// Persistence collaborator for the punishment store.
///
/// `save` must replace the whole snapshot atomically: a crash mid-write or
/// a concurrent reader never observes a partial snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the last persisted snapshot. A missing backing file is not an
    /// error; it yields empty collections.
    async fn load(&self) -> Result<StoreSnapshot, Error>;

    /// Persist the whole snapshot.
    async fn save(&self, snapshot: &StoreSnapshot) -> Result<(), Error>;
}

const TEMP_SUFFIX: &str = ".tmp";

/// JSON file backend. Writes land in `<path>.tmp` first and are renamed
/// over the target, so the on-disk snapshot is always complete.
pub struct JsonSnapshotFile {
    path: PathBuf,
}

impl JsonSnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut os = self.path.clone().into_os_string();
        os.push(TEMP_SUFFIX);
        PathBuf::from(os)
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotFile {
    async fn load(&self) -> Result<StoreSnapshot, Error> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No snapshot at {}, starting empty", self.path.display());
                return Ok(StoreSnapshot::default());
            }
            Err(e) => return Err(Error::Persistence(e)),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<(), Error> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(Error::Persistence)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(Error::Persistence)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::records::{Issuer, PunishmentRecord};

    #[tokio::test]
    async fn absent_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonSnapshotFile::new(dir.path().join("punishments.json"));
        assert_eq!(backend.load().await.unwrap(), StoreSnapshot::default());
    }

    #[tokio::test]
    async fn round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonSnapshotFile::new(dir.path().join("punishments.json"));

        let issuer = Issuer::new(10, "admin");
        let snapshot = StoreSnapshot {
            bans: vec![PunishmentRecord::timed(1, &issuer, "raid", None, 1000.0)],
            mutes: vec![],
            warns: vec![PunishmentRecord::warn(2, &issuer, "caps", 1, 1001.0)],
        };

        backend.save(&snapshot).await.unwrap();
        assert_eq!(backend.load().await.unwrap(), snapshot);

        // No temp file is left behind after a completed save.
        assert!(!dir.path().join("punishments.json.tmp").exists());
    }

    #[tokio::test]
    async fn save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonSnapshotFile::new(dir.path().join("punishments.json"));
        let issuer = Issuer::new(10, "admin");

        let mut snapshot = StoreSnapshot::default();
        backend.save(&snapshot).await.unwrap();

        snapshot
            .mutes
            .push(PunishmentRecord::timed(3, &issuer, "flood", None, 5.0));
        backend.save(&snapshot).await.unwrap();

        assert_eq!(backend.load().await.unwrap().mutes.len(), 1);
    }
}
