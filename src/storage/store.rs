use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::bot::error::Error;
use crate::storage::records::{PunishmentKind, PunishmentRecord, StoreSnapshot};
use crate::storage::snapshot::SnapshotStore;

/// Durable record of bans, mutes and warns.
///
/// Every mutation persists the whole snapshot before returning. If the
/// write fails, the in-memory change is rolled back and the error is
/// returned, so memory and disk never diverge silently.
pub struct PunishmentStore {
    snapshot: Mutex<StoreSnapshot>,
    backend: Arc<dyn SnapshotStore>,
}

impl PunishmentStore {
    /// Load the persisted snapshot (empty collections when none exists).
    pub async fn open(backend: Arc<dyn SnapshotStore>) -> Result<Self, Error> {
        let snapshot = backend.load().await?;
        debug!(
            "Punishment store loaded: {} bans, {} mutes, {} warns",
            snapshot.bans.len(),
            snapshot.mutes.len(),
            snapshot.warns.len()
        );
        Ok(Self {
            snapshot: Mutex::new(snapshot),
            backend,
        })
    }

    /// Append a record. No dedup: a second ban for the same user is a
    /// second entry, and checking first is the caller's job.
    pub async fn add(&self, kind: PunishmentKind, record: PunishmentRecord) -> Result<(), Error> {
        let mut snapshot = self.snapshot.lock().await;
        snapshot.collection_mut(kind).push(record);
        if let Err(e) = self.backend.save(&snapshot).await {
            snapshot.collection_mut(kind).pop();
            return Err(e);
        }
        Ok(())
    }

    /// Remove all records of `kind` for the user; returns how many were
    /// removed. Removing nothing is a silent no-op.
    pub async fn remove(&self, kind: PunishmentKind, user_id: u64) -> Result<usize, Error> {
        let mut snapshot = self.snapshot.lock().await;
        let previous = snapshot.collection(kind).clone();
        let collection = snapshot.collection_mut(kind);
        collection.retain(|r| r.user_id != user_id);
        let removed = previous.len() - collection.len();
        if removed == 0 {
            return Ok(0);
        }
        if let Err(e) = self.backend.save(&snapshot).await {
            *snapshot.collection_mut(kind) = previous;
            return Err(e);
        }
        Ok(removed)
    }

    /// Records of `kind` that are permanent or expire after `now`. Expired
    /// records stay in the raw store until the sweep deletes them.
    pub async fn active(&self, kind: PunishmentKind, now: f64) -> Vec<PunishmentRecord> {
        self.snapshot
            .lock()
            .await
            .collection(kind)
            .iter()
            .filter(|r| r.is_active(now))
            .cloned()
            .collect()
    }

    /// Records of `kind` whose expiry has passed: the sweep's input.
    pub async fn expired(&self, kind: PunishmentKind, now: f64) -> Vec<PunishmentRecord> {
        self.snapshot
            .lock()
            .await
            .collection(kind)
            .iter()
            .filter(|r| r.is_expired(now))
            .cloned()
            .collect()
    }

    /// Full ordered warn log for one user. Warns have no expiry; the
    /// rolling escalation counter lives elsewhere.
    pub async fn warns_for(&self, user_id: u64) -> Vec<PunishmentRecord> {
        self.snapshot
            .lock()
            .await
            .warns
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Every warn record, in issue order.
    pub async fn all_warns(&self) -> Vec<PunishmentRecord> {
        self.snapshot.lock().await.warns.clone()
    }

    /// Delete the most recently issued warn for the user.
    pub async fn remove_last_warn(&self, user_id: u64) -> Result<PunishmentRecord, Error> {
        let mut snapshot = self.snapshot.lock().await;
        let index = snapshot
            .warns
            .iter()
            .rposition(|r| r.user_id == user_id)
            .ok_or_else(|| Error::not_found("warn", user_id))?;
        let record = snapshot.warns.remove(index);
        if let Err(e) = self.backend.save(&snapshot).await {
            snapshot.warns.insert(index, record);
            return Err(e);
        }
        Ok(record)
    }

    /// Raw (unfiltered) record count for a collection.
    pub async fn len(&self, kind: PunishmentKind) -> usize {
        self.snapshot.lock().await.collection(kind).len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::storage::records::Issuer;
    use crate::storage::snapshot::testing::MemorySnapshot;

    fn issuer() -> Issuer {
        Issuer::new(99, "admin")
    }

    async fn store_with(backend: Arc<MemorySnapshot>) -> PunishmentStore {
        PunishmentStore::open(backend).await.unwrap()
    }

    #[tokio::test]
    async fn timed_ban_active_until_expiry_then_only_raw() {
        // The active view hides expired records, the raw store
        // keeps them until the sweep removes them.
        let backend = Arc::new(MemorySnapshot::new());
        let store = store_with(backend).await;
        let t = 1000.0;

        store
            .add(
                PunishmentKind::Ban,
                PunishmentRecord::timed(1, &issuer(), "raid", Some(Duration::from_secs(10)), t),
            )
            .await
            .unwrap();

        assert_eq!(store.active(PunishmentKind::Ban, t + 5.0).await.len(), 1);
        assert!(store.active(PunishmentKind::Ban, t + 20.0).await.is_empty());
        assert_eq!(store.len(PunishmentKind::Ban).await, 1);

        assert_eq!(store.remove(PunishmentKind::Ban, 1).await.unwrap(), 1);
        assert_eq!(store.len(PunishmentKind::Ban).await, 0);
    }

    #[tokio::test]
    async fn remove_is_silent_when_nothing_matches() {
        let backend = Arc::new(MemorySnapshot::new());
        let store = store_with(backend).await;
        assert_eq!(store.remove(PunishmentKind::Mute, 42).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn remove_deletes_every_record_for_the_user() {
        let backend = Arc::new(MemorySnapshot::new());
        let store = store_with(backend).await;
        for _ in 0..3 {
            store
                .add(
                    PunishmentKind::Mute,
                    PunishmentRecord::timed(7, &issuer(), "flood", None, 1.0),
                )
                .await
                .unwrap();
        }
        store
            .add(
                PunishmentKind::Mute,
                PunishmentRecord::timed(8, &issuer(), "flood", None, 1.0),
            )
            .await
            .unwrap();

        assert_eq!(store.remove(PunishmentKind::Mute, 7).await.unwrap(), 3);
        assert_eq!(store.len(PunishmentKind::Mute).await, 1);
    }

    #[tokio::test]
    async fn remove_last_warn_targets_newest() {
        let backend = Arc::new(MemorySnapshot::new());
        let store = store_with(backend).await;
        store
            .add(
                PunishmentKind::Warn,
                PunishmentRecord::warn(7, &issuer(), "first", 1, 1.0),
            )
            .await
            .unwrap();
        store
            .add(
                PunishmentKind::Warn,
                PunishmentRecord::warn(7, &issuer(), "second", 2, 2.0),
            )
            .await
            .unwrap();

        let removed = store.remove_last_warn(7).await.unwrap();
        assert_eq!(removed.reason, "second");
        assert_eq!(store.warns_for(7).await.len(), 1);

        store.remove_last_warn(7).await.unwrap();
        let err = store.remove_last_warn(7).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn failed_save_rolls_back_memory() {
        // Memory and the persisted snapshot must not silently diverge.
        let backend = Arc::new(MemorySnapshot::new());
        let store = store_with(backend.clone()).await;

        store
            .add(
                PunishmentKind::Ban,
                PunishmentRecord::timed(1, &issuer(), "raid", None, 1.0),
            )
            .await
            .unwrap();

        backend.fail_next_save();
        let err = store
            .add(
                PunishmentKind::Ban,
                PunishmentRecord::timed(2, &issuer(), "ads", None, 2.0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));

        // In-memory state rolled back, persisted snapshot untouched.
        assert_eq!(store.len(PunishmentKind::Ban).await, 1);
        assert_eq!(backend.persisted().await.bans.len(), 1);

        backend.fail_next_save();
        assert!(store.remove(PunishmentKind::Ban, 1).await.is_err());
        assert_eq!(store.len(PunishmentKind::Ban).await, 1);
        assert_eq!(backend.persisted().await.bans.len(), 1);
    }
}
