use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::bot::error::Error;
use crate::constants::limits::{AUTO_MUTE_DURATION, AUTO_MUTE_REASON, WARN_THRESHOLD};
use crate::storage::records::{Issuer, PunishmentKind, PunishmentRecord};
use crate::storage::store::PunishmentStore;

/// Result of issuing a warn: the rolling count after the warn, and the
/// auto-mute record when the threshold fired. The caller is responsible
/// for applying the actual chat restriction.
#[derive(Debug, Clone)]
pub struct WarnOutcome {
    pub warn_count: u32,
    pub auto_mute: Option<PunishmentRecord>,
}

/// Warn bookkeeping and the warn -> auto-mute escalation rule.
///
/// The rolling counter is deliberately not derived from the persisted warn
/// log: it resets at the threshold and on retraction, while the log keeps
/// every record. The two can drift if the log is edited out-of-band;
/// retraction always targets the newest record regardless of which warn
/// the counter "remembers". That drift matches the system this replaces
/// and is accepted.
pub struct EscalationEngine {
    store: Arc<PunishmentStore>,
    /// user_id -> warns since the counter last reset
    counters: DashMap<u64, u32>,
    system: Issuer,
}

impl EscalationEngine {
    pub fn new(store: Arc<PunishmentStore>, system: Issuer) -> Self {
        Self {
            store,
            counters: DashMap::new(),
            system,
        }
    }

    /// Current rolling warn count for a user.
    pub fn warn_count(&self, user_id: u64) -> u32 {
        self.counters.get(&user_id).map(|c| *c).unwrap_or(0)
    }

    /// Record a warn. At the threshold this also appends the auto-mute
    /// record and resets the counter; the counter only moves once the
    /// corresponding record is persisted.
    pub async fn issue_warn(
        &self,
        user_id: u64,
        reason: &str,
        issuer: &Issuer,
        now: f64,
    ) -> Result<WarnOutcome, Error> {
        let count = self.warn_count(user_id) + 1;
        let record = PunishmentRecord::warn(user_id, issuer, reason, count, now);
        self.store.add(PunishmentKind::Warn, record).await?;
        self.counters.insert(user_id, count);

        if count < WARN_THRESHOLD {
            return Ok(WarnOutcome {
                warn_count: count,
                auto_mute: None,
            });
        }

        let mute = PunishmentRecord::timed(
            user_id,
            &self.system,
            AUTO_MUTE_REASON,
            Some(AUTO_MUTE_DURATION),
            now,
        );
        self.store.add(PunishmentKind::Mute, mute.clone()).await?;
        self.counters.insert(user_id, 0);
        info!(
            "User {} reached {} warns, auto-mute issued",
            user_id, count
        );

        Ok(WarnOutcome {
            warn_count: count,
            auto_mute: Some(mute),
        })
    }

    /// Remove the newest warn record and decrement the rolling counter,
    /// floored at zero. Returns the remaining counter value.
    pub async fn retract_last_warn(&self, user_id: u64) -> Result<u32, Error> {
        self.store.remove_last_warn(user_id).await?;
        let remaining = self.warn_count(user_id).saturating_sub(1);
        self.counters.insert(user_id, remaining);
        Ok(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::snapshot::testing::MemorySnapshot;

    async fn engine() -> (EscalationEngine, Arc<PunishmentStore>) {
        let backend = Arc::new(MemorySnapshot::new());
        let store = Arc::new(PunishmentStore::open(backend).await.unwrap());
        (
            EscalationEngine::new(store.clone(), Issuer::warn_system(1000)),
            store,
        )
    }

    fn admin() -> Issuer {
        Issuer::new(50, "admin")
    }

    #[tokio::test]
    async fn third_warn_fires_auto_mute_and_resets() {
        // Exactly the 3rd warn since the last reset emits
        // one auto-mute and leaves the counter at zero.
        let (engine, store) = engine().await;
        let t = 1000.0;

        let first = engine.issue_warn(7, "caps", &admin(), t).await.unwrap();
        assert_eq!(first.warn_count, 1);
        assert!(first.auto_mute.is_none());

        let second = engine
            .issue_warn(7, "flood", &admin(), t + 1.0)
            .await
            .unwrap();
        assert_eq!(second.warn_count, 2);
        assert!(second.auto_mute.is_none());

        let third = engine
            .issue_warn(7, "ads", &admin(), t + 2.0)
            .await
            .unwrap();
        assert_eq!(third.warn_count, 3);
        let mute = third.auto_mute.expect("threshold must fire");
        assert_eq!(mute.reason, AUTO_MUTE_REASON);
        assert_eq!(mute.admin_name, "warn-system");
        assert_eq!(mute.until_date, Some(t + 2.0 + 3.0 * 3600.0));
        assert_eq!(engine.warn_count(7), 0);

        // The log keeps all three warns plus the one mute.
        assert_eq!(store.warns_for(7).await.len(), 3);
        assert_eq!(store.len(PunishmentKind::Mute).await, 1);

        // The next cycle escalates again only at its own 3rd warn.
        let fourth = engine
            .issue_warn(7, "again", &admin(), t + 3.0)
            .await
            .unwrap();
        assert_eq!(fourth.warn_count, 1);
        assert!(fourth.auto_mute.is_none());
    }

    #[tokio::test]
    async fn warn_ordinals_follow_the_rolling_counter() {
        let (engine, store) = engine().await;
        for i in 0..4 {
            engine
                .issue_warn(7, "spam", &admin(), 100.0 + f64::from(i))
                .await
                .unwrap();
        }
        let ordinals: Vec<_> = store
            .warns_for(7)
            .await
            .into_iter()
            .map(|w| w.warn_num)
            .collect();
        // Counter reset after the 3rd warn, so the 4th starts a new cycle.
        assert_eq!(ordinals, vec![Some(1), Some(2), Some(3), Some(1)]);
    }

    #[tokio::test]
    async fn retraction_floors_at_zero() {
        // A retraction with the counter at zero must not drive it
        // negative even though old warn records still exist in the log.
        let (engine, store) = engine().await;
        for i in 0..3 {
            engine
                .issue_warn(7, "spam", &admin(), 100.0 + f64::from(i))
                .await
                .unwrap();
        }
        assert_eq!(engine.warn_count(7), 0);
        assert_eq!(store.warns_for(7).await.len(), 3);

        let remaining = engine.retract_last_warn(7).await.unwrap();
        assert_eq!(remaining, 0);
        assert_eq!(engine.warn_count(7), 0);
        assert_eq!(store.warns_for(7).await.len(), 2);
    }

    #[tokio::test]
    async fn retraction_without_warns_is_not_found() {
        let (engine, _) = engine().await;
        let err = engine.retract_last_warn(7).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn retraction_decrements_mid_cycle() {
        let (engine, _) = engine().await;
        engine.issue_warn(7, "a", &admin(), 1.0).await.unwrap();
        engine.issue_warn(7, "b", &admin(), 2.0).await.unwrap();

        assert_eq!(engine.retract_last_warn(7).await.unwrap(), 1);

        // Two more warns to reach the threshold again.
        engine.issue_warn(7, "c", &admin(), 3.0).await.unwrap();
        let outcome = engine.issue_warn(7, "d", &admin(), 4.0).await.unwrap();
        assert_eq!(outcome.warn_count, 3);
        assert!(outcome.auto_mute.is_some());
    }

    #[tokio::test]
    async fn failed_warn_persist_leaves_counter_untouched() {
        let backend = Arc::new(MemorySnapshot::new());
        let store = Arc::new(PunishmentStore::open(backend.clone()).await.unwrap());
        let engine = EscalationEngine::new(store, Issuer::warn_system(1000));

        backend.fail_next_save();
        assert!(engine
            .issue_warn(7, "spam", &admin(), 1.0)
            .await
            .is_err());
        assert_eq!(engine.warn_count(7), 0);
    }

    #[tokio::test]
    async fn failed_threshold_warn_retries_escalation_later() {
        let backend = Arc::new(MemorySnapshot::new());
        let store = Arc::new(PunishmentStore::open(backend.clone()).await.unwrap());
        let engine = EscalationEngine::new(store.clone(), Issuer::warn_system(1000));

        engine.issue_warn(7, "a", &admin(), 1.0).await.unwrap();
        engine.issue_warn(7, "b", &admin(), 2.0).await.unwrap();

        // The 3rd warn fails to persist: rolled back, counter stays at 2,
        // no mute appears.
        backend.fail_next_save();
        assert!(engine.issue_warn(7, "c", &admin(), 3.0).await.is_err());
        assert_eq!(engine.warn_count(7), 2);
        assert_eq!(store.warns_for(7).await.len(), 2);
        assert_eq!(store.len(PunishmentKind::Mute).await, 0);

        // The retry is the real 3rd warn and escalates normally.
        let outcome = engine.issue_warn(7, "c", &admin(), 4.0).await.unwrap();
        assert_eq!(outcome.warn_count, 3);
        assert!(outcome.auto_mute.is_some());
        assert_eq!(engine.warn_count(7), 0);
    }
}
