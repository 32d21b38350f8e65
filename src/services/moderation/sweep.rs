use std::collections::HashSet;
use std::sync::Arc;

use tokio::time::interval;
use tracing::{error, info};

use crate::constants::limits::SWEEP_INTERVAL;
use crate::storage::records::PunishmentKind;
use crate::storage::store::PunishmentStore;
use crate::transport::ChatTransport;
use crate::utils::clock;

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub lifted_bans: usize,
    pub lifted_mutes: usize,
    pub failures: usize,
}

/// Lifts expired bans and mutes against the chat transport.
///
/// Each lift is independent: one user's failure is logged, keeps that
/// record for the next pass, and never aborts the rest of the sweep.
pub struct Sweeper {
    store: Arc<PunishmentStore>,
    transport: Arc<dyn ChatTransport>,
    chat_id: Option<i64>,
}

impl Sweeper {
    pub fn new(
        store: Arc<PunishmentStore>,
        transport: Arc<dyn ChatTransport>,
        chat_id: Option<i64>,
    ) -> Self {
        Self {
            store,
            transport,
            chat_id,
        }
    }

    /// One pass over both collections at `now`.
    pub async fn run_once(&self, now: f64) -> SweepReport {
        let mut report = SweepReport::default();

        let Some(chat_id) = self.chat_id else {
            error!("CHAT_ID is not configured; expired punishments cannot be lifted");
            return report;
        };

        for user_id in self.expired_users(PunishmentKind::Ban, now).await {
            match self.transport.unban(chat_id, user_id).await {
                Ok(()) => match self.store.remove(PunishmentKind::Ban, user_id).await {
                    Ok(_) => {
                        info!("Lifted expired ban for user {}", user_id);
                        report.lifted_bans += 1;
                    }
                    Err(e) => {
                        error!("Failed to drop expired ban for user {}: {}", user_id, e);
                        report.failures += 1;
                    }
                },
                Err(e) => {
                    error!("Failed to unban user {}: {}", user_id, e);
                    report.failures += 1;
                }
            }
        }

        for user_id in self.expired_users(PunishmentKind::Mute, now).await {
            match self.transport.unrestrict(chat_id, user_id).await {
                Ok(()) => match self.store.remove(PunishmentKind::Mute, user_id).await {
                    Ok(_) => {
                        info!("Lifted expired mute for user {}", user_id);
                        report.lifted_mutes += 1;
                    }
                    Err(e) => {
                        error!("Failed to drop expired mute for user {}: {}", user_id, e);
                        report.failures += 1;
                    }
                },
                Err(e) => {
                    error!("Failed to unrestrict user {}: {}", user_id, e);
                    report.failures += 1;
                }
            }
        }

        report
    }

    /// Users with at least one expired record of `kind`, deduplicated so
    /// stale duplicates cost one lift call, not one per record.
    async fn expired_users(&self, kind: PunishmentKind, now: f64) -> Vec<u64> {
        let mut seen = HashSet::new();
        self.store
            .expired(kind, now)
            .await
            .into_iter()
            .filter(|r| seen.insert(r.user_id))
            .map(|r| r.user_id)
            .collect()
    }

    /// Run one pass immediately, then on a fixed timer. Safe to abort at
    /// shutdown: every store mutation is an atomic whole-snapshot replace.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                let report = self.run_once(clock::now()).await;
                if report.failures > 0 {
                    error!(
                        "Sweep finished with {} failed lifts (will retry)",
                        report.failures
                    );
                }
            }
        })
    }
}
