use std::sync::Arc;

use tracing::error;

use crate::config::Settings;
use crate::services::antispam::tracker::SpamTracker;
use crate::services::moderation::escalation::EscalationEngine;
use crate::services::throttle::rate_gate::RateGate;
use crate::storage::records::Issuer;
use crate::storage::store::PunishmentStore;
use crate::transport::ChatTransport;

/// Shared state handed to every handler of the moderation bot.
pub struct Data {
    pub settings: Settings,
    pub store: Arc<PunishmentStore>,
    pub escalation: EscalationEngine,
    pub flood_gate: RateGate,
    pub spam_tracker: SpamTracker,
    pub transport: Arc<dyn ChatTransport>,
    /// Synthetic issuer recorded on detector-driven punishments.
    pub antispam_issuer: Issuer,
}

impl Data {
    pub fn new(
        settings: Settings,
        store: Arc<PunishmentStore>,
        transport: Arc<dyn ChatTransport>,
        bot_id: u64,
    ) -> Self {
        let flood_gate = RateGate::new(settings.flood_limit, settings.flood_window_secs);
        let spam_tracker =
            SpamTracker::new(settings.spam_window_secs, settings.spam_max_messages);
        let escalation = EscalationEngine::new(store.clone(), Issuer::warn_system(bot_id));
        Self {
            settings,
            store,
            escalation,
            flood_gate,
            spam_tracker,
            transport,
            antispam_issuer: Issuer::antispam_system(bot_id),
        }
    }

    /// Scope check against the configured chat. A missing CHAT_ID degrades
    /// to allow, logged at error level on every occurrence.
    pub fn in_scope(&self, chat_id: i64) -> bool {
        match self.settings.chat_id {
            Some(configured) => configured == chat_id,
            None => {
                error!("CHAT_ID is not configured; treating chat {} as allowed", chat_id);
                true
            }
        }
    }
}
