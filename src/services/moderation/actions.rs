use std::time::Duration;

use tracing::info;

use crate::bot::error::Error;
use crate::storage::records::{Issuer, PunishmentKind, PunishmentRecord};
use crate::storage::store::PunishmentStore;
use crate::transport::ChatTransport;

/// Ban a user. The Telegram call goes first and only a successful call is
/// recorded, so a transport failure leaves no phantom punishment behind.
/// `duration` of `None` is a permanent ban.
pub async fn ban_user(
    store: &PunishmentStore,
    transport: &dyn ChatTransport,
    chat_id: i64,
    user_id: u64,
    issuer: &Issuer,
    reason: &str,
    duration: Option<Duration>,
    now: f64,
) -> Result<PunishmentRecord, Error> {
    let record = PunishmentRecord::timed(user_id, issuer, reason, duration, now);
    transport.ban(chat_id, user_id, record.until_date).await?;
    store.add(PunishmentKind::Ban, record.clone()).await?;
    info!(
        "User {} banned by {} ({})",
        user_id, issuer.name, record.reason
    );
    Ok(record)
}

/// Mute a user; same transport-first contract as [`ban_user`].
pub async fn mute_user(
    store: &PunishmentStore,
    transport: &dyn ChatTransport,
    chat_id: i64,
    user_id: u64,
    issuer: &Issuer,
    reason: &str,
    duration: Option<Duration>,
    now: f64,
) -> Result<PunishmentRecord, Error> {
    let record = PunishmentRecord::timed(user_id, issuer, reason, duration, now);
    transport
        .restrict(chat_id, user_id, record.until_date)
        .await?;
    store.add(PunishmentKind::Mute, record.clone()).await?;
    info!(
        "User {} muted by {} ({})",
        user_id, issuer.name, record.reason
    );
    Ok(record)
}

/// Lift a ban; returns how many records were removed (0 = was not banned).
pub async fn unban_user(
    store: &PunishmentStore,
    transport: &dyn ChatTransport,
    chat_id: i64,
    user_id: u64,
) -> Result<usize, Error> {
    transport.unban(chat_id, user_id).await?;
    let removed = store.remove(PunishmentKind::Ban, user_id).await?;
    info!("User {} unbanned ({} records dropped)", user_id, removed);
    Ok(removed)
}

/// Lift a mute; returns how many records were removed (0 = was not muted).
pub async fn unmute_user(
    store: &PunishmentStore,
    transport: &dyn ChatTransport,
    chat_id: i64,
    user_id: u64,
) -> Result<usize, Error> {
    transport.unrestrict(chat_id, user_id).await?;
    let removed = store.remove(PunishmentKind::Mute, user_id).await?;
    info!("User {} unmuted ({} records dropped)", user_id, removed);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::snapshot::testing::MemorySnapshot;
    use crate::transport::testing::{Call, RecordingTransport};

    async fn fixtures() -> (Arc<PunishmentStore>, RecordingTransport) {
        let backend = Arc::new(MemorySnapshot::new());
        let store = Arc::new(PunishmentStore::open(backend).await.unwrap());
        (store, RecordingTransport::new())
    }

    fn admin() -> Issuer {
        Issuer::new(50, "admin")
    }

    #[tokio::test]
    async fn ban_calls_transport_then_persists() {
        let (store, transport) = fixtures().await;
        let record = ban_user(
            &store,
            &transport,
            -100,
            7,
            &admin(),
            "raid",
            Some(Duration::from_secs(60)),
            1000.0,
        )
        .await
        .unwrap();

        assert_eq!(record.until_date, Some(1060.0));
        assert_eq!(
            transport.calls().await,
            vec![Call::Ban {
                user_id: 7,
                until: Some(1060.0)
            }]
        );
        assert_eq!(store.len(PunishmentKind::Ban).await, 1);
    }

    #[tokio::test]
    async fn transport_failure_skips_persistence() {
        let (store, transport) = fixtures().await;
        transport.fail();

        assert!(mute_user(
            &store, &transport, -100, 7, &admin(), "flood", None, 1000.0
        )
        .await
        .is_err());
        assert_eq!(store.len(PunishmentKind::Mute).await, 0);
    }

    #[tokio::test]
    async fn unban_reports_zero_when_not_banned() {
        let (store, transport) = fixtures().await;
        assert_eq!(unban_user(&store, &transport, -100, 7).await.unwrap(), 0);
        assert_eq!(transport.calls().await, vec![Call::Unban { user_id: 7 }]);
    }
}
