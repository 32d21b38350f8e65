use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, error};

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::services::antispam::classifier::{self, Violation};
use crate::services::moderation::actions;
use crate::services::throttle::rate_gate::Admission;
use crate::utils::clock;
use crate::utils::formatting::mention;

/// Pipeline for ordinary chat traffic: scope check, flood gate, content
/// classification, punishment. Detector failures go to the log only and
/// never block the rest of the chat.
pub async fn handle_chat_message(bot: Bot, msg: Message, data: Arc<Data>) -> Result<(), Error> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };
    if !data.in_scope(msg.chat.id.0) {
        return Ok(());
    }

    let user_id = user.id.0;
    let now = clock::now();

    // Plain traffic over the flood limit is dropped without ceremony; only
    // commands get the wait-time notice.
    if let Admission::Rejected { retry_after } = data.flood_gate.admit(user_id, now) {
        debug!(
            "Flood gate dropped message from user {} ({:.1}s left)",
            user_id, retry_after
        );
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };
    let who = mention(user_id, &user.first_name);

    match classifier::classify(text) {
        Some(Violation::ForbiddenSymbols) => {
            if let Err(e) = data.transport.delete_message(msg.chat.id.0, msg.id.0).await {
                error!("Failed to delete forbidden-symbol message: {}", e);
                return Ok(());
            }
            announce(
                &bot,
                &msg,
                format!("🚨 <b>Forbidden symbols</b>\n👤 {who}\n❌ Message removed"),
            )
            .await;
            return Ok(());
        }
        Some(Violation::ExcessiveCaps) if data.settings.anticaps => {
            if let Err(e) = data.transport.delete_message(msg.chat.id.0, msg.id.0).await {
                error!("Failed to delete caps message: {}", e);
            }
            let outcome = data
                .escalation
                .issue_warn(user_id, "excessive caps", &data.antispam_issuer, now)
                .await?;
            apply_auto_mute(&data, msg.chat.id.0, user_id, outcome.auto_mute.as_ref()).await;

            let mut text = format!(
                "🚨 <b>Caps detected</b>\n👤 {who}\n⚠️ Warn {}/3, message removed",
                outcome.warn_count
            );
            if outcome.auto_mute.is_some() {
                text.push_str("\n🔇 <b>Auto-mute for 3 hours</b>");
            }
            announce(&bot, &msg, text).await;
        }
        _ => {}
    }

    if data.settings.antispam && data.spam_tracker.record(user_id, now) {
        if let Err(e) = data.transport.delete_message(msg.chat.id.0, msg.id.0).await {
            error!("Failed to delete spam message: {}", e);
        }

        // Direct timed mute first, then the warn; an escalation mute fired
        // by the warn is longer and overrides the restriction.
        let mute_duration = Duration::from_secs(data.settings.spam_mute_minutes * 60);
        if let Err(e) = actions::mute_user(
            &data.store,
            data.transport.as_ref(),
            msg.chat.id.0,
            user_id,
            &data.antispam_issuer,
            "message flooding",
            Some(mute_duration),
            now,
        )
        .await
        {
            error!("Anti-spam mute for user {} failed: {}", user_id, e);
        }

        let outcome = data
            .escalation
            .issue_warn(user_id, "message flooding", &data.antispam_issuer, now)
            .await?;
        apply_auto_mute(&data, msg.chat.id.0, user_id, outcome.auto_mute.as_ref()).await;
        data.spam_tracker.reset(user_id);

        let mut text = format!(
            "🚨 <b>Spam detected</b>\n👤 {who}\n🔇 Muted for {} minutes, warn {}/3",
            data.settings.spam_mute_minutes, outcome.warn_count
        );
        if outcome.auto_mute.is_some() {
            text.push_str("\n🔇 <b>Auto-mute for 3 hours</b>");
        }
        announce(&bot, &msg, text).await;
    }

    Ok(())
}

/// Apply the chat restriction for an escalation mute. The record is
/// already persisted, so a failed restrict is logged and not retried here.
pub async fn apply_auto_mute(
    data: &Data,
    chat_id: i64,
    user_id: u64,
    auto_mute: Option<&crate::storage::records::PunishmentRecord>,
) {
    let Some(mute) = auto_mute else { return };
    if let Err(e) = data
        .transport
        .restrict(chat_id, user_id, mute.until_date)
        .await
    {
        error!("Failed to apply auto-mute for user {}: {}", user_id, e);
    }
}

async fn announce(bot: &Bot, msg: &Message, text: String) {
    if let Err(e) = bot
        .send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await
    {
        error!("Failed to announce detection: {}", e);
    }
}
