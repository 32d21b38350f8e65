use std::collections::BTreeMap;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode, User};
use tracing::error;

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::constants::limits::DEFAULT_MUTE_DURATION;
use crate::handlers::message::apply_auto_mute;
use crate::services::moderation::actions;
use crate::storage::records::{Issuer, PunishmentKind};
use crate::utils::clock;
use crate::utils::formatting::{
    escape, format_duration, format_timestamp, mention, parse_duration,
};

/// Who a moderation command is aimed at: a numeric id argument, or the
/// author of the replied-to message.
struct Target {
    user_id: u64,
    label: String,
}

/// Split the target off the front of the argument string. Returns the
/// target and the remaining arguments.
fn resolve_target<'a>(msg: &Message, args: &'a str) -> Option<(Target, &'a str)> {
    let trimmed = args.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    if let Ok(user_id) = first.parse::<u64>() {
        let rest = parts.next().unwrap_or("").trim();
        return Some((
            Target {
                user_id,
                label: user_id.to_string(),
            },
            rest,
        ));
    }

    let replied = msg.reply_to_message()?.from.as_ref()?;
    Some((
        Target {
            user_id: replied.id.0,
            label: replied.first_name.clone(),
        },
        trimmed,
    ))
}

/// Split an optional leading duration token off the arguments.
fn split_duration(args: &str) -> (Option<Duration>, &str) {
    let trimmed = args.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    match parse_duration(first) {
        Some(duration) => (Some(duration), parts.next().unwrap_or("").trim()),
        None => (None, trimmed),
    }
}

fn reason_or_default(rest: &str) -> String {
    if rest.is_empty() {
        "not specified".to_string()
    } else {
        rest.to_string()
    }
}

async fn reply(bot: &Bot, msg: &Message, text: impl Into<String>) {
    if let Err(e) = bot
        .send_message(msg.chat.id, text.into())
        .parse_mode(ParseMode::Html)
        .await
    {
        error!("Failed to send reply: {}", e);
    }
}

/// Admin gate. A transport failure counts as "not an admin" so a flaky
/// API call can never grant moderation rights.
async fn ensure_admin(bot: &Bot, msg: &Message, data: &Data, user: &User) -> bool {
    match data.transport.is_admin(msg.chat.id.0, user.id.0).await {
        Ok(true) => true,
        Ok(false) => {
            reply(bot, msg, "❌ You do not have enough rights").await;
            false
        }
        Err(e) => {
            error!("Admin check for user {} failed: {}", user.id, e);
            reply(bot, msg, "❌ Could not verify your rights, try again").await;
            false
        }
    }
}

pub async fn ban(
    bot: &Bot,
    msg: &Message,
    data: &Data,
    admin: &User,
    args: &str,
) -> Result<(), Error> {
    if !ensure_admin(bot, msg, data, admin).await {
        return Ok(());
    }
    let Some((target, rest)) = resolve_target(msg, args) else {
        reply(bot, msg, "ℹ️ Usage: <code>/ban [id|reply] [1d|2h|30m] [reason]</code>").await;
        return Ok(());
    };

    let now = clock::now();
    if data
        .store
        .active(PunishmentKind::Ban, now)
        .await
        .iter()
        .any(|r| r.user_id == target.user_id)
    {
        reply(bot, msg, "ℹ️ That user is already banned").await;
        return Ok(());
    }

    let (duration, rest) = split_duration(rest);
    let reason = reason_or_default(rest);
    let issuer = Issuer::new(admin.id.0, admin.first_name.clone());

    match actions::ban_user(
        &data.store,
        data.transport.as_ref(),
        msg.chat.id.0,
        target.user_id,
        &issuer,
        &reason,
        duration,
        now,
    )
    .await
    {
        Ok(_) => {
            let term = duration.map_or("permanent".to_string(), format_duration);
            reply(
                bot,
                msg,
                format!(
                    "⛔️ <b>User banned</b>\n👤 {}\n⏰ Term: {}\n📜 Reason: {}\n🛡 By: {}",
                    mention(target.user_id, &target.label),
                    term,
                    escape(&reason),
                    escape(&admin.first_name),
                ),
            )
            .await;
        }
        Err(e) => reply(bot, msg, format!("❌ Ban failed: {}", escape(&e.to_string()))).await,
    }
    Ok(())
}

pub async fn mute(
    bot: &Bot,
    msg: &Message,
    data: &Data,
    admin: &User,
    args: &str,
) -> Result<(), Error> {
    if !ensure_admin(bot, msg, data, admin).await {
        return Ok(());
    }
    let Some((target, rest)) = resolve_target(msg, args) else {
        reply(bot, msg, "ℹ️ Usage: <code>/mute [id|reply] [1d|2h|30m] [reason]</code>").await;
        return Ok(());
    };

    let now = clock::now();
    if data
        .store
        .active(PunishmentKind::Mute, now)
        .await
        .iter()
        .any(|r| r.user_id == target.user_id)
    {
        reply(bot, msg, "ℹ️ That user is already muted").await;
        return Ok(());
    }

    // A mute without a duration defaults to one hour rather than forever.
    let (duration, rest) = split_duration(rest);
    let duration = duration.unwrap_or(DEFAULT_MUTE_DURATION);
    let reason = reason_or_default(rest);
    let issuer = Issuer::new(admin.id.0, admin.first_name.clone());

    match actions::mute_user(
        &data.store,
        data.transport.as_ref(),
        msg.chat.id.0,
        target.user_id,
        &issuer,
        &reason,
        Some(duration),
        now,
    )
    .await
    {
        Ok(_) => {
            reply(
                bot,
                msg,
                format!(
                    "🔇 <b>User muted</b>\n👤 {}\n⏰ Term: {}\n📜 Reason: {}\n🛡 By: {}",
                    mention(target.user_id, &target.label),
                    format_duration(duration),
                    escape(&reason),
                    escape(&admin.first_name),
                ),
            )
            .await;
        }
        Err(e) => reply(bot, msg, format!("❌ Mute failed: {}", escape(&e.to_string()))).await,
    }
    Ok(())
}

pub async fn warn(
    bot: &Bot,
    msg: &Message,
    data: &Data,
    admin: &User,
    args: &str,
) -> Result<(), Error> {
    if !ensure_admin(bot, msg, data, admin).await {
        return Ok(());
    }
    let Some((target, rest)) = resolve_target(msg, args) else {
        reply(bot, msg, "ℹ️ Usage: <code>/warn [id|reply] [reason]</code>").await;
        return Ok(());
    };

    let reason = reason_or_default(rest);
    let issuer = Issuer::new(admin.id.0, admin.first_name.clone());
    let now = clock::now();

    let outcome = match data
        .escalation
        .issue_warn(target.user_id, &reason, &issuer, now)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            reply(bot, msg, format!("❌ Warn failed: {}", escape(&e.to_string()))).await;
            return Ok(());
        }
    };
    apply_auto_mute(data, msg.chat.id.0, target.user_id, outcome.auto_mute.as_ref()).await;

    let mut text = format!(
        "⚠️ <b>Warning issued</b>\n👤 {}\n🚨 Warns: {}/3\n📜 Reason: {}\n🛡 By: {}",
        mention(target.user_id, &target.label),
        outcome.warn_count,
        escape(&reason),
        escape(&admin.first_name),
    );
    if outcome.auto_mute.is_some() {
        text.push_str("\n\n🔇 <b>Auto-mute for 3 hours</b>\nℹ️ Warn threshold exceeded");
    }
    reply(bot, msg, text).await;
    Ok(())
}

pub async fn unban(
    bot: &Bot,
    msg: &Message,
    data: &Data,
    admin: &User,
    args: &str,
) -> Result<(), Error> {
    if !ensure_admin(bot, msg, data, admin).await {
        return Ok(());
    }
    let Some((target, _)) = resolve_target(msg, args) else {
        reply(bot, msg, "ℹ️ Usage: <code>/unban [id]</code>").await;
        return Ok(());
    };

    match actions::unban_user(
        &data.store,
        data.transport.as_ref(),
        msg.chat.id.0,
        target.user_id,
    )
    .await
    {
        Ok(_) => {
            reply(
                bot,
                msg,
                format!(
                    "♻️ <b>User unbanned</b>\n👤 {}\n🛡 By: {}",
                    mention(target.user_id, &target.label),
                    escape(&admin.first_name),
                ),
            )
            .await;
        }
        Err(e) => reply(bot, msg, format!("❌ Unban failed: {}", escape(&e.to_string()))).await,
    }
    Ok(())
}

pub async fn unmute(
    bot: &Bot,
    msg: &Message,
    data: &Data,
    admin: &User,
    args: &str,
) -> Result<(), Error> {
    if !ensure_admin(bot, msg, data, admin).await {
        return Ok(());
    }
    let Some((target, _)) = resolve_target(msg, args) else {
        reply(bot, msg, "ℹ️ Usage: <code>/unmute [id|reply]</code>").await;
        return Ok(());
    };

    match actions::unmute_user(
        &data.store,
        data.transport.as_ref(),
        msg.chat.id.0,
        target.user_id,
    )
    .await
    {
        Ok(_) => {
            reply(
                bot,
                msg,
                format!(
                    "🔊 <b>User unmuted</b>\n👤 {}\n🛡 By: {}",
                    mention(target.user_id, &target.label),
                    escape(&admin.first_name),
                ),
            )
            .await;
        }
        Err(e) => reply(bot, msg, format!("❌ Unmute failed: {}", escape(&e.to_string()))).await,
    }
    Ok(())
}

pub async fn unwarn(
    bot: &Bot,
    msg: &Message,
    data: &Data,
    admin: &User,
    args: &str,
) -> Result<(), Error> {
    if !ensure_admin(bot, msg, data, admin).await {
        return Ok(());
    }
    let Some((target, _)) = resolve_target(msg, args) else {
        reply(bot, msg, "ℹ️ Usage: <code>/unwarn [id|reply]</code>").await;
        return Ok(());
    };

    match data.escalation.retract_last_warn(target.user_id).await {
        Ok(remaining) => {
            reply(
                bot,
                msg,
                format!(
                    "🔄 <b>Warning retracted</b>\n👤 {}\n🚨 Warns left: {}/3\n🛡 By: {}",
                    mention(target.user_id, &target.label),
                    remaining,
                    escape(&admin.first_name),
                ),
            )
            .await;
        }
        Err(e) if e.is_not_found() => {
            reply(bot, msg, "ℹ️ That user has no warnings").await;
        }
        Err(e) => reply(bot, msg, format!("❌ Unwarn failed: {}", escape(&e.to_string()))).await,
    }
    Ok(())
}

pub async fn list_bans(bot: &Bot, msg: &Message, data: &Data, user: &User) -> Result<(), Error> {
    if !ensure_admin(bot, msg, data, user).await {
        return Ok(());
    }

    let active = data.store.active(PunishmentKind::Ban, clock::now()).await;
    if active.is_empty() {
        reply(bot, msg, "ℹ️ No active bans").await;
        return Ok(());
    }

    let mut text = String::from("⛔️ <b>Active bans</b>\n");
    for ban in active {
        let term = ban
            .until_date
            .map_or("permanent".to_string(), |t| format!("until {}", format_timestamp(t)));
        text.push_str(&format!(
            "\n👤 {}\n⏰ {}\n📜 {}\n🛡 {}\n┄┄┄┄┄┄┄┄┄┄\n",
            mention(ban.user_id, &ban.user_id.to_string()),
            term,
            escape(&ban.reason),
            escape(&ban.admin_name),
        ));
    }
    reply(bot, msg, text).await;
    Ok(())
}

pub async fn list_mutes(bot: &Bot, msg: &Message, data: &Data, user: &User) -> Result<(), Error> {
    if !ensure_admin(bot, msg, data, user).await {
        return Ok(());
    }

    let now = clock::now();
    let active = data.store.active(PunishmentKind::Mute, now).await;
    if active.is_empty() {
        reply(bot, msg, "ℹ️ No active mutes").await;
        return Ok(());
    }

    let mut text = String::from("🔇 <b>Active mutes</b>\n");
    for mute in active {
        let remaining = mute.until_date.map_or("permanent".to_string(), |t| {
            format_duration(Duration::from_secs_f64((t - now).max(0.0)))
        });
        text.push_str(&format!(
            "\n👤 {}\n⏰ {} left\n📜 {}\n🛡 {}\n┄┄┄┄┄┄┄┄┄┄\n",
            mention(mute.user_id, &mute.user_id.to_string()),
            remaining,
            escape(&mute.reason),
            escape(&mute.admin_name),
        ));
    }
    reply(bot, msg, text).await;
    Ok(())
}

pub async fn list_warns(bot: &Bot, msg: &Message, data: &Data, user: &User) -> Result<(), Error> {
    if !ensure_admin(bot, msg, data, user).await {
        return Ok(());
    }

    let warns = data.store.all_warns().await;
    if warns.is_empty() {
        reply(bot, msg, "ℹ️ No warnings on record").await;
        return Ok(());
    }

    let mut by_user: BTreeMap<u64, Vec<_>> = BTreeMap::new();
    for warn in warns {
        by_user.entry(warn.user_id).or_default().push(warn);
    }

    let mut text = String::from("⚠️ <b>Warnings</b>\n");
    for (user_id, warns) in by_user {
        text.push_str(&format!(
            "\n👤 {} — {} warn(s)\n",
            mention(user_id, &user_id.to_string()),
            warns.len(),
        ));
        for warn in warns {
            text.push_str(&format!(
                "  📜 {} — {} ({})\n",
                escape(&warn.reason),
                escape(&warn.admin_name),
                format_timestamp(warn.date),
            ));
        }
    }
    reply(bot, msg, text).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_token_is_split_off() {
        let (duration, rest) = split_duration("2h being rude");
        assert_eq!(duration, Some(Duration::from_secs(7_200)));
        assert_eq!(rest, "being rude");
    }

    #[test]
    fn missing_duration_leaves_reason_intact() {
        let (duration, rest) = split_duration("being rude all day");
        assert_eq!(duration, None);
        assert_eq!(rest, "being rude all day");
    }

    #[test]
    fn empty_args_give_defaults() {
        let (duration, rest) = split_duration("");
        assert_eq!(duration, None);
        assert_eq!(reason_or_default(rest), "not specified");
    }
}
