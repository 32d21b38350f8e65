use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, User};
use teloxide::utils::command::BotCommands;
use tracing::error;

use crate::bot::error::Error;
use crate::community::data::HeraldData;
use crate::constants::limits::MESSAGE_CHUNK_LIMIT;
use crate::services::price::dexscreener::{self, PairData, Timeframe};
use crate::services::stats::system;
use crate::services::throttle::rate_gate::Admission;
use crate::utils::clock;
use crate::utils::formatting::mention;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Community commands:")]
pub enum HeraldCommand {
    #[command(description = "welcome and usage.")]
    Start,
    #[command(description = "about the bot.")]
    About,
    #[command(description = "bot statistics (admins).")]
    Stat,
    #[command(description = "current pair price.")]
    Coin,
    #[command(description = "ping everyone the bot knows (admins).")]
    All,
    #[command(description = "ping chat administrators (admins).")]
    Mod,
}

/// Entry point for every community-bot command: flood gate first, then
/// usage accounting, then dispatch.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: HeraldCommand,
    data: Arc<HeraldData>,
) -> Result<(), Error> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };

    if let Admission::Rejected { retry_after } =
        data.flood_gate.admit(user.id.0, clock::now())
    {
        let wait = retry_after.ceil().max(1.0) as u64;
        bot.send_message(
            msg.chat.id,
            format!("⚠️ <b>Flood control</b>\nWait {wait}s before the next command."),
        )
        .parse_mode(ParseMode::Html)
        .await?;
        return Ok(());
    }

    data.stats
        .record_command(user.id.0, matches!(cmd, HeraldCommand::Coin))
        .await;

    match cmd {
        HeraldCommand::Start => start(&bot, &msg).await,
        HeraldCommand::About => about(&bot, &msg).await,
        HeraldCommand::Stat => stat(&bot, &msg, &data, &user).await,
        HeraldCommand::Coin => coin(&bot, &msg, &data).await,
        HeraldCommand::All => ping_all(&bot, &msg, &data, &user).await,
        HeraldCommand::Mod => ping_mods(&bot, &msg, &data, &user).await,
    }
}

async fn start(bot: &Bot, msg: &Message) -> Result<(), Error> {
    bot.send_message(
        msg.chat.id,
        "👋 <b>Welcome!</b>\n\n\
         🤖 I am the community assistant.\n\
         📊 /coin — current pair price\n\
         ℹ️ /about — about the bot\n\
         📢 /all — ping known members (admins)\n\
         👥 /mod — ping administrators (admins)",
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

async fn about(bot: &Bot, msg: &Message) -> Result<(), Error> {
    bot.send_message(
        msg.chat.id,
        "⭐ <b>About</b>\n\n\
         📊 Price lookups, member pings and usage statistics\n\
         ⚙️ Built to stay out of the way",
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

/// Uptime, host metrics and usage counters. Restricted to the configured
/// admin list; anyone else is ignored without a reply.
async fn stat(bot: &Bot, msg: &Message, data: &HeraldData, user: &User) -> Result<(), Error> {
    if !data.is_configured_admin(user.id.0) {
        return Ok(());
    }

    let cpu = system::cpu_temperature().await;
    let ram = system::ram_usage_percent().await;
    let usage = data.stats.snapshot().await;

    let uptime = chrono::Utc::now() - data.started_at;
    let hours = uptime.num_seconds() / 3600;
    let minutes = (uptime.num_seconds() % 3600) / 60;

    bot.send_message(
        msg.chat.id,
        format!(
            "📊 <b>Bot statistics</b>\n\n\
             💻 <b>System</b>\n\
             🔄 CPU: {cpu:.2}°C\n\
             💾 RAM: {ram:.2}%\n\
             ⏱ Uptime: {hours}h {minutes}m\n\n\
             👥 <b>Users</b>\n\
             📈 Total users: {}\n\
             🔄 /coin requests: {}\n\
             📊 Activity today: {} commands",
            usage.total_users(),
            usage.coin_requests,
            usage.daily_activity,
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub fn timeframe_keyboard() -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = Timeframe::ALL
        .iter()
        .map(|tf| InlineKeyboardButton::callback(tf.button_label(), tf.callback()))
        .collect();
    let rows: Vec<Vec<InlineKeyboardButton>> =
        buttons.chunks(3).map(|chunk| chunk.to_vec()).collect();
    InlineKeyboardMarkup::new(rows)
}

fn format_pair_overview(pair: &PairData) -> String {
    let change = pair.change(Timeframe::D1);
    let trend = if change > 0.0 {
        "📈 Rising"
    } else {
        "📉 Falling"
    };
    format!(
        "🏦 <b>Price analysis</b>\n\n\
         💰 Price: ${:.6}\n\
         📊 24h: {:+.2}%\n\
         📈 Trend: {}\n\n\
         📊 <b>Market data</b>\n\
         💎 Market cap: ${:.2}\n\
         💧 Liquidity: ${:.2}\n\
         📈 Volume (24h): ${:.2}\n\n\
         🕒 {}",
        pair.price(),
        change,
        trend,
        pair.market_cap(),
        pair.liquidity_usd(),
        pair.volume_24h(),
        chrono::Utc::now().format("%d.%m.%Y %H:%M:%S"),
    )
}

fn format_pair_timeframe(pair: &PairData, timeframe: Timeframe) -> String {
    let change = pair.change(timeframe);
    let trend = if change > 0.0 {
        "📈 Rising"
    } else {
        "📉 Falling"
    };
    format!(
        "🏦 <b>Price over {}</b>\n\n\
         💰 Current price: ${:.6}\n\
         📊 Change: {:+.2}%\n\
         📈 Trend: {}\n\n\
         🕒 {}",
        timeframe.label(),
        pair.price(),
        change,
        trend,
        chrono::Utc::now().format("%d.%m.%Y %H:%M:%S"),
    )
}

async fn coin(bot: &Bot, msg: &Message, data: &HeraldData) -> Result<(), Error> {
    match dexscreener::fetch_pair(&data.http, &data.settings.pair_address).await {
        Ok(pair) => {
            bot.send_message(msg.chat.id, format_pair_overview(&pair))
                .parse_mode(ParseMode::Html)
                .reply_markup(timeframe_keyboard())
                .await?;
        }
        Err(e) => {
            error!("Price lookup failed: {}", e);
            bot.send_message(
                msg.chat.id,
                "❌ <b>Could not fetch price data</b>\nPlease try again later.",
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
    }
    Ok(())
}

/// Timeframe button presses on a price message: re-fetch and re-render.
pub async fn handle_timeframe(
    bot: Bot,
    q: CallbackQuery,
    data: Arc<HeraldData>,
) -> Result<(), Error> {
    let timeframe = q.data.as_deref().and_then(Timeframe::from_callback);
    let message = q.message.as_ref().and_then(|m| m.regular_message());

    if let (Some(timeframe), Some(message)) = (timeframe, message) {
        match dexscreener::fetch_pair(&data.http, &data.settings.pair_address).await {
            Ok(pair) => {
                bot.edit_message_text(
                    message.chat.id,
                    message.id,
                    format_pair_timeframe(&pair, timeframe),
                )
                .parse_mode(ParseMode::Html)
                .reply_markup(timeframe_keyboard())
                .await?;
            }
            Err(e) => {
                error!("Price lookup failed: {}", e);
                bot.edit_message_text(
                    message.chat.id,
                    message.id,
                    "❌ Could not fetch price data. Try again later.",
                )
                .reply_markup(timeframe_keyboard())
                .await?;
            }
        }
    }

    bot.answer_callback_query(q.id).await?;
    Ok(())
}

/// Admin gate for the ping commands: chat administrators only.
async fn ensure_chat_admin(
    bot: &Bot,
    msg: &Message,
    user: &User,
) -> Result<bool, Error> {
    let admins = bot.get_chat_administrators(msg.chat.id).await?;
    if admins.iter().any(|member| member.user.id == user.id) {
        return Ok(true);
    }
    bot.send_message(
        msg.chat.id,
        "❌ <b>Access denied</b>\nThis command is for administrators only.",
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(false)
}

/// Mention everyone the bot has seen. The Bot API cannot enumerate chat
/// members, so the usage roster stands in for the member list.
async fn ping_all(bot: &Bot, msg: &Message, data: &HeraldData, user: &User) -> Result<(), Error> {
    if !data.in_scope(msg.chat.id.0) {
        return Ok(());
    }
    if !ensure_chat_admin(bot, msg, user).await? {
        return Ok(());
    }

    let roster = data.stats.known_users().await;
    if roster.is_empty() {
        bot.send_message(msg.chat.id, "ℹ️ I have not seen anyone yet")
            .await?;
        return Ok(());
    }

    let mut tags: Vec<String> = Vec::new();
    let mut length = 0;
    for user_id in roster {
        let tag = mention(user_id, &user_id.to_string());
        length += tag.len() + 1;
        tags.push(tag);
        if length > MESSAGE_CHUNK_LIMIT {
            bot.send_message(
                msg.chat.id,
                format!("📢 <b>Attention!</b>\n\n{}", tags.join(" ")),
            )
            .parse_mode(ParseMode::Html)
            .await?;
            tags.clear();
            length = 0;
        }
    }
    if !tags.is_empty() {
        bot.send_message(
            msg.chat.id,
            format!("📢 <b>Attention!</b>\n\n{}", tags.join(" ")),
        )
        .parse_mode(ParseMode::Html)
        .await?;
    }
    Ok(())
}

async fn ping_mods(bot: &Bot, msg: &Message, data: &HeraldData, user: &User) -> Result<(), Error> {
    if !data.in_scope(msg.chat.id.0) {
        return Ok(());
    }
    if !ensure_chat_admin(bot, msg, user).await? {
        return Ok(());
    }

    let admins = bot.get_chat_administrators(msg.chat.id).await?;
    let tags: Vec<String> = admins
        .iter()
        .filter(|member| !member.user.is_bot)
        .map(|member| mention(member.user.id.0, &member.user.first_name))
        .collect();

    if tags.is_empty() {
        bot.send_message(msg.chat.id, "ℹ️ No administrators found")
            .await?;
        return Ok(());
    }

    bot.send_message(
        msg.chat.id,
        format!("👥 <b>Attention, administrators!</b>\n\n{}", tags.join(" ")),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

/// Welcome message for new chat members, scoped to the configured chat.
pub async fn handle_new_members(
    bot: Bot,
    msg: Message,
    data: Arc<HeraldData>,
) -> Result<(), Error> {
    if !data.in_scope(msg.chat.id.0) {
        return Ok(());
    }
    let Some(new_members) = msg.new_chat_members() else {
        return Ok(());
    };

    for member in new_members.iter().filter(|u| !u.is_bot) {
        bot.send_message(
            msg.chat.id,
            format!(
                "🌟 Welcome to the chat, {}!\n\n\
                 📊 Use /coin to check the current price\n\
                 ℹ️ /start shows everything I can do",
                mention(member.id.0, &member.first_name)
            ),
        )
        .parse_mode(ParseMode::Html)
        .await?;
    }
    Ok(())
}
