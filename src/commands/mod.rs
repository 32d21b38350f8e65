pub mod games;
pub mod info;
pub mod moderation;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use tracing::error;

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::services::throttle::rate_gate::Admission;
use crate::utils::clock;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Moderation commands:")]
pub enum ModCommand {
    #[command(description = "greet the bot.")]
    Start,
    #[command(description = "list commands.")]
    Help,
    #[command(description = "about this bot.")]
    About,
    #[command(description = "ban: /ban <id|reply> [1d|2h|30m] [reason].")]
    Ban(String),
    #[command(description = "mute: /mute <id|reply> [1d|2h|30m] [reason].")]
    Mute(String),
    #[command(description = "warn: /warn <id|reply> [reason].")]
    Warn(String),
    #[command(description = "lift a ban: /unban <id>.")]
    Unban(String),
    #[command(description = "lift a mute: /unmute <id|reply>.")]
    Unmute(String),
    #[command(description = "retract the latest warn: /unwarn <id|reply>.")]
    Unwarn(String),
    #[command(description = "list active bans.")]
    Bans,
    #[command(description = "list active mutes.")]
    Mutes,
    #[command(description = "list warns.")]
    Warns,
    #[command(description = "spin the slots.")]
    Slot,
    #[command(description = "roll two dice.")]
    Dice,
    #[command(description = "flip a coin.")]
    Flip,
    #[command(description = "casino numbers.")]
    Casino,
}

/// Entry point for every moderation-bot command: scope check and flood
/// gate first, then dispatch.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: ModCommand,
    data: Arc<Data>,
) -> Result<(), Error> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };
    if !data.in_scope(msg.chat.id.0) {
        return Ok(());
    }

    if let Admission::Rejected { retry_after } = data.flood_gate.admit(user.id.0, clock::now()) {
        let wait = retry_after.ceil().max(1.0) as u64;
        if let Err(e) = bot
            .send_message(
                msg.chat.id,
                format!("⚠️ <b>Flood control</b>\nWait {wait}s before the next command."),
            )
            .parse_mode(ParseMode::Html)
            .await
        {
            error!("Failed to send flood notice: {}", e);
        }
        return Ok(());
    }

    match cmd {
        ModCommand::Start => info::start(&bot, &msg).await,
        ModCommand::Help => info::help(&bot, &msg).await,
        ModCommand::About => info::about(&bot, &msg).await,
        ModCommand::Ban(args) => moderation::ban(&bot, &msg, &data, &user, &args).await,
        ModCommand::Mute(args) => moderation::mute(&bot, &msg, &data, &user, &args).await,
        ModCommand::Warn(args) => moderation::warn(&bot, &msg, &data, &user, &args).await,
        ModCommand::Unban(args) => moderation::unban(&bot, &msg, &data, &user, &args).await,
        ModCommand::Unmute(args) => moderation::unmute(&bot, &msg, &data, &user, &args).await,
        ModCommand::Unwarn(args) => moderation::unwarn(&bot, &msg, &data, &user, &args).await,
        ModCommand::Bans => moderation::list_bans(&bot, &msg, &data, &user).await,
        ModCommand::Mutes => moderation::list_mutes(&bot, &msg, &data, &user).await,
        ModCommand::Warns => moderation::list_warns(&bot, &msg, &data, &user).await,
        ModCommand::Slot => games::slot(&bot, &msg).await,
        ModCommand::Dice => games::dice(&bot, &msg).await,
        ModCommand::Flip => games::flip(&bot, &msg).await,
        ModCommand::Casino => games::casino(&bot, &msg).await,
    }
}
