use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::error::Error;

pub async fn start(bot: &Bot, msg: &Message) -> Result<(), Error> {
    bot.send_message(
        msg.chat.id,
        "👑 <b>Warden</b>\n\n\
         💂 Hi! I keep order in this chat.\n\
         🛡 Bans, mutes and warnings, plus spam and caps protection.\n\n\
         ℹ️ Use /help for the command list\n\
         🎲 There are mini-games too!",
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn help(bot: &Bot, msg: &Message) -> Result<(), Error> {
    bot.send_message(
        msg.chat.id,
        "📚 <b>Commands</b>\n\n\
         🛡 <b>Moderation</b>\n\
         ⛔️ <code>/ban [id|reply] [1d|2h|30m] [reason]</code>\n\
         🔇 <code>/mute [id|reply] [1d|2h|30m] [reason]</code>\n\
         ⚠️ <code>/warn [id|reply] [reason]</code>\n\
         ♻️ <code>/unban [id]</code>\n\
         🔊 <code>/unmute [id|reply]</code>\n\
         🔄 <code>/unwarn [id|reply]</code>\n\n\
         📜 <b>Listings</b>\n\
         📄 /bans — active bans\n\
         📄 /mutes — active mutes\n\
         📄 /warns — warnings\n\n\
         🎲 <b>Mini-games</b>\n\
         🎰 /slot · 🎲 /dice · 🪙 /flip · 🎯 /casino",
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn about(bot: &Bot, msg: &Message) -> Result<(), Error> {
    bot.send_message(
        msg.chat.id,
        "⭐ <b>About</b>\n\n\
         ⚙️ Chat moderation with a persistent punishment log:\n\
         • warnings with automatic escalation\n\
         • timed bans and mutes that lift themselves\n\
         • flood, spam and caps protection\n\
         • mini-games",
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}
