use std::collections::HashSet;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::time::sleep;

use crate::bot::error::Error;

const REEL: [&str; 7] = ["🍎", "🍊", "🍋", "🍒", "🔔", "💎", "7️⃣"];

/// Slot machine with a staged reveal. The reel is spun up-front; the RNG
/// must not live across an await.
pub async fn slot(bot: &Bot, msg: &Message) -> Result<(), Error> {
    let spin: Vec<&str> = {
        let mut rng = rand::thread_rng();
        (0..3)
            .map(|_| REEL.choose(&mut rng).copied().unwrap_or(REEL[0]))
            .collect()
    };

    let sent = bot.send_message(msg.chat.id, "🎰 | - | - | - |").await?;
    sleep(Duration::from_millis(500)).await;
    bot.edit_message_text(msg.chat.id, sent.id, format!("🎰 | {} | - | - |", spin[0]))
        .await?;
    sleep(Duration::from_millis(500)).await;
    bot.edit_message_text(
        msg.chat.id,
        sent.id,
        format!("🎰 | {} | {} | - |", spin[0], spin[1]),
    )
    .await?;
    sleep(Duration::from_millis(500)).await;

    let verdict = match spin.iter().collect::<HashSet<_>>().len() {
        1 => "🏆 <b>JACKPOT!</b>",
        2 => "⭐ Not bad!",
        _ => "💔 Try again",
    };
    bot.edit_message_text(
        msg.chat.id,
        sent.id,
        format!("🎰 | {} | {} | {} |\n\n{}", spin[0], spin[1], spin[2], verdict),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn dice(bot: &Bot, msg: &Message) -> Result<(), Error> {
    let (first, second) = {
        let mut rng = rand::thread_rng();
        (rng.gen_range(1..=6), rng.gen_range(1..=6))
    };
    bot.send_message(
        msg.chat.id,
        format!(
            "🎲 <b>Dice</b>\n\nFirst: <b>{first}</b>\nSecond: <b>{second}</b>\n\n⭐ Total: <b>{}</b>",
            first + second
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn flip(bot: &Bot, msg: &Message) -> Result<(), Error> {
    let heads = rand::thread_rng().gen_bool(0.5);

    let sent = bot.send_message(msg.chat.id, "🪙 Flipping...").await?;
    sleep(Duration::from_secs(1)).await;

    let (emoji, side) = if heads { ("🦅", "HEADS") } else { ("👑", "TAILS") };
    bot.edit_message_text(
        msg.chat.id,
        sent.id,
        format!("🪙 <b>Coin flip</b>\n\n{emoji} It landed on <b>{side}</b>"),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn casino(bot: &Bot, msg: &Message) -> Result<(), Error> {
    let numbers: Vec<u32> = {
        let mut rng = rand::thread_rng();
        (0..3).map(|_| rng.gen_range(0..=9)).collect()
    };

    let sent = bot.send_message(msg.chat.id, "🎯 | ? | ? | ? |").await?;
    sleep(Duration::from_millis(700)).await;
    bot.edit_message_text(msg.chat.id, sent.id, format!("🎯 | {} | ? | ? |", numbers[0]))
        .await?;
    sleep(Duration::from_millis(700)).await;
    bot.edit_message_text(
        msg.chat.id,
        sent.id,
        format!("🎯 | {} | {} | ? |", numbers[0], numbers[1]),
    )
    .await?;
    sleep(Duration::from_millis(700)).await;

    let verdict = match numbers.iter().collect::<HashSet<_>>().len() {
        1 => "🏆 <b>JACKPOT!</b>",
        2 => "⭐ Good combination!",
        _ => "💔 Better luck next time",
    };
    bot.edit_message_text(
        msg.chat.id,
        sent.id,
        format!(
            "🎯 | {} | {} | {} |\n\n{}",
            numbers[0], numbers[1], numbers[2], verdict
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}
