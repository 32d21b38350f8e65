use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatPermissions, MessageId, UserId};
use tracing::debug;

use crate::bot::error::Error;
use crate::transport::ChatTransport;

/// Telegram Bot API adapter for the moderation core.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn until_datetime(until: Option<f64>) -> Option<DateTime<Utc>> {
    until.and_then(|ts| DateTime::<Utc>::from_timestamp(ts as i64, 0))
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn restrict(&self, chat_id: i64, user_id: u64, until: Option<f64>) -> Result<(), Error> {
        let mut req =
            self.bot
                .restrict_chat_member(ChatId(chat_id), UserId(user_id), ChatPermissions::empty());
        if let Some(dt) = until_datetime(until) {
            req.until_date = Some(dt);
        }
        req.await?;
        debug!("Restricted user {} in chat {}", user_id, chat_id);
        Ok(())
    }

    async fn unrestrict(&self, chat_id: i64, user_id: u64) -> Result<(), Error> {
        self.bot
            .restrict_chat_member(ChatId(chat_id), UserId(user_id), ChatPermissions::all())
            .await?;
        debug!("Unrestricted user {} in chat {}", user_id, chat_id);
        Ok(())
    }

    async fn ban(&self, chat_id: i64, user_id: u64, until: Option<f64>) -> Result<(), Error> {
        let mut req = self.bot.ban_chat_member(ChatId(chat_id), UserId(user_id));
        if let Some(dt) = until_datetime(until) {
            req.until_date = Some(dt);
        }
        req.await?;
        debug!("Banned user {} in chat {}", user_id, chat_id);
        Ok(())
    }

    async fn unban(&self, chat_id: i64, user_id: u64) -> Result<(), Error> {
        self.bot
            .unban_chat_member(ChatId(chat_id), UserId(user_id))
            .await?;
        debug!("Unbanned user {} in chat {}", user_id, chat_id);
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), Error> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await?;
        Ok(())
    }

    async fn is_admin(&self, chat_id: i64, user_id: u64) -> Result<bool, Error> {
        let member = self
            .bot
            .get_chat_member(ChatId(chat_id), UserId(user_id))
            .await?;
        Ok(member.is_privileged())
    }
}
