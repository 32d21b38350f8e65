use async_trait::async_trait;

use crate::bot::error::Error;

pub mod telegram;

/// Chat-side effects the moderation core needs, kept behind a trait so the
/// punishment lifecycle never touches wire types.
///
/// Every call is fallible and an error means "not applied": direct
/// commands surface it and skip persistence, the sweep retries next cycle.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Take away the right to send messages, optionally until `until`
    /// (epoch seconds). The restricted permission set is fixed: no sending
    /// of any kind.
    async fn restrict(&self, chat_id: i64, user_id: u64, until: Option<f64>) -> Result<(), Error>;

    /// Restore the default member permissions.
    async fn unrestrict(&self, chat_id: i64, user_id: u64) -> Result<(), Error>;

    /// Remove the user from the chat, optionally until `until`.
    async fn ban(&self, chat_id: i64, user_id: u64, until: Option<f64>) -> Result<(), Error>;

    async fn unban(&self, chat_id: i64, user_id: u64) -> Result<(), Error>;

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), Error>;

    async fn is_admin(&self, chat_id: i64, user_id: u64) -> Result<bool, Error>;
}
