use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Telegram API error: {0}")]
    Transport(#[from] teloxide::RequestError),

    #[error("Snapshot write failed: {0}")]
    Persistence(#[source] std::io::Error),

    #[error("Snapshot is malformed: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("No {kind} on record for user {user_id}")]
    NotFound { kind: &'static str, user_id: u64 },

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    #[error("Price API error: {0}")]
    PriceApi(#[from] reqwest::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Error::Custom(msg.into())
    }

    pub fn not_found(kind: &'static str, user_id: u64) -> Self {
        Error::NotFound { kind, user_id }
    }

    /// True for the errors a remove/retract caller can treat as "nothing to do".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
