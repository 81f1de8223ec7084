//! Error types for the channel core
//!
//! Protocol failures (bad keys, missing privileges, unknown modes) are not
//! represented here: they are numeric replies queued to the offending client.
//! This type covers misuse of the API, configuration and transport problems.

use thiserror::Error;

/// Main error type for the channel core
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Configuration serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Message parsing error: {0}")]
    MessageParse(String),

    #[error("Invalid channel name: {0}")]
    InvalidChannelName(String),

    #[error("Nickname already in use: {0}")]
    NicknameInUse(String),

    #[error("Client {0} is already registered")]
    DuplicateClient(u64),

    #[error("Mailbox closed")]
    MailboxClosed,

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Generic(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}
