//! chanircd channel core
//!
//! Channel state, membership and the channel-related IRC commands (JOIN,
//! PART, MODE, TOPIC, NAMES, PRIVMSG/NOTICE) for an RFC 1459 style server.
//! Connection handling and registration live outside this crate; they feed
//! parsed [`Message`]s into a [`CommandRouter`] and drain each client's
//! [`Mailbox`].

pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mailbox;
pub mod message;
pub mod modes;
pub mod numeric;
pub mod registry;
pub mod utils;

#[cfg(test)]
mod tests;

pub use channel::{BanEntry, BanMask, BanOutcome, Channel, ChannelMode, ModeSet};
pub use client::{Client, ClientId};
pub use config::{ChannelConfig, Config, MailboxConfig, ServerConfig};
pub use error::{Error, Result};
pub use handlers::{CommandHandler, CommandRouter, HandlerResult};
pub use mailbox::{spawn_delivery, Delivery, LineSink, Mailbox, MailboxReceiver, MessageSink, OverflowPolicy};
pub use message::{Message, MessageType, Prefix};
pub use modes::{ModeChange, ModeFailure, ModeParseError};
pub use numeric::NumericReply;
pub use registry::{ChannelRef, Registry};

/// Re-exports for convenience
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use tracing::{debug, error, info, warn};
