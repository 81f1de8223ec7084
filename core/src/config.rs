//! Configuration management

use crate::mailbox::OverflowPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server information
    pub server: ServerConfig,
    /// Channel defaults and limits
    pub channels: ChannelConfig,
    /// Outbound mailbox settings
    pub mailbox: MailboxConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server name, used as the prefix of every reply
    pub name: String,
    /// Server description
    pub description: String,
}

/// Channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Modes applied to newly created channels
    pub default_modes: String,
    /// Maximum number of channels per client (0 = unlimited)
    pub max_channels_per_client: usize,
    /// Maximum channel name length in bytes
    pub max_channel_name_length: usize,
    /// Maximum ban list size per channel (0 = unlimited)
    pub max_bans: usize,
}

/// Mailbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// Maximum queued messages per client
    pub capacity: usize,
    /// Behaviour when a client's mailbox is full
    pub overflow: OverflowPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "irc.localhost".to_string(),
            description: "chanircd server".to_string(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            default_modes: "nt".to_string(),
            max_channels_per_client: 20,
            max_channel_name_length: 50,
            max_bans: 64,
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            capacity: 512,
            overflow: OverflowPolicy::Disconnect,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.name.trim().is_empty() {
            return Err(Error::Config("Server name cannot be empty".to_string()));
        }

        if self.server.name.contains(' ') {
            return Err(Error::Config("Server name cannot contain spaces".to_string()));
        }

        if self.mailbox.capacity == 0 {
            return Err(Error::Config("Mailbox capacity must be at least 1".to_string()));
        }

        if self.channels.max_channel_name_length < 2 {
            return Err(Error::Config(
                "Maximum channel name length must be at least 2".to_string(),
            ));
        }

        Ok(())
    }
}
