//! Client records

use crate::mailbox::{Delivery, Mailbox};
use crate::{Message, Prefix};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Stable identity of a connected client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
struct Membership {
    channels: HashSet<String>,
    disconnected: bool,
}

/// A registered client as seen by the channel core
///
/// Identity fields are fixed for the lifetime of the connection. The set of
/// joined channels only changes through the registry, which keeps it in step
/// with each channel's member set. Once disconnected, no channel can be added.
pub struct Client {
    id: ClientId,
    nick: String,
    username: String,
    host: String,
    mailbox: Mailbox,
    membership: Mutex<Membership>,
}

impl Client {
    /// Create a new client
    pub fn new(
        id: ClientId,
        nick: impl Into<String>,
        username: impl Into<String>,
        host: impl Into<String>,
        mailbox: Mailbox,
    ) -> Self {
        Self {
            id,
            nick: nick.into(),
            username: username.into(),
            host: host.into(),
            mailbox,
            membership: Mutex::new(Membership::default()),
        }
    }

    /// Get client ID
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Get client nickname
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Get client username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get client hostname
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Prefix used on messages originating from this client
    pub fn prefix(&self) -> Prefix {
        Prefix::User {
            nick: self.nick.clone(),
            user: self.username.clone(),
            host: self.host.clone(),
        }
    }

    /// Full `nick!user@host` mask
    pub fn mask(&self) -> String {
        format!("{}!{}@{}", self.nick, self.username, self.host)
    }

    /// Queue a message for this client
    pub fn send(&self, message: Message) -> Delivery {
        let outcome = self.mailbox.send(message);
        if !outcome.is_queued() {
            tracing::debug!("Message for {} ({}) not queued: {:?}", self.nick, self.id, outcome);
        }
        outcome
    }

    /// Get the client's mailbox
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Names of the channels this client is in, sorted
    pub fn channels(&self) -> Vec<String> {
        sorted(&self.membership.lock().channels)
    }

    /// Check if client is in a channel (name must already be case folded)
    pub fn is_in_channel(&self, name: &str) -> bool {
        self.membership.lock().channels.contains(name)
    }

    /// Number of channels joined
    pub fn channel_count(&self) -> usize {
        self.membership.lock().channels.len()
    }

    /// Whether the registry has started tearing this client down
    pub fn is_disconnected(&self) -> bool {
        self.membership.lock().disconnected
    }

    /// Record a joined channel; refused once the client is disconnected
    pub(crate) fn add_channel(&self, name: &str) -> bool {
        let mut membership = self.membership.lock();
        if membership.disconnected {
            return false;
        }
        membership.channels.insert(name.to_string());
        true
    }

    pub(crate) fn remove_channel(&self, name: &str) {
        self.membership.lock().channels.remove(name);
    }

    /// Flag the client as disconnected and snapshot its channels in one step
    ///
    /// Returns `None` if it was already flagged.
    pub(crate) fn mark_disconnected(&self) -> Option<Vec<String>> {
        let mut membership = self.membership.lock();
        if membership.disconnected {
            return None;
        }
        membership.disconnected = true;
        Some(sorted(&membership.channels))
    }
}

fn sorted(channels: &HashSet<String>) -> Vec<String> {
    let mut channels: Vec<String> = channels.iter().cloned().collect();
    channels.sort();
    channels
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("mask", &self.mask())
            .field("channels", &self.channels())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::OverflowPolicy;

    #[test]
    fn test_prefix_and_mask() {
        let (mailbox, _rx) = Mailbox::new(4, OverflowPolicy::DropNewest);
        let client = Client::new(ClientId(1), "alice", "al", "host.example.com", mailbox);
        assert_eq!(client.mask(), "alice!al@host.example.com");
        assert_eq!(client.prefix().to_string(), "alice!al@host.example.com");
    }

    #[test]
    fn test_channel_set() {
        let (mailbox, _rx) = Mailbox::new(4, OverflowPolicy::DropNewest);
        let client = Client::new(ClientId(1), "alice", "al", "host", mailbox);
        assert!(client.add_channel("#b"));
        assert!(client.add_channel("#a"));
        assert_eq!(client.channels(), vec!["#a", "#b"]);
        assert!(client.is_in_channel("#a"));
        client.remove_channel("#a");
        assert!(!client.is_in_channel("#a"));
        assert_eq!(client.channel_count(), 1);
    }

    #[test]
    fn test_disconnected_client_refuses_channels() {
        let (mailbox, _rx) = Mailbox::new(4, OverflowPolicy::DropNewest);
        let client = Client::new(ClientId(1), "alice", "al", "host", mailbox);
        assert!(client.add_channel("#a"));
        assert_eq!(client.mark_disconnected(), Some(vec!["#a".to_string()]));
        assert!(client.is_disconnected());
        assert!(!client.add_channel("#b"));
        assert!(!client.is_in_channel("#b"));
        assert_eq!(client.mark_disconnected(), None);
    }
}
