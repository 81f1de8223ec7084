//! Process-wide channel and client registry
//!
//! # Locking
//!
//! The top-level maps are [`DashMap`]s; each channel sits behind its own
//! [`parking_lot::Mutex`]. Every change to a channel (membership, modes,
//! topic) and every broadcast about it happens while that channel's lock is
//! held, so members observe one channel's events in the order they were
//! applied. Lock order is always channel first, then map shards or a
//! client's channel set; no code takes a channel lock while holding a map
//! shard.
//!
//! A channel is removed from the maps while its lock is held and is flagged
//! destroyed. Anyone who looked it up just before will see the flag after
//! locking and retry against the map.

use crate::channel::{Channel, ModeSet};
use crate::client::{Client, ClientId};
use crate::config::Config;
use crate::mailbox::{Mailbox, MailboxReceiver};
use crate::utils::string::{irc_lowercase, is_valid_channel_name};
use crate::{Error, Message, MessageType, NumericReply, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to a live channel
pub type ChannelRef = Arc<Mutex<Channel>>;

/// Longest names list carried by a single RPL_NAMREPLY
const NAMES_LINE_BUDGET: usize = 400;

/// Registry of channels and clients
pub struct Registry {
    config: Arc<Config>,
    /// Channels by case folded name
    channels: DashMap<String, ChannelRef>,
    /// Clients by ID
    clients: DashMap<ClientId, Arc<Client>>,
    /// Case folded nickname to client ID
    nicks: DashMap<String, ClientId>,
    /// Channel name to member IDs, mirroring each channel's member set
    members_by_channel: DashMap<String, HashSet<ClientId>>,
    next_id: AtomicU64,
}

impl Registry {
    /// Create an empty registry
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            channels: DashMap::new(),
            clients: DashMap::new(),
            nicks: DashMap::new(),
            members_by_channel: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Server name used as the prefix of replies
    pub fn server_name(&self) -> &str {
        &self.config.server.name
    }

    // ----- clients -----

    /// Allocate a fresh client ID
    pub fn next_client_id(&self) -> ClientId {
        ClientId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Create a mailbox sized and configured for this server
    pub fn new_mailbox(&self) -> (Mailbox, MailboxReceiver) {
        Mailbox::new(self.config.mailbox.capacity, self.config.mailbox.overflow)
    }

    /// Register a client; IDs and (case folded) nicknames must be unique
    pub fn register_client(&self, client: Arc<Client>) -> Result<()> {
        let id = client.id();
        if self.clients.contains_key(&id) {
            return Err(Error::DuplicateClient(id.0));
        }

        match self.nicks.entry(irc_lowercase(client.nick())) {
            Entry::Occupied(_) => return Err(Error::NicknameInUse(client.nick().to_string())),
            Entry::Vacant(entry) => {
                entry.insert(id);
            }
        }

        tracing::debug!("Registered client {} as {}", id, client.mask());
        self.clients.insert(id, client);
        Ok(())
    }

    /// Allocate an ID and mailbox and register a new client
    pub fn connect(
        &self,
        nick: &str,
        username: &str,
        host: &str,
    ) -> Result<(Arc<Client>, MailboxReceiver)> {
        let (mailbox, receiver) = self.new_mailbox();
        let client = Arc::new(Client::new(self.next_client_id(), nick, username, host, mailbox));
        self.register_client(client.clone())?;
        Ok((client, receiver))
    }

    /// Look up a client by ID
    pub fn client(&self, id: ClientId) -> Option<Arc<Client>> {
        self.clients.get(&id).map(|entry| entry.value().clone())
    }

    /// Look up a client by nickname, ignoring case
    pub fn resolve_client_by_nick(&self, nick: &str) -> Option<Arc<Client>> {
        let id = *self.nicks.get(&irc_lowercase(nick))?;
        self.client(id)
    }

    /// Number of registered clients
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// IDs of every registered client, sorted
    pub fn client_ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self.clients.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }

    /// Remove a client from every channel and from the registry
    ///
    /// Each peer sharing at least one channel receives a single QUIT, sent
    /// while the first shared channel is locked. The client's mailbox is
    /// closed. The client is flagged first so no join can slip in behind the
    /// channel snapshot. Returns false if the client was not registered or is
    /// already being disconnected.
    pub fn disconnect_client(&self, id: ClientId, reason: &str) -> bool {
        let client = match self.client(id) {
            Some(client) => client,
            None => return false,
        };
        let channels = match client.mark_disconnected() {
            Some(channels) => channels,
            None => return false,
        };

        let quit = Message::new(MessageType::Quit, Vec::new())
            .with_prefix(client.prefix())
            .with_trailing(reason);
        let mut notified: HashSet<ClientId> = HashSet::new();
        notified.insert(id);

        for name in channels {
            self.with_channel(&name, |channel| {
                self.detach(channel, &client);
                for peer in channel.member_ids() {
                    if notified.insert(peer) {
                        self.send_to(peer, &quit);
                    }
                }
            });
        }

        self.nicks.remove_if(&irc_lowercase(client.nick()), |_, owner| *owner == id);
        self.clients.remove(&id);
        client.mailbox().close();

        tracing::info!("Client {} ({}) disconnected: {}", client.nick(), id, reason);
        true
    }

    // ----- channels -----

    /// Case fold and validate a channel name
    fn canonical_name(&self, name: &str) -> Result<String> {
        if !is_valid_channel_name(name, self.config.channels.max_channel_name_length) {
            tracing::warn!("Malformed channel name: {:?}", name);
            return Err(Error::InvalidChannelName(name.to_string()));
        }
        Ok(irc_lowercase(name))
    }

    /// Initial modes for new channels, from the configured default mode string
    fn default_channel_modes(&self) -> ModeSet {
        let (modes, unknown) = ModeSet::parse(&self.config.channels.default_modes);
        for flag in unknown {
            tracing::warn!("Unknown default channel flag: {}", flag);
        }
        modes
    }

    /// Look up a channel without creating it
    pub fn resolve_channel(&self, name: &str) -> Option<ChannelRef> {
        self.channels
            .get(&irc_lowercase(name))
            .map(|entry| entry.value().clone())
    }

    /// Look up a channel, creating it (empty) if absent
    pub fn resolve_or_create_channel(&self, name: &str) -> Result<ChannelRef> {
        let name = self.canonical_name(name)?;

        if let Some(existing) = self.channels.get(&name) {
            return Ok(existing.value().clone());
        }

        match self.channels.entry(name.clone()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let channel = Arc::new(Mutex::new(Channel::new(
                    name.clone(),
                    self.default_channel_modes(),
                )));
                self.members_by_channel.insert(name.clone(), HashSet::new());
                entry.insert(channel.clone());
                tracing::info!("Channel {} created", name);
                Ok(channel)
            }
        }
    }

    /// Run `f` on a locked, live channel. Returns `None` if it does not exist.
    ///
    /// A channel left empty by `f` is destroyed before the lock is released.
    /// `f` must not lock the same channel again.
    pub fn with_channel<R>(&self, name: &str, f: impl FnOnce(&mut Channel) -> R) -> Option<R> {
        let handle = self.resolve_channel(name)?;
        let mut channel = handle.lock();
        if channel.is_destroyed() {
            return None;
        }

        let result = f(&mut *channel);
        if channel.is_empty() {
            self.destroy_channel(&mut channel);
        }
        Some(result)
    }

    /// Like [`Registry::with_channel`], creating the channel if needed
    ///
    /// A channel created here that `f` leaves without members is destroyed
    /// again, so failed joins do not leak empty channels.
    pub fn with_channel_or_create<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Channel) -> R,
    ) -> Result<R> {
        loop {
            let handle = self.resolve_or_create_channel(name)?;
            let mut channel = handle.lock();
            if channel.is_destroyed() {
                continue;
            }

            let result = f(&mut *channel);
            if channel.is_empty() {
                self.destroy_channel(&mut channel);
            }
            return Ok(result);
        }
    }

    /// Unregister a channel; the caller guarantees it has no members
    pub fn destroy_channel(&self, channel: &mut Channel) {
        if channel.is_destroyed() {
            return;
        }
        channel.mark_destroyed();

        let name = channel.name().to_string();
        let target: *const Channel = channel;
        self.members_by_channel.remove(&name);
        self.channels
            .remove_if(&name, |_, handle| std::ptr::eq(handle.data_ptr(), target));

        tracing::info!("Channel {} destroyed", name);
    }

    /// Whether a channel is currently registered
    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(&irc_lowercase(name))
    }

    /// Number of registered channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Names of all registered channels, sorted
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Member IDs of a channel from the reverse index, sorted
    pub fn member_ids(&self, name: &str) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self
            .members_by_channel
            .get(&irc_lowercase(name))
            .map(|entry| entry.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    // ----- membership -----

    /// Add `client` to `channel` and announce it
    ///
    /// Performs no access checks. The first member becomes operator. Every
    /// member, the joiner included, gets the JOIN; the joiner then gets the
    /// topic and the names list. A client that is being disconnected is not
    /// added.
    pub fn add_member(&self, channel: &mut Channel, client: &Client) {
        if channel.is_member(client.id()) {
            return;
        }
        if !client.add_channel(channel.name()) {
            tracing::debug!("{} is disconnecting, not joining {}", client.nick(), channel.name());
            return;
        }
        channel.insert_member(client.id());
        self.members_by_channel
            .entry(channel.name().to_string())
            .or_default()
            .insert(client.id());

        tracing::debug!("{} joined {}", client.nick(), channel.name());

        let join = Message::new(MessageType::Join, vec![channel.name().to_string()])
            .with_prefix(client.prefix());
        self.broadcast(channel, &join);
        self.send_topic(channel, client);
        self.send_names(channel, client);
    }

    /// Announce a PART to every member, the leaver included, then remove them
    ///
    /// Destroys the channel if it ends up empty.
    pub fn remove_member(&self, channel: &mut Channel, client: &Client, reason: Option<&str>) {
        if !channel.is_member(client.id()) {
            return;
        }

        let mut part = Message::new(MessageType::Part, vec![channel.name().to_string()])
            .with_prefix(client.prefix());
        if let Some(reason) = reason {
            part = part.with_trailing(reason);
        }
        self.broadcast(channel, &part);

        self.detach(channel, client);
        tracing::debug!("{} left {}", client.nick(), channel.name());

        if channel.is_empty() {
            self.destroy_channel(channel);
        }
    }

    /// Drop a member from the channel, the client's channel set and the index
    fn detach(&self, channel: &mut Channel, client: &Client) {
        channel.remove_member(client.id());
        client.remove_channel(channel.name());
        if let Some(mut ids) = self.members_by_channel.get_mut(channel.name()) {
            ids.remove(&client.id());
        }
    }

    // ----- delivery -----

    /// Queue `message` for every member of `channel`
    pub fn broadcast(&self, channel: &Channel, message: &Message) -> usize {
        self.fan_out(channel, message, None)
    }

    /// Queue `message` for every member of `channel` except `except`
    pub fn broadcast_except(&self, channel: &Channel, message: &Message, except: ClientId) -> usize {
        self.fan_out(channel, message, Some(except))
    }

    fn fan_out(&self, channel: &Channel, message: &Message, except: Option<ClientId>) -> usize {
        let mut queued = 0;
        for id in channel.member_ids() {
            if Some(id) == except {
                continue;
            }
            if self.send_to(id, message) {
                queued += 1;
            }
        }
        queued
    }

    fn send_to(&self, id: ClientId, message: &Message) -> bool {
        match self.clients.get(&id) {
            Some(client) => client.send(message.clone()).is_queued(),
            None => {
                tracing::debug!("No client record for member {}", id);
                false
            }
        }
    }

    /// Send the channel topic (or RPL_NOTOPIC) to `client`
    pub fn send_topic(&self, channel: &Channel, client: &Client) {
        let server = self.server_name();
        if channel.topic().is_empty() {
            client.send(NumericReply::no_topic(server, client.nick(), channel.name()));
            return;
        }

        client.send(NumericReply::topic(server, client.nick(), channel.name(), channel.topic()));
        if let (Some(setter), Some(at)) = (channel.topic_set_by(), channel.topic_set_at()) {
            client.send(NumericReply::topic_who_time(
                server,
                client.nick(),
                channel.name(),
                setter,
                at.timestamp(),
            ));
        }
    }

    /// Send the member list followed by RPL_ENDOFNAMES to `client`
    pub fn send_names(&self, channel: &Channel, client: &Client) {
        let server = self.server_name();
        let symbol = channel.name_symbol();
        let mut line = String::new();

        for id in channel.member_ids() {
            let entry = match self.clients.get(&id) {
                Some(member) => format!("{}{}", channel.member_prefix(id), member.nick()),
                None => continue,
            };
            if !line.is_empty() && line.len() + 1 + entry.len() > NAMES_LINE_BUDGET {
                client.send(NumericReply::name_reply(server, client.nick(), symbol, channel.name(), &line));
                line.clear();
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&entry);
        }

        if !line.is_empty() {
            client.send(NumericReply::name_reply(server, client.nick(), symbol, channel.name(), &line));
        }
        client.send(NumericReply::end_of_names(server, client.nick(), channel.name()));
    }
}
