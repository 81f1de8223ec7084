//! Channel state: modes, topic, bans and membership

use crate::client::{Client, ClientId};
use crate::utils::wildcard;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;

/// Channel modes recognised by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    /// Channel operator privilege (member mode)
    Op,
    /// Private channel
    Private,
    /// Secret channel
    Secret,
    /// Invite only
    InviteOnly,
    /// Topic settable by channel operator only
    TopicLock,
    /// No messages to channel from clients on the outside
    NoExternal,
    /// Moderated channel
    Moderated,
    /// User limit
    UserLimit,
    /// Ban mask
    Ban,
    /// Voice privilege (member mode)
    Voice,
    /// Channel is keyed (password protected)
    Key,
}

impl ChannelMode {
    /// Every mode, in canonical display order
    pub const ALL: [ChannelMode; 11] = [
        ChannelMode::Op,
        ChannelMode::Private,
        ChannelMode::Secret,
        ChannelMode::InviteOnly,
        ChannelMode::TopicLock,
        ChannelMode::NoExternal,
        ChannelMode::Moderated,
        ChannelMode::UserLimit,
        ChannelMode::Ban,
        ChannelMode::Voice,
        ChannelMode::Key,
    ];

    /// Look up a mode by its letter
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'o' => ChannelMode::Op,
            'p' => ChannelMode::Private,
            's' => ChannelMode::Secret,
            'i' => ChannelMode::InviteOnly,
            't' => ChannelMode::TopicLock,
            'n' => ChannelMode::NoExternal,
            'm' => ChannelMode::Moderated,
            'l' => ChannelMode::UserLimit,
            'b' => ChannelMode::Ban,
            'v' => ChannelMode::Voice,
            'k' => ChannelMode::Key,
            _ => return None,
        })
    }

    /// The mode letter
    pub fn as_char(self) -> char {
        match self {
            ChannelMode::Op => 'o',
            ChannelMode::Private => 'p',
            ChannelMode::Secret => 's',
            ChannelMode::InviteOnly => 'i',
            ChannelMode::TopicLock => 't',
            ChannelMode::NoExternal => 'n',
            ChannelMode::Moderated => 'm',
            ChannelMode::UserLimit => 'l',
            ChannelMode::Ban => 'b',
            ChannelMode::Voice => 'v',
            ChannelMode::Key => 'k',
        }
    }

    /// Whether a change of this mode consumes a positional parameter
    ///
    /// Key and limit only take one when being set.
    pub fn takes_param(self, set: bool) -> bool {
        match self {
            ChannelMode::Op | ChannelMode::Voice | ChannelMode::Ban => true,
            ChannelMode::Key | ChannelMode::UserLimit => set,
            _ => false,
        }
    }

    /// Whether this mode must be matched by a parameter before a MODE
    /// command is accepted, whatever its polarity
    pub fn counts_param(self) -> bool {
        matches!(
            self,
            ChannelMode::Op
                | ChannelMode::Voice
                | ChannelMode::Ban
                | ChannelMode::Key
                | ChannelMode::UserLimit
        )
    }

    /// Whether this mode is stored as a channel flag
    ///
    /// Op and voice live on memberships, bans in the ban list.
    pub fn is_flag(self) -> bool {
        !matches!(self, ChannelMode::Op | ChannelMode::Voice | ChannelMode::Ban)
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Set of enabled channel mode flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeSet(u16);

impl ModeSet {
    /// Empty set
    pub fn new() -> Self {
        Self(0)
    }

    /// Build a set from a mode string, returning the letters that are not
    /// channel flags
    pub fn parse(modes: &str) -> (Self, Vec<char>) {
        let mut set = Self::new();
        let mut unknown = Vec::new();
        for c in modes.chars() {
            match ChannelMode::from_char(c) {
                Some(mode) if mode.is_flag() => set.insert(mode),
                None if c == '+' => {}
                _ => unknown.push(c),
            }
        }
        (set, unknown)
    }

    pub fn contains(&self, mode: ChannelMode) -> bool {
        self.0 & mode.bit() != 0
    }

    pub fn insert(&mut self, mode: ChannelMode) {
        self.0 |= mode.bit();
    }

    pub fn remove(&mut self, mode: ChannelMode) {
        self.0 &= !mode.bit();
    }

    /// Set or clear a mode
    pub fn set(&mut self, mode: ChannelMode, enabled: bool) {
        if enabled {
            self.insert(mode);
        } else {
            self.remove(mode);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Enabled modes in canonical order
    pub fn iter(&self) -> impl Iterator<Item = ChannelMode> + '_ {
        ChannelMode::ALL.into_iter().filter(|m| self.contains(*m))
    }
}

impl FromIterator<ChannelMode> for ModeSet {
    fn from_iter<I: IntoIterator<Item = ChannelMode>>(iter: I) -> Self {
        let mut set = Self::new();
        for mode in iter {
            set.insert(mode);
        }
        set
    }
}

impl fmt::Display for ModeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+")?;
        for mode in self.iter() {
            write!(f, "{}", mode.as_char())?;
        }
        Ok(())
    }
}

/// A `nick!user@host` ban pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanMask {
    pub nick: String,
    pub user: String,
    pub host: String,
}

impl BanMask {
    /// Parse a mask, filling missing parts with `*`
    ///
    /// `alice` becomes `alice!*@*`, `*@host` becomes `*!*@host`.
    pub fn parse(raw: &str) -> Self {
        fn part(s: &str) -> String {
            if s.is_empty() { "*".to_string() } else { s.to_string() }
        }

        let (nick, rest) = match raw.split_once('!') {
            Some((nick, rest)) => (nick, Some(rest)),
            None if raw.contains('@') => ("*", Some(raw)),
            None => (raw, None),
        };

        let (user, host) = match rest {
            Some(rest) => match rest.split_once('@') {
                Some((user, host)) => (user, host),
                None => (rest, "*"),
            },
            None => ("*", "*"),
        };

        Self {
            nick: part(nick),
            user: part(user),
            host: part(host),
        }
    }

    /// Check a client identity against this mask
    pub fn matches(&self, nick: &str, user: &str, host: &str) -> bool {
        wildcard::matches(&self.nick, nick)
            && wildcard::matches(&self.user, user)
            && wildcard::matches(&self.host, host)
    }

    /// Same mask, ignoring case
    pub fn same_as(&self, other: &BanMask) -> bool {
        crate::utils::string::irc_eq(&self.to_string(), &other.to_string())
    }
}

impl fmt::Display for BanMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}@{}", self.nick, self.user, self.host)
    }
}

/// A ban list entry
#[derive(Debug, Clone)]
pub struct BanEntry {
    pub mask: BanMask,
    pub set_by: String,
    pub set_at: DateTime<Utc>,
}

/// Result of adding a ban
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanOutcome {
    Added,
    AlreadyPresent,
    ListFull,
}

/// Channel information and state
#[derive(Debug, Clone)]
pub struct Channel {
    name: String,
    modes: ModeSet,
    topic: String,
    topic_set_by: Option<String>,
    topic_set_at: Option<DateTime<Utc>>,
    limit: usize,
    key: String,
    bans: Vec<BanEntry>,
    members: HashSet<ClientId>,
    operators: HashSet<ClientId>,
    voiced: HashSet<ClientId>,
    created_at: DateTime<Utc>,
    destroyed: bool,
}

impl Channel {
    /// Create a new, empty channel; `name` must already be case folded
    pub fn new(name: impl Into<String>, modes: ModeSet) -> Self {
        Self {
            name: name.into(),
            modes,
            topic: String::new(),
            topic_set_by: None,
            topic_set_at: None,
            limit: 0,
            key: String::new(),
            bans: Vec::new(),
            members: HashSet::new(),
            operators: HashSet::new(),
            voiced: HashSet::new(),
            created_at: Utc::now(),
            destroyed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modes(&self) -> ModeSet {
        self.modes
    }

    pub fn has_mode(&self, mode: ChannelMode) -> bool {
        self.modes.contains(mode)
    }

    pub fn set_mode(&mut self, mode: ChannelMode, enabled: bool) {
        self.modes.set(mode, enabled);
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn topic_set_by(&self) -> Option<&str> {
        self.topic_set_by.as_deref()
    }

    pub fn topic_set_at(&self) -> Option<DateTime<Utc>> {
        self.topic_set_at
    }

    /// Set topic; an empty topic clears it
    pub fn set_topic(&mut self, topic: impl Into<String>, setter: &str) {
        self.topic = topic.into();
        if self.topic.is_empty() {
            self.topic_set_by = None;
            self.topic_set_at = None;
        } else {
            self.topic_set_by = Some(setter.to_string());
            self.topic_set_at = Some(Utc::now());
        }
    }

    /// User limit, meaningful only while `+l` is set
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// Channel key, meaningful only while `+k` is set
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_member(&self, id: ClientId) -> bool {
        self.members.contains(&id)
    }

    pub fn is_operator(&self, id: ClientId) -> bool {
        self.operators.contains(&id)
    }

    pub fn is_voiced(&self, id: ClientId) -> bool {
        self.voiced.contains(&id)
    }

    /// Member IDs in ascending order
    pub fn member_ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self.members.iter().copied().collect();
        ids.sort();
        ids
    }

    /// Grant or revoke operator status; returns false if `id` is not a member
    pub fn set_operator(&mut self, id: ClientId, enabled: bool) -> bool {
        set_privilege(&self.members, &mut self.operators, id, enabled)
    }

    /// Grant or revoke voice; returns false if `id` is not a member
    pub fn set_voice(&mut self, id: ClientId, enabled: bool) -> bool {
        set_privilege(&self.members, &mut self.voiced, id, enabled)
    }

    /// Insert a member; the first member of a channel becomes operator.
    /// Returns false if already present.
    pub(crate) fn insert_member(&mut self, id: ClientId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        if self.members.len() == 1 {
            self.operators.insert(id);
        }
        true
    }

    /// Remove a member and any privileges it held
    pub(crate) fn remove_member(&mut self, id: ClientId) -> bool {
        self.operators.remove(&id);
        self.voiced.remove(&id);
        self.members.remove(&id)
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    /// Whether `client` may send PRIVMSG/NOTICE to this channel
    pub fn can_priv_msg(&self, client: &Client) -> bool {
        let id = client.id();
        if self.has_mode(ChannelMode::NoExternal) && !self.is_member(id) {
            return false;
        }
        if self.has_mode(ChannelMode::Moderated) && !self.is_voiced(id) && !self.is_operator(id) {
            return false;
        }
        true
    }

    /// Check if `client` matches any ban mask
    pub fn is_banned(&self, client: &Client) -> bool {
        self.bans
            .iter()
            .any(|ban| ban.mask.matches(client.nick(), client.username(), client.host()))
    }

    pub fn bans(&self) -> &[BanEntry] {
        &self.bans
    }

    /// Add a ban mask, refusing duplicates and growth past `max_bans`
    pub fn add_ban(&mut self, mask: BanMask, set_by: &str, max_bans: usize) -> BanOutcome {
        if self.bans.iter().any(|ban| ban.mask.same_as(&mask)) {
            return BanOutcome::AlreadyPresent;
        }
        if max_bans > 0 && self.bans.len() >= max_bans {
            return BanOutcome::ListFull;
        }
        self.bans.push(BanEntry {
            mask,
            set_by: set_by.to_string(),
            set_at: Utc::now(),
        });
        BanOutcome::Added
    }

    /// Remove a ban mask; returns false if it was not present
    pub fn remove_ban(&mut self, mask: &BanMask) -> bool {
        let before = self.bans.len();
        self.bans.retain(|ban| !ban.mask.same_as(mask));
        self.bans.len() != before
    }

    /// Mode string plus arguments, as sent in RPL_CHANNELMODEIS
    ///
    /// Key and limit values are only revealed when `with_arguments` is set.
    pub fn mode_arguments(&self, with_arguments: bool) -> Vec<String> {
        let mut out = vec![self.modes.to_string()];
        if with_arguments {
            for mode in self.modes.iter() {
                match mode {
                    ChannelMode::Key => out.push(self.key.clone()),
                    ChannelMode::UserLimit => out.push(self.limit.to_string()),
                    _ => {}
                }
            }
        }
        out
    }

    /// NAMES visibility symbol: `@` secret, `*` private, `=` public
    pub fn name_symbol(&self) -> char {
        if self.has_mode(ChannelMode::Secret) {
            '@'
        } else if self.has_mode(ChannelMode::Private) {
            '*'
        } else {
            '='
        }
    }

    /// Whether a client may see this channel in NAMES listings
    pub fn is_visible_to(&self, id: ClientId) -> bool {
        let hidden = self.has_mode(ChannelMode::Secret) || self.has_mode(ChannelMode::Private);
        !hidden || self.is_member(id)
    }

    /// Status prefix for a member in NAMES replies
    pub fn member_prefix(&self, id: ClientId) -> &'static str {
        if self.is_operator(id) {
            "@"
        } else if self.is_voiced(id) {
            "+"
        } else {
            ""
        }
    }
}

fn set_privilege(
    members: &HashSet<ClientId>,
    set: &mut HashSet<ClientId>,
    id: ClientId,
    enabled: bool,
) -> bool {
    if !members.contains(&id) {
        return false;
    }
    if enabled {
        set.insert(id);
    } else {
        set.remove(&id);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::{Mailbox, OverflowPolicy};

    fn client(id: u64, nick: &str) -> Client {
        let (mailbox, _rx) = Mailbox::new(8, OverflowPolicy::DropNewest);
        Client::new(ClientId(id), nick, "user", "host.example.com", mailbox)
    }

    #[test]
    fn test_mode_set_parse_and_display() {
        let (set, unknown) = ModeSet::parse("+ntzq");
        assert!(set.contains(ChannelMode::NoExternal));
        assert!(set.contains(ChannelMode::TopicLock));
        assert_eq!(unknown, vec!['z', 'q']);
        assert_eq!(set.to_string(), "+tn");
        assert_eq!(ModeSet::new().to_string(), "+");
    }

    #[test]
    fn test_mode_set_rejects_member_and_list_modes() {
        let (set, unknown) = ModeSet::parse("+novb");
        assert_eq!(set.to_string(), "+n");
        assert_eq!(unknown, vec!['o', 'v', 'b']);
    }

    #[test]
    fn test_takes_param() {
        assert!(ChannelMode::Op.takes_param(false));
        assert!(ChannelMode::Ban.takes_param(true));
        assert!(ChannelMode::Key.takes_param(true));
        assert!(!ChannelMode::Key.takes_param(false));
        assert!(!ChannelMode::UserLimit.takes_param(false));
        assert!(!ChannelMode::Moderated.takes_param(true));
    }

    #[test]
    fn test_counts_param_ignores_polarity() {
        for c in ['o', 'v', 'b', 'k', 'l'] {
            assert!(ChannelMode::from_char(c).unwrap().counts_param(), "{}", c);
        }
        for c in ['p', 's', 'i', 't', 'n', 'm'] {
            assert!(!ChannelMode::from_char(c).unwrap().counts_param(), "{}", c);
        }
    }

    #[test]
    fn test_first_member_is_operator() {
        let mut channel = Channel::new("#rust", ModeSet::new());
        assert!(channel.insert_member(ClientId(1)));
        assert!(channel.insert_member(ClientId(2)));
        assert!(!channel.insert_member(ClientId(2)));
        assert!(channel.is_operator(ClientId(1)));
        assert!(!channel.is_operator(ClientId(2)));
    }

    #[test]
    fn test_privileges_require_membership() {
        let mut channel = Channel::new("#rust", ModeSet::new());
        channel.insert_member(ClientId(1));
        assert!(!channel.set_operator(ClientId(9), true));
        assert!(!channel.is_operator(ClientId(9)));
        assert!(channel.set_voice(ClientId(1), true));
        channel.remove_member(ClientId(1));
        assert!(!channel.is_voiced(ClientId(1)));
        assert!(!channel.is_operator(ClientId(1)));
    }

    #[test]
    fn test_can_priv_msg() {
        let alice = client(1, "alice");
        let bob = client(2, "bob");
        let mut channel = Channel::new("#rust", ModeSet::parse("n").0);
        channel.insert_member(alice.id());

        assert!(channel.can_priv_msg(&alice));
        assert!(!channel.can_priv_msg(&bob));

        channel.insert_member(bob.id());
        channel.set_mode(ChannelMode::Moderated, true);
        assert!(channel.can_priv_msg(&alice)); // operator
        assert!(!channel.can_priv_msg(&bob));
        channel.set_voice(bob.id(), true);
        assert!(channel.can_priv_msg(&bob));
    }

    #[test]
    fn test_ban_mask_parse() {
        assert_eq!(BanMask::parse("alice").to_string(), "alice!*@*");
        assert_eq!(BanMask::parse("*@evil.net").to_string(), "*!*@evil.net");
        assert_eq!(BanMask::parse("bob!b").to_string(), "bob!b@*");
        assert_eq!(BanMask::parse("a!b@c").to_string(), "a!b@c");
        assert_eq!(BanMask::parse("").to_string(), "*!*@*");
    }

    #[test]
    fn test_bans() {
        let alice = client(1, "alice");
        let mut channel = Channel::new("#rust", ModeSet::new());
        assert!(!channel.is_banned(&alice));

        assert_eq!(channel.add_ban(BanMask::parse("*!*@*.example.com"), "op", 2), BanOutcome::Added);
        assert!(channel.is_banned(&alice));
        assert_eq!(channel.add_ban(BanMask::parse("*!*@*.EXAMPLE.com"), "op", 2), BanOutcome::AlreadyPresent);
        assert_eq!(channel.add_ban(BanMask::parse("x"), "op", 2), BanOutcome::Added);
        assert_eq!(channel.add_ban(BanMask::parse("y"), "op", 2), BanOutcome::ListFull);

        assert!(channel.remove_ban(&BanMask::parse("*!*@*.example.com")));
        assert!(!channel.is_banned(&alice));
        assert!(!channel.remove_ban(&BanMask::parse("nobody")));
    }

    #[test]
    fn test_mode_arguments() {
        let mut channel = Channel::new("#rust", ModeSet::parse("nt").0);
        channel.set_mode(ChannelMode::Key, true);
        channel.set_key("hunter2");
        channel.set_mode(ChannelMode::UserLimit, true);
        channel.set_limit(10);
        assert_eq!(channel.mode_arguments(true), vec!["+tnlk", "10", "hunter2"]);
        assert_eq!(channel.mode_arguments(false), vec!["+tnlk"]);
    }

    #[test]
    fn test_visibility() {
        let mut channel = Channel::new("#hidden", ModeSet::parse("s").0);
        channel.insert_member(ClientId(1));
        assert!(channel.is_visible_to(ClientId(1)));
        assert!(!channel.is_visible_to(ClientId(2)));
        assert_eq!(channel.name_symbol(), '@');
        assert_eq!(channel.member_prefix(ClientId(1)), "@");
    }
}
