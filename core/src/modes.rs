//! Channel mode change parsing and application
//!
//! A mode string such as `+ok-l alice secret` is handled in two passes. The
//! first validates every code and counts the parameters it needs, so nothing
//! is applied when the string is malformed. The second pairs codes with
//! parameters positionally and the result is applied to the channel in order.

use crate::channel::{BanMask, BanOutcome, Channel, ChannelMode};
use crate::client::ClientId;
use crate::{Message, NumericReply};

/// A single `+x`/`-x` change with its parameter, if it takes one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeChange {
    pub set: bool,
    pub mode: ChannelMode,
    pub param: Option<String>,
}

/// Reasons a mode string is rejected as a whole
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeParseError {
    /// Unrecognised mode letter
    UnknownMode(char),
    /// Fewer parameters than the mode string needs
    NeedMoreParams { required: usize, supplied: usize },
}

/// A change that could not be applied; the rest of the string still is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeFailure {
    /// `+o`/`+v` target nick is not registered
    NoSuchNick(String),
    /// `+o`/`+v` target exists but is not a member
    NotOnChannel(String),
    /// `+l` argument is not a number
    InvalidLimit(String),
    /// `+b` refused because the ban list is at capacity
    BanListFull(String),
}

impl ModeFailure {
    /// Numeric reply telling the actor about this failure
    pub fn to_reply(&self, server: &str, nick: &str, channel: &str) -> Message {
        match self {
            ModeFailure::NoSuchNick(target) => NumericReply::no_such_nick(server, nick, target),
            ModeFailure::NotOnChannel(target) => {
                NumericReply::user_not_in_channel(server, nick, target, channel)
            }
            ModeFailure::InvalidLimit(raw) => NumericReply::ErrUnknownMode
                .reply(server, nick, &[raw.as_str()])
                .with_trailing("is not a valid limit"),
            ModeFailure::BanListFull(mask) => NumericReply::ban_list_full(server, nick, channel, mask),
        }
    }
}

/// Validate `modes` and pair each code with its parameter
///
/// Every `o`, `v`, `b`, `k` and `l` must be matched by a parameter, whatever
/// its polarity. When pairing, `k` and `l` only consume one when being set.
/// Surplus parameters are ignored.
pub fn parse_mode_changes(modes: &str, params: &[&str]) -> Result<Vec<ModeChange>, ModeParseError> {
    let mut required = 0;
    for c in modes.chars().filter(|c| *c != '+' && *c != '-') {
        let mode = ChannelMode::from_char(c).ok_or(ModeParseError::UnknownMode(c))?;
        if mode.counts_param() {
            required += 1;
        }
    }

    if params.len() < required {
        return Err(ModeParseError::NeedMoreParams {
            required,
            supplied: params.len(),
        });
    }

    let mut set = true;
    let mut params = params.iter();
    let mut changes = Vec::new();
    for c in modes.chars() {
        match c {
            '+' => set = true,
            '-' => set = false,
            _ => {
                if let Some(mode) = ChannelMode::from_char(c) {
                    let param = if mode.takes_param(set) {
                        params.next().map(|p| p.to_string())
                    } else {
                        None
                    };
                    changes.push(ModeChange { set, mode, param });
                }
            }
        }
    }

    Ok(changes)
}

/// Apply parsed changes to `channel` in order
///
/// `resolve_nick` maps a nickname to a registered client. `setter` is
/// recorded on new ban entries. Per-target failures are collected and
/// returned; they do not stop later changes.
pub fn apply_mode_changes<F>(
    channel: &mut Channel,
    changes: &[ModeChange],
    setter: &str,
    max_bans: usize,
    resolve_nick: F,
) -> Vec<ModeFailure>
where
    F: Fn(&str) -> Option<ClientId>,
{
    let mut failures = Vec::new();

    for change in changes {
        let param = change.param.as_deref().unwrap_or_default();
        match change.mode {
            ChannelMode::Op | ChannelMode::Voice => match resolve_nick(param) {
                Some(id) => {
                    let applied = if change.mode == ChannelMode::Op {
                        channel.set_operator(id, change.set)
                    } else {
                        channel.set_voice(id, change.set)
                    };
                    if !applied {
                        failures.push(ModeFailure::NotOnChannel(param.to_string()));
                    }
                }
                None => failures.push(ModeFailure::NoSuchNick(param.to_string())),
            },
            ChannelMode::UserLimit => {
                channel.set_mode(ChannelMode::UserLimit, change.set);
                if change.set {
                    match param.parse::<usize>() {
                        Ok(limit) => channel.set_limit(limit),
                        Err(_) => failures.push(ModeFailure::InvalidLimit(param.to_string())),
                    }
                }
            }
            ChannelMode::Key => {
                channel.set_mode(ChannelMode::Key, change.set);
                channel.set_key(if change.set { param } else { "" });
            }
            ChannelMode::Ban => {
                let mask = BanMask::parse(param);
                if change.set {
                    if channel.add_ban(mask.clone(), setter, max_bans) == BanOutcome::ListFull {
                        failures.push(ModeFailure::BanListFull(mask.to_string()));
                    }
                } else {
                    channel.remove_ban(&mask);
                }
            }
            mode => channel.set_mode(mode, change.set),
        }
    }

    failures
}

/// Whether `MODE #chan <modes>` with `params` asks for the ban list
pub fn is_ban_list_query(modes: &str, params: &[&str]) -> bool {
    params.is_empty() && (modes == "b" || modes == "+b")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ModeSet;

    fn change(set: bool, mode: ChannelMode, param: Option<&str>) -> ModeChange {
        ModeChange {
            set,
            mode,
            param: param.map(str::to_string),
        }
    }

    #[test]
    fn test_pairs_params_positionally() {
        let changes = parse_mode_changes("+ok-v", &["alice", "secret", "bob"]).unwrap();
        assert_eq!(
            changes,
            vec![
                change(true, ChannelMode::Op, Some("alice")),
                change(true, ChannelMode::Key, Some("secret")),
                change(false, ChannelMode::Voice, Some("bob")),
            ]
        );
    }

    #[test]
    fn test_unset_key_and_limit_need_params() {
        assert_eq!(
            parse_mode_changes("-lk", &[]),
            Err(ModeParseError::NeedMoreParams {
                required: 2,
                supplied: 0
            })
        );
    }

    #[test]
    fn test_unset_key_and_limit_consume_nothing() {
        let changes = parse_mode_changes("-lk+b", &["*!*@spam", "x", "y"]).unwrap();
        assert_eq!(
            changes,
            vec![
                change(false, ChannelMode::UserLimit, None),
                change(false, ChannelMode::Key, None),
                change(true, ChannelMode::Ban, Some("*!*@spam")),
            ]
        );
    }

    #[test]
    fn test_unknown_mode_aborts() {
        assert_eq!(
            parse_mode_changes("+nz", &[]),
            Err(ModeParseError::UnknownMode('z'))
        );
    }

    #[test]
    fn test_voice_counts_as_param() {
        assert_eq!(
            parse_mode_changes("+ov", &["alice"]),
            Err(ModeParseError::NeedMoreParams {
                required: 2,
                supplied: 1
            })
        );
    }

    #[test]
    fn test_apply_flags_and_limit() {
        let mut channel = Channel::new("#x", ModeSet::new());
        let changes = parse_mode_changes("+ntl", &["5"]).unwrap();
        let failures = apply_mode_changes(&mut channel, &changes, "op", 0, |_| None);
        assert!(failures.is_empty());
        assert!(channel.has_mode(ChannelMode::NoExternal));
        assert!(channel.has_mode(ChannelMode::UserLimit));
        assert_eq!(channel.limit(), 5);
    }

    #[test]
    fn test_invalid_limit_keeps_flag() {
        let mut channel = Channel::new("#x", ModeSet::new());
        channel.set_limit(3);
        let changes = parse_mode_changes("+l", &["many"]).unwrap();
        let failures = apply_mode_changes(&mut channel, &changes, "op", 0, |_| None);
        assert_eq!(failures, vec![ModeFailure::InvalidLimit("many".to_string())]);
        assert!(channel.has_mode(ChannelMode::UserLimit));
        assert_eq!(channel.limit(), 3);
    }

    #[test]
    fn test_op_targets() {
        let mut channel = Channel::new("#x", ModeSet::new());
        channel.insert_member(ClientId(1));
        channel.insert_member(ClientId(2));

        let resolve = |nick: &str| match nick {
            "bob" => Some(ClientId(2)),
            "carol" => Some(ClientId(3)),
            _ => None,
        };
        let changes = parse_mode_changes("+ooo", &["bob", "carol", "dave"]).unwrap();
        let failures = apply_mode_changes(&mut channel, &changes, "alice", 0, resolve);

        assert!(channel.is_operator(ClientId(2)));
        assert!(!channel.is_operator(ClientId(3)));
        assert_eq!(
            failures,
            vec![
                ModeFailure::NotOnChannel("carol".to_string()),
                ModeFailure::NoSuchNick("dave".to_string()),
            ]
        );
    }

    #[test]
    fn test_key_set_and_clear() {
        let mut channel = Channel::new("#x", ModeSet::new());
        let set = parse_mode_changes("+k", &["hunter2"]).unwrap();
        apply_mode_changes(&mut channel, &set, "op", 0, |_| None);
        assert_eq!(channel.key(), "hunter2");

        let clear = parse_mode_changes("-k", &["hunter2"]).unwrap();
        apply_mode_changes(&mut channel, &clear, "op", 0, |_| None);
        assert!(!channel.has_mode(ChannelMode::Key));
        assert_eq!(channel.key(), "");
    }

    #[test]
    fn test_ban_list_capacity() {
        let mut channel = Channel::new("#x", ModeSet::new());
        let changes = parse_mode_changes("+bb", &["a!*@*", "b!*@*"]).unwrap();
        let failures = apply_mode_changes(&mut channel, &changes, "op", 1, |_| None);
        assert_eq!(channel.bans().len(), 1);
        assert_eq!(failures, vec![ModeFailure::BanListFull("b!*@*".to_string())]);

        let remove = parse_mode_changes("-b", &["A!*@*"]).unwrap();
        apply_mode_changes(&mut channel, &remove, "op", 1, |_| None);
        assert!(channel.bans().is_empty());
    }

    #[test]
    fn test_ban_list_query() {
        assert!(is_ban_list_query("b", &[]));
        assert!(is_ban_list_query("+b", &[]));
        assert!(!is_ban_list_query("+b", &["x"]));
        assert!(!is_ban_list_query("-b", &[]));
    }
}
