//! IRC numeric replies used by the channel core (RFC 1459 / RFC 2812)

use crate::{Message, MessageType, Prefix};

/// IRC numeric reply codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum NumericReply {
    // Channel state replies
    RplChannelModeIs = 324,
    RplCreationTime = 329,
    RplNoTopic = 331,
    RplTopic = 332,
    RplTopicWhoTime = 333,
    RplNameReply = 353,
    RplEndOfNames = 366,
    RplBanList = 367,
    RplEndOfBanList = 368,

    // Error replies
    ErrNoSuchNick = 401,
    ErrNoSuchChannel = 403,
    ErrCannotSendToChan = 404,
    ErrTooManyChannels = 405,
    ErrNoRecipient = 411,
    ErrNoTextToSend = 412,
    ErrUserNotInChannel = 441,
    ErrNotOnChannel = 442,
    ErrNeedMoreParams = 461,
    ErrChannelIsFull = 471,
    ErrUnknownMode = 472,
    ErrInviteOnlyChan = 473,
    ErrBannedFromChan = 474,
    ErrBadChannelKey = 475,
    ErrBanListFull = 478,
    ErrChanOPrivsNeeded = 482,
}

impl NumericReply {
    /// Get the numeric code
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Whether this is an error (4xx/5xx) reply
    pub fn is_error(&self) -> bool {
        self.code() >= 400
    }

    /// Create a numeric reply message from `server` addressed to `target`
    pub fn reply(&self, server: &str, target: &str, params: &[&str]) -> Message {
        let mut all_params = Vec::with_capacity(params.len() + 1);
        all_params.push(target.to_string());
        all_params.extend(params.iter().map(|p| p.to_string()));

        Message {
            prefix: Some(Prefix::Server(server.to_string())),
            command: MessageType::Numeric(self.code()),
            params: all_params,
            trailing: None,
        }
    }
}

/// Common numeric replies
impl NumericReply {
    /// RPL_CHANNELMODEIS
    pub fn channel_mode_is(server: &str, nick: &str, channel: &str, modes: &[String]) -> Message {
        let mut params = vec![channel];
        params.extend(modes.iter().map(String::as_str));
        Self::RplChannelModeIs.reply(server, nick, &params)
    }

    /// RPL_CREATIONTIME
    pub fn creation_time(server: &str, nick: &str, channel: &str, timestamp: i64) -> Message {
        Self::RplCreationTime.reply(server, nick, &[channel, &timestamp.to_string()])
    }

    /// RPL_NOTOPIC
    pub fn no_topic(server: &str, nick: &str, channel: &str) -> Message {
        Self::RplNoTopic
            .reply(server, nick, &[channel])
            .with_trailing("No topic is set")
    }

    /// RPL_TOPIC
    pub fn topic(server: &str, nick: &str, channel: &str, topic: &str) -> Message {
        Self::RplTopic
            .reply(server, nick, &[channel])
            .with_trailing(topic)
    }

    /// RPL_TOPICWHOTIME
    pub fn topic_who_time(server: &str, nick: &str, channel: &str, setter: &str, timestamp: i64) -> Message {
        Self::RplTopicWhoTime.reply(server, nick, &[channel, setter, &timestamp.to_string()])
    }

    /// RPL_NAMREPLY
    pub fn name_reply(server: &str, nick: &str, symbol: char, channel: &str, names: &str) -> Message {
        Self::RplNameReply
            .reply(server, nick, &[&symbol.to_string(), channel])
            .with_trailing(names)
    }

    /// RPL_ENDOFNAMES
    pub fn end_of_names(server: &str, nick: &str, channel: &str) -> Message {
        Self::RplEndOfNames
            .reply(server, nick, &[channel])
            .with_trailing("End of /NAMES list")
    }

    /// RPL_BANLIST
    pub fn ban_list(server: &str, nick: &str, channel: &str, mask: &str, setter: &str, timestamp: i64) -> Message {
        Self::RplBanList.reply(server, nick, &[channel, mask, setter, &timestamp.to_string()])
    }

    /// RPL_ENDOFBANLIST
    pub fn end_of_ban_list(server: &str, nick: &str, channel: &str) -> Message {
        Self::RplEndOfBanList
            .reply(server, nick, &[channel])
            .with_trailing("End of channel ban list")
    }

    /// ERR_NOSUCHNICK
    pub fn no_such_nick(server: &str, nick: &str, target: &str) -> Message {
        Self::ErrNoSuchNick
            .reply(server, nick, &[target])
            .with_trailing("No such nick/channel")
    }

    /// ERR_NOSUCHCHANNEL
    pub fn no_such_channel(server: &str, nick: &str, channel: &str) -> Message {
        Self::ErrNoSuchChannel
            .reply(server, nick, &[channel])
            .with_trailing("No such channel")
    }

    /// ERR_CANNOTSENDTOCHAN
    pub fn cannot_send_to_chan(server: &str, nick: &str, channel: &str) -> Message {
        Self::ErrCannotSendToChan
            .reply(server, nick, &[channel])
            .with_trailing("Cannot send to channel")
    }

    /// ERR_TOOMANYCHANNELS
    pub fn too_many_channels(server: &str, nick: &str, channel: &str) -> Message {
        Self::ErrTooManyChannels
            .reply(server, nick, &[channel])
            .with_trailing("You have joined too many channels")
    }

    /// ERR_NORECIPIENT
    pub fn no_recipient(server: &str, nick: &str, command: &str) -> Message {
        Self::ErrNoRecipient
            .reply(server, nick, &[])
            .with_trailing(format!("No recipient given ({})", command))
    }

    /// ERR_NOTEXTTOSEND
    pub fn no_text_to_send(server: &str, nick: &str) -> Message {
        Self::ErrNoTextToSend
            .reply(server, nick, &[])
            .with_trailing("No text to send")
    }

    /// ERR_USERNOTINCHANNEL
    pub fn user_not_in_channel(server: &str, nick: &str, target: &str, channel: &str) -> Message {
        Self::ErrUserNotInChannel
            .reply(server, nick, &[target, channel])
            .with_trailing("They aren't on that channel")
    }

    /// ERR_NOTONCHANNEL
    pub fn not_on_channel(server: &str, nick: &str, channel: &str) -> Message {
        Self::ErrNotOnChannel
            .reply(server, nick, &[channel])
            .with_trailing("You're not on that channel")
    }

    /// ERR_NEEDMOREPARAMS
    pub fn need_more_params(server: &str, nick: &str, command: &str) -> Message {
        Self::ErrNeedMoreParams
            .reply(server, nick, &[command])
            .with_trailing("Not enough parameters")
    }

    /// ERR_CHANNELISFULL
    pub fn channel_is_full(server: &str, nick: &str, channel: &str) -> Message {
        Self::ErrChannelIsFull
            .reply(server, nick, &[channel])
            .with_trailing("Cannot join channel (+l)")
    }

    /// ERR_UNKNOWNMODE
    pub fn unknown_mode(server: &str, nick: &str, mode: &str) -> Message {
        Self::ErrUnknownMode
            .reply(server, nick, &[mode])
            .with_trailing("is unknown mode char to me")
    }

    /// ERR_INVITEONLYCHAN
    pub fn invite_only_chan(server: &str, nick: &str, channel: &str) -> Message {
        Self::ErrInviteOnlyChan
            .reply(server, nick, &[channel])
            .with_trailing("Cannot join channel (+i)")
    }

    /// ERR_BANNEDFROMCHAN
    pub fn banned_from_chan(server: &str, nick: &str, channel: &str) -> Message {
        Self::ErrBannedFromChan
            .reply(server, nick, &[channel])
            .with_trailing("Cannot join channel (+b)")
    }

    /// ERR_BADCHANNELKEY
    pub fn bad_channel_key(server: &str, nick: &str, channel: &str) -> Message {
        Self::ErrBadChannelKey
            .reply(server, nick, &[channel])
            .with_trailing("Cannot join channel (+k)")
    }

    /// ERR_BANLISTFULL
    pub fn ban_list_full(server: &str, nick: &str, channel: &str, mask: &str) -> Message {
        Self::ErrBanListFull
            .reply(server, nick, &[channel, mask])
            .with_trailing("Channel ban list is full")
    }

    /// ERR_CHANOPRIVSNEEDED
    pub fn chan_op_privs_needed(server: &str, nick: &str, channel: &str) -> Message {
        Self::ErrChanOPrivsNeeded
            .reply(server, nick, &[channel])
            .with_trailing("You're not channel operator")
    }
}
