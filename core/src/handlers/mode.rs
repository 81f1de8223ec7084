//! MODE command (channel targets)

use super::{CommandHandler, HandlerResult};
use crate::channel::Channel;
use crate::client::Client;
use crate::modes::{apply_mode_changes, is_ban_list_query, parse_mode_changes, ModeParseError};
use crate::registry::Registry;
use crate::utils::string::is_channel_target;
use crate::{Message, MessageType, NumericReply};
use std::sync::Arc;

/// Handles `MODE <channel> [<modes> [<params>...]]`
///
/// User-mode requests are left to other handlers.
pub struct ModeHandler {
    registry: Arc<Registry>,
}

impl ModeHandler {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// RPL_CHANNELMODEIS and RPL_CREATIONTIME; key and limit only shown to members
    fn send_modes(&self, channel: &Channel, client: &Client) {
        let server = self.registry.server_name();
        let arguments = channel.mode_arguments(channel.is_member(client.id()));
        client.send(NumericReply::channel_mode_is(server, client.nick(), channel.name(), &arguments));
        client.send(NumericReply::creation_time(
            server,
            client.nick(),
            channel.name(),
            channel.created_at().timestamp(),
        ));
    }

    fn send_ban_list(&self, channel: &Channel, client: &Client) {
        let server = self.registry.server_name();
        for ban in channel.bans() {
            client.send(NumericReply::ban_list(
                server,
                client.nick(),
                channel.name(),
                &ban.mask.to_string(),
                &ban.set_by,
                ban.set_at.timestamp(),
            ));
        }
        client.send(NumericReply::end_of_ban_list(server, client.nick(), channel.name()));
    }

    /// Validate and apply a mode string, then announce it to the channel
    fn change_modes(&self, channel: &mut Channel, client: &Client, message: &Message, modes: &str, params: &[&str]) {
        let registry = &self.registry;
        let server = registry.server_name();
        let nick = client.nick();

        if !channel.is_operator(client.id()) {
            client.send(NumericReply::chan_op_privs_needed(server, nick, channel.name()));
            return;
        }

        let changes = match parse_mode_changes(modes, params) {
            Ok(changes) => changes,
            Err(ModeParseError::UnknownMode(c)) => {
                client.send(NumericReply::unknown_mode(server, nick, &c.to_string()));
                return;
            }
            Err(ModeParseError::NeedMoreParams { .. }) => {
                client.send(NumericReply::need_more_params(server, nick, "MODE"));
                return;
            }
        };

        let max_bans = registry.config().channels.max_bans;
        let failures = apply_mode_changes(channel, &changes, &client.mask(), max_bans, |target| {
            registry.resolve_client_by_nick(target).map(|c| c.id())
        });
        for failure in &failures {
            client.send(failure.to_reply(server, nick, channel.name()));
        }

        tracing::debug!("{} set {} {} on {}", nick, modes, params.join(" "), channel.name());
        registry.broadcast(channel, &message.with_prefix(client.prefix()));
    }
}

impl CommandHandler for ModeHandler {
    fn name(&self) -> &str {
        "mode"
    }

    fn handles(&self, command: &MessageType) -> bool {
        matches!(command, MessageType::Mode)
    }

    fn handle(&self, client: &Client, message: &Message) -> HandlerResult {
        let server = self.registry.server_name();
        let args = message.arguments();

        let target = match args.first() {
            Some(target) => *target,
            None => {
                client.send(NumericReply::need_more_params(server, client.nick(), "MODE"));
                return HandlerResult::Handled;
            }
        };
        if !is_channel_target(target) {
            return HandlerResult::NotHandled;
        }

        let found = self.registry.with_channel(target, |channel| match args.get(1) {
            None => self.send_modes(channel, client),
            Some(modes) if is_ban_list_query(modes, &args[2..]) => self.send_ban_list(channel, client),
            Some(modes) => self.change_modes(channel, client, message, modes, &args[2..]),
        });
        if found.is_none() {
            client.send(NumericReply::no_such_channel(server, client.nick(), target));
        }

        HandlerResult::Handled
    }
}
