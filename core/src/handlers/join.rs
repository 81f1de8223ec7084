//! JOIN command

use super::{CommandHandler, HandlerResult};
use crate::channel::{Channel, ChannelMode};
use crate::client::Client;
use crate::registry::Registry;
use crate::{Message, MessageType, NumericReply};
use std::sync::Arc;

/// Handles `JOIN <channel>{,<channel>} [<key>{,<key>}]` and `JOIN 0`
pub struct JoinHandler {
    registry: Arc<Registry>,
}

impl JoinHandler {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Leave every channel, as for `JOIN 0`
    fn part_all(&self, client: &Client) {
        for name in client.channels() {
            self.registry.with_channel(&name, |channel| {
                self.registry.remove_member(channel, client, None);
            });
        }
    }

    fn join_one(&self, client: &Client, name: &str, key: Option<&str>) {
        let registry = &self.registry;
        let server = registry.server_name();

        let result = registry.with_channel_or_create(name, |channel| {
            if channel.is_member(client.id()) {
                return;
            }
            match self.check_access(channel, client, key) {
                Some(error) => {
                    client.send(error);
                }
                None => registry.add_member(channel, client),
            }
        });

        if let Err(e) = result {
            tracing::debug!("JOIN {} from {} refused: {}", name, client.nick(), e);
            client.send(NumericReply::no_such_channel(server, client.nick(), name));
        }
    }

    /// First access rule `client` fails, as the reply to send
    fn check_access(&self, channel: &Channel, client: &Client, key: Option<&str>) -> Option<Message> {
        let server = self.registry.server_name();
        let nick = client.nick();
        let max_channels = self.registry.config().channels.max_channels_per_client;

        if max_channels > 0 && client.channel_count() >= max_channels {
            return Some(NumericReply::too_many_channels(server, nick, channel.name()));
        }
        if channel.has_mode(ChannelMode::InviteOnly) {
            return Some(NumericReply::invite_only_chan(server, nick, channel.name()));
        }
        if channel.has_mode(ChannelMode::Key) && key != Some(channel.key()) {
            return Some(NumericReply::bad_channel_key(server, nick, channel.name()));
        }
        if channel.has_mode(ChannelMode::UserLimit) && channel.member_count() >= channel.limit() {
            return Some(NumericReply::channel_is_full(server, nick, channel.name()));
        }
        if channel.is_banned(client) {
            return Some(NumericReply::banned_from_chan(server, nick, channel.name()));
        }
        None
    }
}

impl CommandHandler for JoinHandler {
    fn name(&self) -> &str {
        "join"
    }

    fn handles(&self, command: &MessageType) -> bool {
        matches!(command, MessageType::Join)
    }

    fn handle(&self, client: &Client, message: &Message) -> HandlerResult {
        let args = message.arguments();
        let targets = match args.first() {
            Some(targets) if !targets.is_empty() => *targets,
            _ => {
                client.send(NumericReply::need_more_params(
                    self.registry.server_name(),
                    client.nick(),
                    "JOIN",
                ));
                return HandlerResult::Handled;
            }
        };

        if targets == "0" {
            self.part_all(client);
            return HandlerResult::Handled;
        }

        // Keys pair with channels by position
        let keys: Vec<&str> = args.get(1).map(|k| k.split(',').collect()).unwrap_or_default();
        for (index, name) in targets.split(',').enumerate() {
            self.join_one(client, name, keys.get(index).copied());
        }

        HandlerResult::Handled
    }
}
