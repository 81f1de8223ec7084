//! TOPIC command

use super::{CommandHandler, HandlerResult};
use crate::channel::ChannelMode;
use crate::client::Client;
use crate::registry::Registry;
use crate::{Message, MessageType, NumericReply};
use std::sync::Arc;

/// Handles `TOPIC <channel> [<topic>]`
pub struct TopicHandler {
    registry: Arc<Registry>,
}

impl TopicHandler {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

impl CommandHandler for TopicHandler {
    fn name(&self) -> &str {
        "topic"
    }

    fn handles(&self, command: &MessageType) -> bool {
        matches!(command, MessageType::Topic)
    }

    fn handle(&self, client: &Client, message: &Message) -> HandlerResult {
        let registry = &self.registry;
        let server = registry.server_name();
        let nick = client.nick();
        let args = message.arguments();

        let name = match args.first() {
            Some(name) => *name,
            None => {
                client.send(NumericReply::need_more_params(server, nick, "TOPIC"));
                return HandlerResult::Handled;
            }
        };

        let found = registry.with_channel(name, |channel| {
            let id = client.id();
            let topic = match args.get(1) {
                Some(topic) => *topic,
                None => {
                    if channel.is_visible_to(id) {
                        registry.send_topic(channel, client);
                    } else {
                        client.send(NumericReply::not_on_channel(server, nick, channel.name()));
                    }
                    return;
                }
            };

            if !channel.is_member(id) {
                client.send(NumericReply::not_on_channel(server, nick, channel.name()));
                return;
            }
            if channel.has_mode(ChannelMode::TopicLock) && !channel.is_operator(id) {
                client.send(NumericReply::chan_op_privs_needed(server, nick, channel.name()));
                return;
            }

            channel.set_topic(topic, &client.mask());
            let change = Message::new(MessageType::Topic, vec![channel.name().to_string()])
                .with_prefix(client.prefix())
                .with_trailing(topic);
            registry.broadcast(channel, &change);
        });

        if found.is_none() {
            client.send(NumericReply::no_such_channel(server, nick, name));
        }
        HandlerResult::Handled
    }
}
