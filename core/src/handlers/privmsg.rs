//! PRIVMSG and NOTICE

use super::{CommandHandler, HandlerResult};
use crate::client::Client;
use crate::registry::Registry;
use crate::utils::string::is_channel_target;
use crate::{Message, MessageType, NumericReply};
use std::sync::Arc;

/// Handles `PRIVMSG`/`NOTICE <target>{,<target>} <text>`
///
/// NOTICE never generates error replies.
pub struct PrivMsgHandler {
    registry: Arc<Registry>,
}

impl PrivMsgHandler {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    fn to_channel(&self, client: &Client, command: &MessageType, target: &str, text: &str, notice: bool) {
        let registry = &self.registry;
        let server = registry.server_name();

        let found = registry.with_channel(target, |channel| {
            if !channel.can_priv_msg(client) {
                if !notice {
                    client.send(NumericReply::cannot_send_to_chan(server, client.nick(), channel.name()));
                }
                return;
            }
            let out = Message::new(command.clone(), vec![channel.name().to_string()])
                .with_prefix(client.prefix())
                .with_trailing(text);
            registry.broadcast_except(channel, &out, client.id());
        });

        if found.is_none() && !notice {
            client.send(NumericReply::no_such_channel(server, client.nick(), target));
        }
    }

    fn to_client(&self, client: &Client, command: &MessageType, target: &str, text: &str, notice: bool) {
        match self.registry.resolve_client_by_nick(target) {
            Some(recipient) => {
                let out = Message::new(command.clone(), vec![recipient.nick().to_string()])
                    .with_prefix(client.prefix())
                    .with_trailing(text);
                recipient.send(out);
            }
            None if !notice => {
                client.send(NumericReply::no_such_nick(self.registry.server_name(), client.nick(), target));
            }
            None => {}
        }
    }
}

impl CommandHandler for PrivMsgHandler {
    fn name(&self) -> &str {
        "privmsg"
    }

    fn handles(&self, command: &MessageType) -> bool {
        matches!(command, MessageType::PrivMsg | MessageType::Notice)
    }

    fn handle(&self, client: &Client, message: &Message) -> HandlerResult {
        let server = self.registry.server_name();
        let notice = message.command == MessageType::Notice;
        let args = message.arguments();

        let targets = match args.first() {
            Some(targets) if !targets.is_empty() => *targets,
            _ => {
                if !notice {
                    let command = message.command.to_string();
                    client.send(NumericReply::no_recipient(server, client.nick(), &command));
                }
                return HandlerResult::Handled;
            }
        };
        let text = match args.get(1) {
            Some(text) if !text.is_empty() => *text,
            _ => {
                if !notice {
                    client.send(NumericReply::no_text_to_send(server, client.nick()));
                }
                return HandlerResult::Handled;
            }
        };

        for target in targets.split(',') {
            if is_channel_target(target) {
                self.to_channel(client, &message.command, target, text, notice);
            } else {
                self.to_client(client, &message.command, target, text, notice);
            }
        }

        HandlerResult::Handled
    }
}
