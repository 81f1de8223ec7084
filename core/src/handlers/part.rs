//! PART command

use super::{CommandHandler, HandlerResult};
use crate::client::Client;
use crate::registry::Registry;
use crate::{Message, MessageType, NumericReply};
use std::sync::Arc;

/// Handles `PART <channel>{,<channel>} [<reason>]`
pub struct PartHandler {
    registry: Arc<Registry>,
}

impl PartHandler {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

impl CommandHandler for PartHandler {
    fn name(&self) -> &str {
        "part"
    }

    fn handles(&self, command: &MessageType) -> bool {
        matches!(command, MessageType::Part)
    }

    fn handle(&self, client: &Client, message: &Message) -> HandlerResult {
        let registry = &self.registry;
        let server = registry.server_name();
        let args = message.arguments();

        let targets = match args.first() {
            Some(targets) if !targets.is_empty() => *targets,
            _ => {
                client.send(NumericReply::need_more_params(server, client.nick(), "PART"));
                return HandlerResult::Handled;
            }
        };
        let reason = args.get(1).copied();

        for name in targets.split(',') {
            let found = registry.with_channel(name, |channel| {
                if channel.is_member(client.id()) {
                    registry.remove_member(channel, client, reason);
                } else {
                    client.send(NumericReply::not_on_channel(server, client.nick(), channel.name()));
                }
            });
            if found.is_none() {
                client.send(NumericReply::no_such_channel(server, client.nick(), name));
            }
        }

        HandlerResult::Handled
    }
}
