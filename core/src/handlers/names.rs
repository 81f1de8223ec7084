//! NAMES command

use super::{CommandHandler, HandlerResult};
use crate::client::Client;
use crate::registry::Registry;
use crate::{Message, MessageType, NumericReply};
use std::sync::Arc;

/// Handles `NAMES [<channel>{,<channel>}]`
///
/// Secret and private channels are only listed for their members. An
/// explicitly named channel always gets RPL_ENDOFNAMES, even when it is
/// hidden or does not exist.
pub struct NamesHandler {
    registry: Arc<Registry>,
}

impl NamesHandler {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Send names for `name` if visible; returns false otherwise
    fn list(&self, client: &Client, name: &str) -> bool {
        self.registry
            .with_channel(name, |channel| {
                if channel.is_visible_to(client.id()) {
                    self.registry.send_names(channel, client);
                    true
                } else {
                    false
                }
            })
            .unwrap_or(false)
    }
}

impl CommandHandler for NamesHandler {
    fn name(&self) -> &str {
        "names"
    }

    fn handles(&self, command: &MessageType) -> bool {
        matches!(command, MessageType::Names)
    }

    fn handle(&self, client: &Client, message: &Message) -> HandlerResult {
        match message.argument(0) {
            Some(targets) if !targets.is_empty() => {
                for name in targets.split(',') {
                    if !self.list(client, name) {
                        client.send(NumericReply::end_of_names(
                            self.registry.server_name(),
                            client.nick(),
                            name,
                        ));
                    }
                }
            }
            _ => {
                for name in self.registry.channel_names() {
                    self.list(client, &name);
                }
            }
        }
        HandlerResult::Handled
    }
}
