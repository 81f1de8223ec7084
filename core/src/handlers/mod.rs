//! Channel command handlers
//!
//! Each verb the channel core owns has a [`CommandHandler`]. The
//! [`CommandRouter`] offers an incoming message to its handlers in
//! registration order until one reports [`HandlerResult::Handled`].
//! Protocol failures never surface as `Err`: they are numeric replies queued
//! to the requesting client.

mod join;
mod mode;
mod names;
mod part;
mod privmsg;
mod topic;

pub use join::JoinHandler;
pub use mode::ModeHandler;
pub use names::NamesHandler;
pub use part::PartHandler;
pub use privmsg::PrivMsgHandler;
pub use topic::TopicHandler;

use crate::client::{Client, ClientId};
use crate::registry::Registry;
use crate::{Message, MessageType};
use std::sync::Arc;

/// Outcome of offering a message to a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerResult {
    /// The message was consumed
    Handled,
    /// Not for this handler; try the next one
    NotHandled,
}

/// A handler for one or more commands
pub trait CommandHandler: Send + Sync {
    /// Handler name, for logging
    fn name(&self) -> &str;

    /// Whether this handler wants messages with `command`
    fn handles(&self, command: &MessageType) -> bool;

    /// Handle a message from `client`
    fn handle(&self, client: &Client, message: &Message) -> HandlerResult;
}

/// Dispatches client messages to the registered handlers
pub struct CommandRouter {
    registry: Arc<Registry>,
    handlers: Vec<Box<dyn CommandHandler>>,
}

impl CommandRouter {
    /// Router with the standard channel command handlers
    pub fn new(registry: Arc<Registry>) -> Self {
        let mut router = Self::empty(registry.clone());
        router.register(Box::new(JoinHandler::new(registry.clone())));
        router.register(Box::new(PartHandler::new(registry.clone())));
        router.register(Box::new(ModeHandler::new(registry.clone())));
        router.register(Box::new(TopicHandler::new(registry.clone())));
        router.register(Box::new(NamesHandler::new(registry.clone())));
        router.register(Box::new(PrivMsgHandler::new(registry)));
        router
    }

    /// Router with no handlers
    pub fn empty(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            handlers: Vec::new(),
        }
    }

    /// Add a handler after the existing ones
    pub fn register(&mut self, handler: Box<dyn CommandHandler>) {
        tracing::debug!("Registered command handler: {}", handler.name());
        self.handlers.push(handler);
    }

    /// Get the registry
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Route a message from the client with `id`
    pub fn dispatch(&self, id: ClientId, message: &Message) -> HandlerResult {
        let client = match self.registry.client(id) {
            Some(client) => client,
            None => {
                tracing::warn!("Dropping {} from unknown client {}", message.command, id);
                return HandlerResult::NotHandled;
            }
        };

        for handler in &self.handlers {
            if !handler.handles(&message.command) {
                continue;
            }
            tracing::trace!("{} handling {} from {}", handler.name(), message.command, client.nick());
            if handler.handle(&client, message) == HandlerResult::Handled {
                return HandlerResult::Handled;
            }
        }

        HandlerResult::NotHandled
    }

    /// Remove a client from the registry, notifying its channels
    pub fn disconnect(&self, id: ClientId, reason: &str) -> bool {
        self.registry.disconnect_client(id, reason)
    }
}
