//! Per-client outbound mailbox
//!
//! Every connected client owns one bounded [`Mailbox`]. Any handler may queue
//! messages into it; a single delivery task drains it into the client's
//! transport through a [`MessageSink`]. Queuing never waits: when the queue is
//! full the configured [`OverflowPolicy`] decides what gives.

use crate::{Error, Message, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What to do when a message arrives at a full mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued message to make room
    DropOldest,
    /// Discard the message being queued
    DropNewest,
    /// Close the mailbox; the connection layer should drop the client
    #[default]
    Disconnect,
}

/// Outcome of queuing a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Message queued
    Queued,
    /// Message queued after evicting the oldest one
    DroppedOldest,
    /// Message discarded because the mailbox was full
    DroppedNewest,
    /// Mailbox overflowed and was closed
    Disconnected,
    /// Mailbox already closed
    Closed,
}

impl Delivery {
    /// Whether the message ended up in the queue
    pub fn is_queued(&self) -> bool {
        matches!(self, Delivery::Queued | Delivery::DroppedOldest)
    }
}

struct Shared {
    queue: Mutex<VecDeque<Message>>,
    capacity: usize,
    policy: OverflowPolicy,
    notify: Notify,
    dropped: AtomicU64,
    closed: CancellationToken,
}

/// Sending side of a client mailbox, cheap to clone
#[derive(Clone)]
pub struct Mailbox {
    shared: Arc<Shared>,
}

/// Receiving side of a client mailbox, owned by the delivery task
pub struct MailboxReceiver {
    shared: Arc<Shared>,
}

impl Mailbox {
    /// Create a mailbox holding at most `capacity` messages
    pub fn new(capacity: usize, policy: OverflowPolicy) -> (Mailbox, MailboxReceiver) {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity: capacity.max(1),
            policy,
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
            closed: CancellationToken::new(),
        });

        (
            Mailbox { shared: shared.clone() },
            MailboxReceiver { shared },
        )
    }

    /// Queue a message without waiting
    pub fn send(&self, message: Message) -> Delivery {
        let outcome = {
            let mut queue = self.shared.queue.lock();

            if self.shared.closed.is_cancelled() {
                return Delivery::Closed;
            }

            if queue.len() < self.shared.capacity {
                queue.push_back(message);
                Delivery::Queued
            } else {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                match self.shared.policy {
                    OverflowPolicy::DropOldest => {
                        queue.pop_front();
                        queue.push_back(message);
                        Delivery::DroppedOldest
                    }
                    OverflowPolicy::DropNewest => Delivery::DroppedNewest,
                    OverflowPolicy::Disconnect => {
                        self.shared.closed.cancel();
                        Delivery::Disconnected
                    }
                }
            }
        };

        match outcome {
            Delivery::DroppedOldest | Delivery::DroppedNewest => {
                tracing::warn!(
                    "Mailbox full ({} messages), {:?}",
                    self.shared.capacity,
                    outcome
                );
            }
            Delivery::Disconnected => {
                tracing::warn!("Mailbox full ({} messages), closing", self.shared.capacity);
            }
            _ => {}
        }

        self.shared.notify.notify_one();
        outcome
    }

    /// Queue a message, failing if it was not accepted
    pub fn try_send(&self, message: Message) -> Result<()> {
        if self.send(message).is_queued() {
            Ok(())
        } else {
            Err(Error::MailboxClosed)
        }
    }

    /// Close the mailbox; queued messages can still be drained
    pub fn close(&self) {
        close(&self.shared);
    }

    /// Check if the mailbox is closed
    pub fn is_closed(&self) -> bool {
        self.shared.closed.is_cancelled()
    }

    /// Token cancelled when the mailbox closes, for the connection layer to watch
    pub fn closed_token(&self) -> CancellationToken {
        self.shared.closed.clone()
    }

    /// Get the number of queued messages
    pub fn len(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.shared.queue.lock().is_empty()
    }

    /// Get the maximum number of queued messages
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Get the overflow policy
    pub fn policy(&self) -> OverflowPolicy {
        self.shared.policy
    }

    /// Get number of messages lost to overflow
    pub fn dropped_messages(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

fn close(shared: &Shared) {
    {
        let _queue = shared.queue.lock();
        shared.closed.cancel();
    }
    shared.notify.notify_one();
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("len", &self.len())
            .field("capacity", &self.shared.capacity)
            .field("policy", &self.shared.policy)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl MailboxReceiver {
    /// Wait for the next message; `None` once the mailbox is closed and drained
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            {
                let mut queue = self.shared.queue.lock();
                if let Some(message) = queue.pop_front() {
                    return Some(message);
                }
                if self.shared.closed.is_cancelled() {
                    return None;
                }
            }
            // Single consumer: a notify_one issued before we park leaves a permit
            self.shared.notify.notified().await;
        }
    }

    /// Take the next message if one is queued
    pub fn try_recv(&mut self) -> Option<Message> {
        self.shared.queue.lock().pop_front()
    }

    /// Take every message currently queued
    pub fn drain(&mut self) -> Vec<Message> {
        self.shared.queue.lock().drain(..).collect()
    }

    /// Close the mailbox from the receiving side
    pub fn close(&self) {
        close(&self.shared);
    }
}

impl Drop for MailboxReceiver {
    fn drop(&mut self) {
        close(&self.shared);
    }
}

/// Destination for delivered messages, typically a client's transport
#[async_trait]
pub trait MessageSink: Send {
    /// Deliver one message
    async fn deliver(&mut self, message: &Message) -> Result<()>;

    /// Called once after the mailbox is drained
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink writing CRLF terminated lines to an async writer
pub struct LineSink<W> {
    writer: W,
}

impl<W> LineSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> MessageSink for LineSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn deliver(&mut self, message: &Message) -> Result<()> {
        self.writer.write_all(message.to_line().as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Spawn the delivery task draining `receiver` into `sink`
///
/// Resolves to the number of delivered messages. A sink failure closes the
/// mailbox so no further messages are queued for a dead transport.
pub fn spawn_delivery<S>(mut receiver: MailboxReceiver, mut sink: S) -> JoinHandle<Result<u64>>
where
    S: MessageSink + 'static,
{
    tokio::spawn(async move {
        let mut delivered = 0u64;
        while let Some(message) = receiver.recv().await {
            if let Err(e) = sink.deliver(&message).await {
                tracing::warn!("Delivery failed after {} messages: {}", delivered, e);
                receiver.close();
                return Err(e);
            }
            delivered += 1;
        }
        sink.close().await?;
        tracing::debug!("Mailbox drained, {} messages delivered", delivered);
        Ok(delivered)
    })
}
