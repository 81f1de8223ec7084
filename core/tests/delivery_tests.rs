//! Mailbox delivery to a transport

use chanircd_core::*;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::test]
async fn test_delivery_writes_lines_in_order() {
    let registry = Arc::new(Registry::new(Arc::new(Config::default())));
    let router = CommandRouter::new(registry.clone());
    let (alice, alice_rx) = registry.connect("alice", "alice", "test.host").unwrap();

    let (writer, reader) = tokio::io::duplex(4096);
    let delivery = spawn_delivery(alice_rx, LineSink::new(writer));

    router.dispatch(alice.id(), &Message::parse("JOIN #rust").unwrap());
    router.dispatch(alice.id(), &Message::parse("TOPIC #rust :hello").unwrap());
    registry.disconnect_client(alice.id(), "bye");

    let mut lines = BufReader::new(reader).lines();
    let mut received = Vec::new();
    while let Some(line) = lines.next_line().await.unwrap() {
        received.push(line);
    }

    assert_eq!(
        received,
        vec![
            ":alice!alice@test.host JOIN #rust",
            ":irc.localhost 331 alice #rust :No topic is set",
            ":irc.localhost 353 alice = #rust :@alice",
            ":irc.localhost 366 alice #rust :End of /NAMES list",
            ":alice!alice@test.host TOPIC #rust :hello",
        ]
    );
    assert_eq!(delivery.await.unwrap().unwrap(), 5);
}

#[tokio::test]
async fn test_overflow_disconnect_closes_mailbox() {
    let mut config = Config::default();
    config.mailbox.capacity = 2;
    let registry = Arc::new(Registry::new(Arc::new(config)));
    let router = CommandRouter::new(registry.clone());

    let (alice, _alice_rx) = registry.connect("alice", "a", "host").unwrap();
    let token = alice.mailbox().closed_token();

    // JOIN alone queues four messages
    router.dispatch(alice.id(), &Message::parse("JOIN #rust").unwrap());
    assert!(token.is_cancelled());
    assert_eq!(alice.send(Message::parse("PING :x").unwrap()), Delivery::Closed);

    // The connection layer reacts by disconnecting
    assert!(registry.disconnect_client(alice.id(), "Max SendQ exceeded"));
    assert_eq!(registry.channel_count(), 0);
}

struct FailingSink;

#[async_trait]
impl MessageSink for FailingSink {
    async fn deliver(&mut self, _message: &Message) -> Result<()> {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "gone",
        )))
    }
}

#[tokio::test]
async fn test_sink_failure_closes_mailbox() {
    let (mailbox, receiver) = Mailbox::new(8, OverflowPolicy::DropNewest);
    mailbox.send(Message::parse("PING :x").unwrap());

    let result = spawn_delivery(receiver, FailingSink).await.unwrap();
    assert!(matches!(result, Err(Error::Io(_))));
    assert!(mailbox.is_closed());
}
