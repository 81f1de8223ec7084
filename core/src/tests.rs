//! Cross-module tests for the channel core

#[cfg(test)]
mod tests {
    use crate::{
        ChannelMode, Client, ClientId, CommandRouter, Config, HandlerResult, MailboxReceiver,
        Message, MessageType, Registry,
    };
    use std::sync::Arc;

    fn setup() -> (Arc<Registry>, CommandRouter) {
        let registry = Arc::new(Registry::new(Arc::new(Config::default())));
        let router = CommandRouter::new(registry.clone());
        (registry, router)
    }

    fn connect(registry: &Registry, nick: &str) -> (Arc<Client>, MailboxReceiver) {
        registry.connect(nick, nick, "test.host").unwrap()
    }

    fn send(router: &CommandRouter, client: &Client, line: &str) -> HandlerResult {
        router.dispatch(client.id(), &Message::parse(line).unwrap())
    }

    /// Channel member sets, client channel sets and the reverse index agree
    fn assert_consistent(registry: &Registry, clients: &[&Arc<Client>]) {
        for name in registry.channel_names() {
            let members = registry
                .with_channel(&name, |channel| {
                    assert!(!channel.is_empty(), "empty channel {} still registered", name);
                    for id in channel.member_ids() {
                        assert!(channel.is_member(id));
                    }
                    channel.member_ids()
                })
                .unwrap();
            assert_eq!(registry.member_ids(&name), members);

            for client in clients {
                assert_eq!(client.is_in_channel(&name), members.contains(&client.id()));
            }
        }

        for client in clients {
            for name in client.channels() {
                assert!(registry.has_channel(&name), "{} points at missing {}", client.nick(), name);
            }
        }
    }

    #[test]
    fn test_membership_stays_consistent() {
        let (registry, router) = setup();
        let (alice, _a) = connect(&registry, "alice");
        let (bob, _b) = connect(&registry, "bob");
        let (carol, _c) = connect(&registry, "carol");
        let all = [&alice, &bob, &carol];

        send(&router, &alice, "JOIN #a,#b,#c");
        send(&router, &bob, "JOIN #a,#b");
        send(&router, &carol, "JOIN #b");
        assert_consistent(&registry, &all);

        send(&router, &alice, "PART #a,#b");
        assert_consistent(&registry, &all);

        send(&router, &bob, "JOIN 0");
        assert_consistent(&registry, &all);
        assert!(!registry.has_channel("#a"));
        assert!(registry.has_channel("#b"));

        registry.disconnect_client(carol.id(), "bye");
        assert_consistent(&registry, &[&alice, &bob]);
        assert!(!registry.has_channel("#b"));
        assert_eq!(registry.channel_names(), vec!["#c"]);
    }

    #[test]
    fn test_operators_are_members() {
        let (registry, router) = setup();
        let (alice, _a) = connect(&registry, "alice");
        let (bob, _b) = connect(&registry, "bob");

        send(&router, &alice, "JOIN #ops");
        send(&router, &bob, "JOIN #ops");
        send(&router, &alice, "MODE #ops +ov bob bob");
        send(&router, &bob, "PART #ops");

        registry
            .with_channel("#ops", |channel| {
                assert!(channel.is_operator(alice.id()));
                assert!(!channel.is_operator(bob.id()));
                assert!(!channel.is_voiced(bob.id()));
                assert_eq!(channel.member_count(), 1);
            })
            .unwrap();
    }

    #[test]
    fn test_failed_join_leaves_no_channel() {
        let (registry, router) = setup();
        let (alice, _a) = connect(&registry, "alice");
        send(&router, &alice, "JOIN #ok,bad");
        assert_eq!(registry.channel_names(), vec!["#ok"]);
        assert_eq!(alice.channels(), vec!["#ok"]);
    }

    #[test]
    fn test_rejoin_after_destroy_gets_fresh_channel() {
        let (registry, router) = setup();
        let (alice, _a) = connect(&registry, "alice");

        send(&router, &alice, "JOIN #x");
        send(&router, &alice, "MODE #x +m");
        send(&router, &alice, "PART #x");
        assert!(!registry.has_channel("#x"));

        send(&router, &alice, "JOIN #x");
        registry
            .with_channel("#x", |channel| {
                assert!(!channel.has_mode(ChannelMode::Moderated));
                assert!(channel.has_mode(ChannelMode::NoExternal));
                assert!(channel.is_operator(alice.id()));
            })
            .unwrap();
    }

    #[test]
    fn test_user_mode_not_handled() {
        let (registry, router) = setup();
        let (alice, _a) = connect(&registry, "alice");
        assert_eq!(send(&router, &alice, "MODE alice +i"), HandlerResult::NotHandled);
        assert_eq!(send(&router, &alice, "PING :x"), HandlerResult::NotHandled);
        assert_eq!(send(&router, &alice, "JOIN #x"), HandlerResult::Handled);
    }

    #[test]
    fn test_unknown_client_not_dispatched() {
        let (_registry, router) = setup();
        let join = Message::new(MessageType::Join, vec!["#x".to_string()]);
        assert_eq!(router.dispatch(ClientId(999), &join), HandlerResult::NotHandled);
    }
}
