//! Performance benchmarks for the chanircd channel core

use chanircd_core::modes::parse_mode_changes;
use chanircd_core::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

fn benchmark_message_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_parsing");

    let messages = vec![
        "JOIN #channel",
        "JOIN #a,#b,#c key1,key2",
        ":alice!user@host PRIVMSG #channel :Hello world",
        "MODE #channel +ovk alice bob secret",
        "PART #channel :Goodbye",
    ];

    for msg in messages {
        group.bench_with_input(BenchmarkId::from_parameter(msg), msg, |b, msg| {
            b.iter(|| Message::parse(black_box(msg)))
        });
    }

    group.finish();
}

fn benchmark_mode_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("mode_parsing");

    let cases: Vec<(&str, Vec<&str>)> = vec![
        ("+nt", vec![]),
        ("+ovk", vec!["alice", "bob", "secret"]),
        ("+l-k+b", vec!["50", "*!*@spam.example", "old"]),
        ("+oooo", vec!["a", "b", "c", "d"]),
    ];

    for (modes, params) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(modes), &params, |b, params| {
            b.iter(|| parse_mode_changes(black_box(modes), black_box(params)))
        });
    }

    group.finish();
}

fn benchmark_channel_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_fan_out");

    for members in [10usize, 100, 1000] {
        let mut config = Config::default();
        config.mailbox.capacity = 1;
        config.mailbox.overflow = OverflowPolicy::DropOldest;
        let registry = Arc::new(Registry::new(Arc::new(config)));
        let router = CommandRouter::new(registry.clone());

        let clients: Vec<(Arc<Client>, MailboxReceiver)> = (0..members)
            .map(|i| registry.connect(&format!("user{}", i), "u", "host").unwrap())
            .collect();
        let join = Message::parse("JOIN #bench").unwrap();
        for (client, _) in &clients {
            router.dispatch(client.id(), &join);
        }

        let speaker = clients[0].0.id();
        let privmsg = Message::parse("PRIVMSG #bench :benchmark payload").unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(members), &privmsg, |b, msg| {
            b.iter(|| router.dispatch(speaker, black_box(msg)))
        });
    }

    group.finish();
}

fn benchmark_join_part(c: &mut Criterion) {
    let registry = Arc::new(Registry::new(Arc::new(Config::default())));
    let router = CommandRouter::new(registry.clone());
    let (client, mut receiver) = registry.connect("alice", "a", "host").unwrap();

    let join = Message::parse("JOIN #churn").unwrap();
    let part = Message::parse("PART #churn").unwrap();

    c.bench_function("join_part_cycle", |b| {
        b.iter(|| {
            router.dispatch(client.id(), &join);
            router.dispatch(client.id(), &part);
            receiver.drain();
        })
    });
}

criterion_group!(
    benches,
    benchmark_message_parsing,
    benchmark_mode_parsing,
    benchmark_channel_fan_out,
    benchmark_join_part
);
criterion_main!(benches);
