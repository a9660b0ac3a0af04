//! Full-session loopback tests: join handshake, roster, relaying.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use codec::Value;
use relay::{HostEndpoint, PeerEndpoint, RelayConfig, RelayPolicy, Role};
use schema::SchemaType;
use tokio::sync::mpsc;
use wire::{Frame, PacketTable, PacketTag, Reliability};

const CHAT: PacketTag = PacketTag(5);
const POSITION: PacketTag = PacketTag(6);

fn table() -> PacketTable {
    let chat = SchemaType::structure("Chat")
        .field("text", SchemaType::string())
        .build()
        .unwrap();
    let position = SchemaType::structure("Position")
        .field("x", SchemaType::float())
        .field("y", SchemaType::float())
        .build()
        .unwrap();
    PacketTable::builder()
        .register(CHAT, chat, Reliability::Reliable)
        .unwrap()
        .register(POSITION, position, Reliability::Unreliable)
        .unwrap()
        .build()
}

fn any_port() -> SocketAddr {
    (Ipv4Addr::LOCALHOST, 0).into()
}

async fn bind_host(username: &str) -> HostEndpoint {
    HostEndpoint::bind(any_port(), any_port(), table(), RelayConfig::new(username))
        .await
        .unwrap()
}

async fn join(host: &HostEndpoint, username: &str) -> PeerEndpoint {
    PeerEndpoint::connect(
        host.reliable_addr(),
        host.unreliable_addr(),
        table(),
        RelayConfig::new(username),
    )
    .await
    .unwrap()
}

/// Ticks every endpoint until `done` holds or the deadline passes.
async fn settle(host: &HostEndpoint, peers: &[&PeerEndpoint], done: impl Fn() -> bool) {
    for _ in 0..500 {
        host.update();
        for peer in peers {
            peer.update();
        }
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session did not settle in time");
}

fn app_value(frame: &Frame) -> Value {
    match frame {
        Frame::App { value, .. } => value.clone(),
        other => panic!("expected app frame, got {other:?}"),
    }
}

#[tokio::test]
async fn two_peers_complete_the_handshake() {
    let host = bind_host("host").await;
    assert_eq!(host.role(), Role::Host);
    assert_eq!(host.player_id(), 1);

    let alice = join(&host, "alice").await;
    assert_eq!(alice.role(), Role::Peer);
    settle(&host, &[&alice], || alice.player_id().is_some()).await;
    assert_eq!(alice.player_id(), Some(2));

    let bob = join(&host, "bob").await;
    settle(&host, &[&alice, &bob], || bob.player_id().is_some()).await;
    assert_eq!(bob.player_id(), Some(3));

    // Rosters converge: bob learned about everyone who joined before him,
    // alice got the announcement for bob.
    settle(&host, &[&alice, &bob], || {
        bob.players().len() == 3 && alice.players().len() == 3
    })
    .await;
    assert_eq!(
        host.players(),
        vec![
            (1, "host".to_owned()),
            (2, "alice".to_owned()),
            (3, "bob".to_owned()),
        ]
    );
    assert_eq!(bob.players(), host.players());
    assert_eq!(alice.players(), host.players());
}

#[tokio::test]
async fn chat_relays_to_the_other_peer() {
    let host = bind_host("host").await;
    host.set_relay_policy(CHAT, RelayPolicy::ExceptSender);

    let alice = join(&host, "alice").await;
    let bob = join(&host, "bob").await;
    settle(&host, &[&alice, &bob], || {
        alice.player_id().is_some() && bob.player_id().is_some()
    })
    .await;

    let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();
    bob.handlers().on(CHAT, move |frame, from| {
        let _ = bob_tx.send((app_value(frame), from));
    });
    let (alice_tx, mut alice_rx) = mpsc::unbounded_channel();
    alice.handlers().on(CHAT, move |frame, _| {
        let _ = alice_tx.send(app_value(frame));
    });

    alice
        .send(CHAT, Value::Struct(vec![Value::from("hi bob")]), None)
        .unwrap();
    settle(&host, &[&alice, &bob], || !bob_rx.is_empty()).await;

    let (value, from) = bob_rx.try_recv().unwrap();
    assert_eq!(value, Value::Struct(vec![Value::from("hi bob")]));
    // Relayed frames arrive from the host's stream.
    assert_eq!(from, 1);
    // The sender is excluded from its own broadcast.
    assert!(alice_rx.try_recv().is_err());
}

#[tokio::test]
async fn unreliable_packets_travel_over_the_datagram_channel() {
    let host = bind_host("host").await;

    let alice = join(&host, "alice").await;
    settle(&host, &[&alice], || alice.player_id().is_some()).await;

    let (host_tx, mut host_rx) = mpsc::unbounded_channel();
    host.handlers().on(POSITION, move |frame, from| {
        let _ = host_tx.send((app_value(frame), from));
    });

    alice
        .send(
            POSITION,
            Value::Struct(vec![Value::F32(1.5), Value::F32(-2.25)]),
            None,
        )
        .unwrap();
    settle(&host, &[&alice], || !host_rx.is_empty()).await;

    let (value, from) = host_rx.try_recv().unwrap();
    assert_eq!(value, Value::Struct(vec![Value::F32(1.5), Value::F32(-2.25)]));
    assert_eq!(from, 2);
}

#[tokio::test]
async fn ambiguous_reliability_is_rejected_at_send() {
    let both = SchemaType::structure("Flex")
        .field("n", SchemaType::uint())
        .build()
        .unwrap();
    let table = PacketTable::builder()
        .register(PacketTag(5), both, Reliability::Both)
        .unwrap()
        .build();
    let host = HostEndpoint::bind(any_port(), any_port(), table, RelayConfig::new("host"))
        .await
        .unwrap();

    let err = host
        .send(PacketTag(5), Value::Struct(vec![Value::U32(1)]), None)
        .unwrap_err();
    assert!(matches!(err, relay::RelayError::Config(_)));

    // An explicit override resolves the ambiguity, and broadcasting to an
    // empty session succeeds trivially.
    host.send(
        PacketTag(5),
        Value::Struct(vec![Value::U32(1)]),
        Some(Reliability::Reliable),
    )
    .unwrap();
}

#[tokio::test]
async fn ids_of_departed_peers_are_not_reused() {
    let host = bind_host("host").await;

    let alice = join(&host, "alice").await;
    settle(&host, &[&alice], || alice.player_id().is_some()).await;
    assert_eq!(alice.player_id(), Some(2));

    alice.disconnect();
    settle(&host, &[], || host.players().len() == 1).await;

    // A later arrival gets a fresh identity, never alice's old one.
    let bob = join(&host, "bob").await;
    settle(&host, &[&bob], || bob.player_id().is_some()).await;
    assert_eq!(bob.player_id(), Some(3));
    assert_eq!(
        host.players(),
        vec![(1, "host".to_owned()), (3, "bob".to_owned())]
    );
}

#[tokio::test]
async fn peer_disconnect_clears_the_roster() {
    let host = bind_host("host").await;
    let alice = join(&host, "alice").await;
    settle(&host, &[&alice], || alice.player_id().is_some()).await;
    assert_eq!(host.players().len(), 2);

    alice.disconnect();
    settle(&host, &[], || host.players().len() == 1).await;
    assert_eq!(host.players(), vec![(1, "host".to_owned())]);
}
