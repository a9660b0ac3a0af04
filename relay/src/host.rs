//! The hosting endpoint.
//!
//! The host owns both server sockets and is the hub of the session: every
//! peer talks only to it, and anything meant for another peer is relayed
//! through it. Player ID 1 is the host itself and never appears in the
//! connection tables.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use codec::Value;
use parking_lot::Mutex;
use tracing::{info, warn};
use transport::{
    ActionQueue, HandlerRegistry, PlayerId, TcpServer, UdpServer, HOST_PLAYER_ID,
};
use wire::{
    ConnectPacket, Frame, IdRelayPacket, PacketTable, PacketTag, PlayerConnectedPacket,
    Reliability, WireError,
};

use crate::config::RelayConfig;
use crate::error::RelayResult;
use crate::object_id::create_id;
use crate::roster::Roster;
use crate::sync::{EntityRegistry, Replicated};
use crate::Role;

/// What the host does with an inbound application packet besides local
/// dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayPolicy {
    /// Deliver locally only.
    #[default]
    None,
    /// Re-broadcast to every peer except the sender, then deliver locally.
    ExceptSender,
}

struct HostShared {
    username: String,
    roster: Mutex<Roster>,
    counter: AtomicU64,
}

/// Session host: accepts peers, runs the join handshake, relays traffic.
pub struct HostEndpoint {
    tcp: Arc<TcpServer>,
    udp: Arc<UdpServer>,
    handlers: HandlerRegistry,
    queue: ActionQueue,
    shared: Arc<HostShared>,
    entities: Mutex<EntityRegistry>,
}

impl HostEndpoint {
    /// Binds both server sockets and wires up the join handshake.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Transport`](crate::RelayError::Transport) when
    /// either socket cannot bind.
    pub async fn bind(
        reliable_addr: SocketAddr,
        unreliable_addr: SocketAddr,
        table: PacketTable,
        config: RelayConfig,
    ) -> RelayResult<Self> {
        let queue = ActionQueue::new();
        let handlers = HandlerRegistry::new();
        let tcp = Arc::new(
            TcpServer::bind(
                reliable_addr,
                table.clone(),
                queue.clone(),
                handlers.clone(),
                config.transport.clone(),
            )
            .await?,
        );
        let udp = Arc::new(
            UdpServer::bind(unreliable_addr, table, queue.clone(), handlers.clone()).await?,
        );
        let shared = Arc::new(HostShared {
            username: config.username,
            roster: Mutex::new(Roster::new()),
            counter: AtomicU64::new(0),
        });

        // Handler closures hold weak server references; the endpoint owns
        // the strong ones, so dropping it still tears the sockets down.
        {
            let shared = Arc::clone(&shared);
            let tcp_weak = Arc::downgrade(&tcp);
            let udp_weak = Arc::downgrade(&udp);
            handlers.on(PacketTag::CONNECT, move |frame, from| {
                let Frame::Connect(packet) = frame else { return };
                let (Some(tcp), Some(udp)) = (tcp_weak.upgrade(), udp_weak.upgrade()) else {
                    return;
                };
                handle_connect(&shared, &tcp, &udp, from, packet);
            });
        }
        {
            let shared = Arc::clone(&shared);
            let udp_weak = Arc::downgrade(&udp);
            tcp.on_disconnect(move |player| {
                if let Some(udp) = udp_weak.upgrade() {
                    udp.unbind_peer(player);
                }
                if let Some(username) = shared.roster.lock().remove(player) {
                    info!(player, %username, "peer left the session");
                }
            });
        }

        info!(
            reliable = %tcp.local_addr(),
            unreliable = %udp.local_addr(),
            username = %shared.username,
            "hosting session"
        );
        Ok(Self {
            tcp,
            udp,
            handlers,
            queue,
            shared,
            entities: Mutex::new(EntityRegistry::new()),
        })
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        Role::Host
    }

    /// The host's own player ID.
    #[must_use]
    pub const fn player_id(&self) -> PlayerId {
        HOST_PLAYER_ID
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.shared.username
    }

    #[must_use]
    pub fn reliable_addr(&self) -> SocketAddr {
        self.tcp.local_addr()
    }

    #[must_use]
    pub fn unreliable_addr(&self) -> SocketAddr {
        self.udp.local_addr()
    }

    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    #[must_use]
    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    /// Everyone in the session, the host itself first.
    #[must_use]
    pub fn players(&self) -> Vec<(PlayerId, String)> {
        let mut players = vec![(HOST_PLAYER_ID, self.shared.username.clone())];
        players.extend(self.shared.roster.lock().players());
        players
    }

    /// Turns on server-side relaying for an application tag.
    ///
    /// Call before registering application handlers for the tag: relaying
    /// happens in handler registration order, so the re-broadcast precedes
    /// local delivery only if it was registered first.
    pub fn set_relay_policy(&self, tag: PacketTag, policy: RelayPolicy) {
        if policy != RelayPolicy::ExceptSender {
            return;
        }
        let tcp_weak = Arc::downgrade(&self.tcp);
        let udp_weak = Arc::downgrade(&self.udp);
        self.handlers.on(tag, move |frame, from| {
            let Frame::App { .. } = frame else { return };
            relay_inbound(&tcp_weak, &udp_weak, frame, from);
        });
    }

    /// Queues a packet for every connected peer.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`](crate::RelayError::Config) when the
    /// tag is unregistered or its reliability is ambiguous, and
    /// [`RelayError::Transport`](crate::RelayError::Transport) when the
    /// value does not fit the schema.
    pub fn send(
        &self,
        tag: PacketTag,
        value: Value,
        reliability: Option<Reliability>,
    ) -> RelayResult<()> {
        let channel = self.tcp.table().reliability_for_send(tag, reliability)?;
        let frame = Frame::App { tag, value };
        match channel {
            Reliability::Reliable => self.tcp.relay_all(frame)?,
            Reliability::Unreliable => self.udp.relay_all(frame)?,
            Reliability::Both => return Err(WireError::AmbiguousReliability { tag }.into()),
        }
        Ok(())
    }

    /// Queues a packet for one peer.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send), plus
    /// [`TransportError::UnknownPlayer`](transport::TransportError::UnknownPlayer)
    /// when the target is not connected. The host is not a valid target.
    pub fn send_to(
        &self,
        player: PlayerId,
        tag: PacketTag,
        value: Value,
        reliability: Option<Reliability>,
    ) -> RelayResult<()> {
        let channel = self.tcp.table().reliability_for_send(tag, reliability)?;
        let frame = Frame::App { tag, value };
        match channel {
            Reliability::Reliable => self.tcp.send_to(player, frame)?,
            Reliability::Unreliable => self.udp.send_to(player, frame)?,
            Reliability::Both => return Err(WireError::AmbiguousReliability { tag }.into()),
        }
        Ok(())
    }

    /// Queues a packet for a set of peers.
    ///
    /// # Errors
    ///
    /// As [`send_to`](Self::send_to); the first failing target aborts the
    /// rest.
    pub fn send_to_many(
        &self,
        players: &[PlayerId],
        tag: PacketTag,
        value: Value,
        reliability: Option<Reliability>,
    ) -> RelayResult<()> {
        for player in players {
            self.send_to(*player, tag, value.clone(), reliability)?;
        }
        Ok(())
    }

    /// Seals and ships every pending batch on both channels.
    pub fn flush(&self) {
        self.tcp.flush();
        self.udp.flush();
    }

    /// The fixed-tick driver: runs deferred sends, then flushes.
    pub fn update(&self) {
        self.queue.drain();
        self.flush();
    }

    /// Mints a fresh object ID owned by the host.
    pub fn next_object_id(&self) -> u64 {
        let counter = self.shared.counter.fetch_add(1, Ordering::SeqCst) + 1;
        create_id(HOST_PLAYER_ID, counter)
    }

    /// Adds an entity to the synchronization set.
    pub fn register_entity(&self, entity: Box<dyn Replicated>) {
        self.entities.lock().register(entity);
    }

    /// Removes an entity from the synchronization set.
    pub fn remove_entity(&self, object_id: u64) {
        self.entities.lock().remove(object_id);
    }

    /// Broadcasts the state of every host-owned entity.
    pub fn synchronize(&self) {
        let mut entities = self.entities.lock();
        entities.synchronize(HOST_PLAYER_ID, &mut |tag, value| {
            if let Err(err) = self.send(tag, value, None) {
                warn!(tag = tag.0, %err, "entity state packet dropped");
            }
        });
    }

    /// Sends an orderly disconnect to a peer and forgets it.
    ///
    /// # Errors
    ///
    /// Returns
    /// [`TransportError::UnknownPlayer`](transport::TransportError::UnknownPlayer)
    /// when the target is not connected.
    pub fn kick(&self, player: PlayerId) -> RelayResult<()> {
        self.tcp.disconnect(player)?;
        Ok(())
    }

    /// Tears down both sockets.
    pub fn shutdown(&self) {
        self.tcp.shutdown();
        self.udp.shutdown();
    }
}

fn handle_connect(
    shared: &Arc<HostShared>,
    tcp: &TcpServer,
    udp: &UdpServer,
    from: PlayerId,
    packet: &ConnectPacket,
) {
    info!(player = from, username = %packet.username, "peer joining");

    // The ID was fixed at accept time; the relay packet makes it official.
    if let Err(err) = tcp.send_to(
        from,
        Frame::IdRelay(IdRelayPacket { player_id: from }),
    ) {
        warn!(player = from, %err, "join handshake failed");
        return;
    }

    // Replay the roster so the newcomer learns everyone, host first.
    let replay = {
        let roster = shared.roster.lock();
        let mut list = vec![(HOST_PLAYER_ID, shared.username.clone())];
        list.extend(roster.players());
        list
    };
    for (player_id, username) in replay {
        if let Err(err) = tcp.send_to(
            from,
            Frame::PlayerConnected(PlayerConnectedPacket { player_id, username }),
        ) {
            warn!(player = from, %err, "roster replay failed");
        }
    }

    // The datagram channel keys on source address: the IP we already see
    // on the stream, the port the peer reported.
    match (tcp.peer_addr(from), u16::try_from(packet.udp_port)) {
        (Some(addr), Ok(port)) if port != 0 => {
            udp.bind_peer(from, SocketAddr::new(addr.ip(), port));
        }
        _ => warn!(
            player = from,
            port = packet.udp_port,
            "join request carried an unusable datagram port"
        ),
    }

    if let Err(err) = tcp.relay_except(
        Frame::PlayerConnected(PlayerConnectedPacket {
            player_id: from,
            username: packet.username.clone(),
        }),
        Some(from),
    ) {
        warn!(player = from, %err, "join announcement failed");
    }

    shared.roster.lock().insert(from, packet.username.clone());
}

fn relay_inbound(
    tcp_weak: &Weak<TcpServer>,
    udp_weak: &Weak<UdpServer>,
    frame: &Frame,
    from: PlayerId,
) {
    let (Some(tcp), Some(udp)) = (tcp_weak.upgrade(), udp_weak.upgrade()) else {
        return;
    };
    // A Both-classified tag has no single channel; relay it reliably.
    let channel = tcp
        .table()
        .reliability_for_send(frame.tag(), None)
        .unwrap_or(Reliability::Reliable);
    let result = match channel {
        Reliability::Unreliable => udp.relay_except(frame.clone(), Some(from)),
        Reliability::Reliable | Reliability::Both => {
            tcp.relay_except(frame.clone(), Some(from))
        }
    };
    if let Err(err) = result {
        warn!(player = from, %err, "inbound relay failed");
    }
}
