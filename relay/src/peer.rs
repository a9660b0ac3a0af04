//! The joining endpoint.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::sync::Arc;

use codec::Value;
use parking_lot::Mutex;
use tracing::{info, warn};
use transport::{ActionQueue, HandlerRegistry, PlayerId, TcpClient, UdpClient};
use wire::{
    ConnectPacket, Frame, PacketTable, PacketTag, Reliability, WireError,
};

use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use crate::object_id::create_id;
use crate::roster::Roster;
use crate::sync::{EntityRegistry, Replicated};
use crate::Role;

struct PeerShared {
    username: String,
    // 0 until the host's ID assignment arrives.
    player_id: AtomicU16,
    roster: Mutex<Roster>,
    counter: AtomicU64,
}

/// Session peer: joins a host and routes everything through it.
pub struct PeerEndpoint {
    tcp: TcpClient,
    udp: UdpClient,
    handlers: HandlerRegistry,
    queue: ActionQueue,
    shared: Arc<PeerShared>,
    entities: Mutex<EntityRegistry>,
}

impl PeerEndpoint {
    /// Connects to a host on both channels and starts the join handshake.
    ///
    /// The handshake completes asynchronously; [`player_id`](Self::player_id)
    /// stays `None` until the host's assignment arrives.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Transport`] when either socket fails to
    /// connect.
    pub async fn connect(
        reliable_addr: SocketAddr,
        unreliable_addr: SocketAddr,
        table: PacketTable,
        config: RelayConfig,
    ) -> RelayResult<Self> {
        let queue = ActionQueue::new();
        let handlers = HandlerRegistry::new();
        let shared = Arc::new(PeerShared {
            username: config.username,
            player_id: AtomicU16::new(0),
            roster: Mutex::new(Roster::new()),
            counter: AtomicU64::new(0),
        });

        {
            let shared = Arc::clone(&shared);
            handlers.on(PacketTag::ID_RELAY, move |frame, _| {
                let Frame::IdRelay(packet) = frame else { return };
                shared.player_id.store(packet.player_id, Ordering::SeqCst);
                shared
                    .roster
                    .lock()
                    .insert(packet.player_id, shared.username.clone());
                info!(player = packet.player_id, "joined session");
            });
        }
        {
            let shared = Arc::clone(&shared);
            handlers.on(PacketTag::PLAYER_CONNECTED, move |frame, _| {
                let Frame::PlayerConnected(packet) = frame else { return };
                info!(player = packet.player_id, username = %packet.username, "roster update");
                shared
                    .roster
                    .lock()
                    .insert(packet.player_id, packet.username.clone());
            });
        }

        let udp = UdpClient::connect(
            unreliable_addr,
            table.clone(),
            queue.clone(),
            handlers.clone(),
        )
        .await?;
        let tcp = TcpClient::connect(
            reliable_addr,
            table,
            queue.clone(),
            handlers.clone(),
            config.transport,
        )
        .await?;

        // Join request goes out reliably, exactly once, before anything
        // else can be queued.
        tcp.send(Frame::Connect(ConnectPacket {
            udp_port: i32::from(udp.local_port()),
            username: shared.username.clone(),
        }))?;
        tcp.flush();

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
        Role::Peer
    }

    /// The host-assigned player ID, once the handshake completes.
    #[must_use]
    pub fn player_id(&self) -> Option<PlayerId> {
        match self.shared.player_id.load(Ordering::SeqCst) {
            0 => None,
            id => Some(id),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.shared.username
    }

    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    #[must_use]
    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    /// Whether the stream is up and an ID has been assigned.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.player_id().is_some() && !self.tcp.is_closed()
    }

    /// Everyone this peer knows about, in ascending ID order.
    #[must_use]
    pub fn players(&self) -> Vec<(PlayerId, String)> {
        self.shared.roster.lock().players()
    }

    /// Queues a packet to the host.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] when the tag is unregistered or its
    /// reliability is ambiguous, and [`RelayError::Transport`] when the
    /// value does not fit the schema or the stream is closed.
    pub fn send(
        &self,
        tag: PacketTag,
        value: Value,
        reliability: Option<Reliability>,
    ) -> RelayResult<()> {
        let channel = self.tcp.table().reliability_for_send(tag, reliability)?;
        let frame = Frame::App { tag, value };
        match channel {
            Reliability::Reliable => self.tcp.send(frame)?,
            Reliability::Unreliable => self.udp.send(frame)?,
            Reliability::Both => return Err(WireError::AmbiguousReliability { tag }.into()),
        }
        Ok(())
    }

    /// Queues a packet addressed to one player.
    ///
    /// A peer has no direct links, so the packet still travels through the
    /// host; the target is advisory and ignored here.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send).
    pub fn send_to(
        &self,
        _player: PlayerId,
        tag: PacketTag,
        value: Value,
        reliability: Option<Reliability>,
    ) -> RelayResult<()> {
        self.send(tag, value, reliability)
    }

    /// Queues a packet addressed to several players; travels through the
    /// host once.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send).
    pub fn send_to_many(
        &self,
        _players: &[PlayerId],
        tag: PacketTag,
        value: Value,
        reliability: Option<Reliability>,
    ) -> RelayResult<()> {
        self.send(tag, value, reliability)
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

    /// Mints a fresh object ID owned by this peer.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotConnected`] before the host has assigned
    /// an ID.
    pub fn next_object_id(&self) -> RelayResult<u64> {
        let player = self.player_id().ok_or(RelayError::NotConnected)?;
        let counter = self.shared.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(create_id(player, counter))
    }

    /// Adds an entity to the synchronization set.
    pub fn register_entity(&self, entity: Box<dyn Replicated>) {
        self.entities.lock().register(entity);
    }

    /// Removes an entity from the synchronization set.
    pub fn remove_entity(&self, object_id: u64) {
        self.entities.lock().remove(object_id);
    }

    /// Sends the state of every locally owned entity to the host.
    ///
    /// A no-op until the handshake completes, since ownership cannot be
    /// established without an ID.
    pub fn synchronize(&self) {
        let Some(player) = self.player_id() else { return };
        let mut entities = self.entities.lock();
        entities.synchronize(player, &mut |tag, value| {
            if let Err(err) = self.send(tag, value, None) {
                warn!(tag = tag.0, %err, "entity state packet dropped");
            }
        });
    }

    /// Sends an orderly disconnect and closes both channels.
    pub fn disconnect(&self) {
        self.tcp.disconnect();
        self.udp.shutdown();
    }
}
