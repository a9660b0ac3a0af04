//! Datagram transport: best-effort delivery, one batch per datagram.
//!
//! UDP has no accept step, so the server learns peers out of band: the
//! stream handshake tells it which player sits behind which address, and
//! [`UdpServer::bind_peer`] records the mapping. Datagrams from unbound
//! addresses are dropped.
//!
//! Every flush emits at most one datagram per dirty peer. A datagram is a
//! self-contained batch ending in the sentinel; loss or reordering costs
//! that batch and nothing else.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bitstream::{BitReader, BitWriter};
use parking_lot::{Mutex, RwLock};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};
use wire::{read_frame, Frame, PacketTable};

use crate::batch::{encode_pending, seal_batch, validate_frame};
use crate::error::{TransportError, TransportResult};
use crate::handlers::HandlerRegistry;
use crate::queue::ActionQueue;
use crate::{PlayerId, HOST_PLAYER_ID};

struct Peer {
    addr: SocketAddr,
    writer: Arc<Mutex<BitWriter>>,
}

#[derive(Default)]
struct PeerMap {
    by_player: HashMap<PlayerId, Peer>,
    by_addr: HashMap<SocketAddr, PlayerId>,
}

struct UdpShared {
    table: PacketTable,
    queue: ActionQueue,
    handlers: HandlerRegistry,
    peers: RwLock<PeerMap>,
    outbound: mpsc::UnboundedSender<(SocketAddr, Vec<u8>)>,
}

/// Host side of the datagram transport.
pub struct UdpServer {
    shared: Arc<UdpShared>,
    shutdown: watch::Sender<bool>,
    local_addr: SocketAddr,
}

impl UdpServer {
    /// Binds the socket and starts the receive loop.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when the socket cannot bind.
    pub async fn bind(
        addr: SocketAddr,
        table: PacketTable,
        queue: ActionQueue,
        handlers: HandlerRegistry,
    ) -> TransportResult<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        let local_addr = socket.local_addr()?;
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(UdpShared {
            table,
            queue,
            handlers,
            peers: RwLock::new(PeerMap::default()),
            outbound,
        });
        let (shutdown, shutdown_rx) = watch::channel(false);
        tokio::spawn(run_send_loop(Arc::clone(&socket), outbound_rx));
        tokio::spawn(run_recv_loop(socket, Arc::clone(&shared), shutdown_rx));
        debug!(%local_addr, "datagram server listening");
        Ok(Self {
            shared,
            shutdown,
            local_addr,
        })
    }

    /// The address the socket actually bound, useful with port 0.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    #[must_use]
    pub fn table(&self) -> &PacketTable {
        &self.shared.table
    }

    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.shared.handlers
    }

    #[must_use]
    pub fn queue(&self) -> &ActionQueue {
        &self.shared.queue
    }

    /// Associates a player with the address its datagrams come from.
    ///
    /// Rebinding an existing player replaces its address and drops any
    /// pending unsent batch.
    pub fn bind_peer(&self, player: PlayerId, addr: SocketAddr) {
        let mut peers = self.shared.peers.write();
        if let Some(old) = peers.by_player.remove(&player) {
            peers.by_addr.remove(&old.addr);
        }
        peers.by_addr.insert(addr, player);
        peers.by_player.insert(
            player,
            Peer {
                addr,
                writer: Arc::new(Mutex::new(BitWriter::new())),
            },
        );
        debug!(player, %addr, "peer bound");
    }

    /// Forgets a player's address binding.
    pub fn unbind_peer(&self, player: PlayerId) {
        let mut peers = self.shared.peers.write();
        if let Some(peer) = peers.by_player.remove(&player) {
            peers.by_addr.remove(&peer.addr);
            debug!(player, "peer unbound");
        }
    }

    /// The bound address for a player, if any.
    #[must_use]
    pub fn peer_addr(&self, player: PlayerId) -> Option<SocketAddr> {
        self.shared
            .peers
            .read()
            .by_player
            .get(&player)
            .map(|peer| peer.addr)
    }

    /// Queues a frame for one player's next datagram.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Decode`] when the frame does not fit the
    /// registered schema, and [`TransportError::UnknownPlayer`] when the
    /// player has no bound address.
    pub fn send_to(&self, player: PlayerId, frame: Frame) -> TransportResult<()> {
        validate_frame(&self.shared.table, &frame)?;
        if !self.shared.peers.read().by_player.contains_key(&player) {
            return Err(TransportError::UnknownPlayer(player));
        }
        let shared = Arc::clone(&self.shared);
        self.shared.queue.push(move || {
            let writer = {
                let peers = shared.peers.read();
                match peers.by_player.get(&player) {
                    Some(peer) => Arc::clone(&peer.writer),
                    None => return,
                }
            };
            encode_pending(&shared.table, &writer, &frame);
        });
        Ok(())
    }

    /// Queues a frame for every bound player.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Decode`] when the frame does not fit the
    /// registered schema.
    pub fn relay_all(&self, frame: Frame) -> TransportResult<()> {
        self.relay_except(frame, None)
    }

    /// Queues a frame for every bound player except `except`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Decode`] when the frame does not fit the
    /// registered schema.
    pub fn relay_except(&self, frame: Frame, except: Option<PlayerId>) -> TransportResult<()> {
        validate_frame(&self.shared.table, &frame)?;
        let shared = Arc::clone(&self.shared);
        self.shared.queue.push(move || {
            let writers: Vec<_> = {
                let peers = shared.peers.read();
                peers
                    .by_player
                    .iter()
                    .filter(|(player, _)| Some(**player) != except)
                    .map(|(_, peer)| Arc::clone(&peer.writer))
                    .collect()
            };
            for writer in &writers {
                encode_pending(&shared.table, writer, &frame);
            }
        });
        Ok(())
    }

    /// Drains queued sends and emits one datagram per dirty peer.
    pub fn flush(&self) {
        self.shared.queue.drain();
        let peers = self.shared.peers.read();
        for peer in peers.by_player.values() {
            let mut writer = peer.writer.lock();
            if let Some(bytes) = seal_batch(&self.shared.table, &mut writer) {
                let _ = self.shared.outbound.send((peer.addr, bytes));
            }
        }
    }

    /// Stops the receive loop.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Drop for UdpServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Peer side of the datagram transport.
pub struct UdpClient {
    shared: Arc<ClientShared>,
    shutdown: watch::Sender<bool>,
    local_addr: SocketAddr,
}

struct ClientShared {
    table: PacketTable,
    queue: ActionQueue,
    handlers: HandlerRegistry,
    writer: Arc<Mutex<BitWriter>>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
}

impl UdpClient {
    /// Binds an ephemeral local socket and connects it to the host.
    ///
    /// The local port is chosen by the OS; report it to the host through
    /// the stream handshake so the host can bind this peer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when the socket cannot bind or
    /// connect.
    pub async fn connect(
        remote: SocketAddr,
        table: PacketTable,
        queue: ActionQueue,
        handlers: HandlerRegistry,
    ) -> TransportResult<Self> {
        let bind_addr: SocketAddr = if remote.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = Arc::new(UdpSocket::bind(bind_addr).await?);
        socket.connect(remote).await?;
        let local_addr = socket.local_addr()?;
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(ClientShared {
            table,
            queue,
            handlers,
            writer: Arc::new(Mutex::new(BitWriter::new())),
            outbound,
        });
        let (shutdown, shutdown_rx) = watch::channel(false);
        tokio::spawn(run_client_send_loop(Arc::clone(&socket), outbound_rx));
        tokio::spawn(run_client_recv_loop(
            socket,
            Arc::clone(&shared),
            shutdown_rx,
        ));
        Ok(Self {
            shared,
            shutdown,
            local_addr,
        })
    }

    /// The local socket address; its port goes into the join request.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The OS-assigned local port.
    #[must_use]
    pub fn local_port(&self) -> u16 {
        self.local_addr.port()
    }

    #[must_use]
    pub fn table(&self) -> &PacketTable {
        &self.shared.table
    }

    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.shared.handlers
    }

    #[must_use]
    pub fn queue(&self) -> &ActionQueue {
        &self.shared.queue
    }

    /// Queues a frame for the next datagram to the host.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Decode`] when the frame does not fit the
    /// registered schema.
    pub fn send(&self, frame: Frame) -> TransportResult<()> {
        validate_frame(&self.shared.table, &frame)?;
        let shared = Arc::clone(&self.shared);
        self.shared.queue.push(move || {
            encode_pending(&shared.table, &shared.writer, &frame);
        });
        Ok(())
    }

    /// Drains queued sends and emits the pending batch as one datagram.
    pub fn flush(&self) {
        self.shared.queue.drain();
        let mut writer = self.shared.writer.lock();
        if let Some(bytes) = seal_batch(&self.shared.table, &mut writer) {
            let _ = self.shared.outbound.send(bytes);
        }
    }

    /// Stops the receive loop.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Drop for UdpClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Decodes one datagram and dispatches its frames.
///
/// A datagram is trusted to be a whole batch. An unregistered tag makes
/// the remainder undecodable, so the rest of the datagram is dropped; the
/// next datagram starts clean.
fn dispatch_datagram(
    table: &PacketTable,
    handlers: &HandlerRegistry,
    bytes: &[u8],
    from: PlayerId,
) {
    let mut reader = BitReader::new(bytes);
    while reader.bits_remaining() > 0 {
        match read_frame(table, &mut reader) {
            Ok(Frame::BatchEnd) => reader.align_to_byte(),
            Ok(Frame::Unknown { tag }) => {
                debug!(player = from, tag = tag.0, "dropping rest of datagram after unregistered packet");
                break;
            }
            Ok(frame) => handlers.dispatch(&frame, from),
            Err(err) => {
                debug!(player = from, %err, "dropping undecodable datagram tail");
                break;
            }
        }
    }
}

async fn run_send_loop(
    socket: Arc<UdpSocket>,
    mut rx: mpsc::UnboundedReceiver<(SocketAddr, Vec<u8>)>,
) {
    while let Some((addr, bytes)) = rx.recv().await {
        if let Err(err) = socket.send_to(&bytes, addr).await {
            warn!(%addr, %err, "datagram send failed");
        }
    }
}

async fn run_client_send_loop(socket: Arc<UdpSocket>, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(bytes) = rx.recv().await {
        if let Err(err) = socket.send(&bytes).await {
            warn!(%err, "datagram send failed");
        }
    }
}

async fn run_recv_loop(
    socket: Arc<UdpSocket>,
    shared: Arc<UdpShared>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let received = tokio::select! {
            _ = shutdown.changed() => break,
            received = socket.recv_from(&mut buf) => received,
        };
        match received {
            Ok((len, addr)) => {
                let player = shared.peers.read().by_addr.get(&addr).copied();
                match player {
                    Some(player) => {
                        dispatch_datagram(&shared.table, &shared.handlers, &buf[..len], player);
                    }
                    None => debug!(%addr, "dropping datagram from unbound address"),
                }
            }
            Err(err) => {
                warn!(%err, "datagram receive failed");
                break;
            }
        }
    }
}

async fn run_client_recv_loop(
    socket: Arc<UdpSocket>,
    shared: Arc<ClientShared>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let received = tokio::select! {
            _ = shutdown.changed() => break,
            received = socket.recv(&mut buf) => received,
        };
        match received {
            Ok(len) => {
                dispatch_datagram(&shared.table, &shared.handlers, &buf[..len], HOST_PLAYER_ID);
            }
            Err(err) => {
                warn!(%err, "datagram receive failed");
                break;
            }
        }
    }
}
