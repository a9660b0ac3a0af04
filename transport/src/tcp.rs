//! Stream transport: ordered, reliable delivery with batched flushes.
//!
//! The server accepts connections and assigns each one a player ID. Every
//! connection gets a reader task and a writer task; outbound frames
//! accumulate bit-packed in a per-connection [`BitWriter`] and go out as
//! one contiguous batch, terminated by the batch sentinel, when
//! [`TcpServer::flush`] runs.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bitstream::BitWriter;
use parking_lot::{Mutex, RwLock};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, error, warn};
use wire::{write_frame, Frame, PacketTable};

use crate::allocator::PlayerAllocator;
use crate::batch::{encode_pending, seal_batch, validate_frame};
use crate::config::TransportConfig;
use crate::error::{TransportError, TransportResult};
use crate::handlers::HandlerRegistry;
use crate::inbound::InboundBuffer;
use crate::queue::ActionQueue;
use crate::PlayerId;

type ConnectionCallback = Arc<dyn Fn(PlayerId) + Send + Sync>;

struct Connection {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    writer: Arc<Mutex<BitWriter>>,
    addr: SocketAddr,
}

struct ServerShared {
    table: PacketTable,
    queue: ActionQueue,
    handlers: HandlerRegistry,
    config: TransportConfig,
    connections: RwLock<HashMap<PlayerId, Connection>>,
    allocator: PlayerAllocator,
    on_connect: RwLock<Vec<ConnectionCallback>>,
    on_disconnect: RwLock<Vec<ConnectionCallback>>,
}

impl ServerShared {
    fn drop_connection(&self, player: PlayerId) {
        if self.connections.write().remove(&player).is_none() {
            return;
        }
        debug!(player, "connection closed");
        let callbacks = self.on_disconnect.read().clone();
        for callback in &callbacks {
            callback(player);
        }
    }
}

/// Accepting side of the stream transport.
pub struct TcpServer {
    shared: Arc<ServerShared>,
    shutdown: watch::Sender<bool>,
    local_addr: SocketAddr,
}

impl TcpServer {
    /// Binds a listener and starts accepting connections.
    ///
    /// Player IDs are assigned from
    /// [`FIRST_REMOTE_PLAYER_ID`](crate::FIRST_REMOTE_PLAYER_ID) upward and
    /// never reused; a connection arriving after the ID space is exhausted
    /// is refused.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when the listener cannot bind.
    pub async fn bind(
        addr: SocketAddr,
        table: PacketTable,
        queue: ActionQueue,
        handlers: HandlerRegistry,
        config: TransportConfig,
    ) -> TransportResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let shared = Arc::new(ServerShared {
            table,
            queue,
            handlers,
            config,
            connections: RwLock::new(HashMap::new()),
            allocator: PlayerAllocator::new(),
            on_connect: RwLock::new(Vec::new()),
            on_disconnect: RwLock::new(Vec::new()),
        });
        let (shutdown, shutdown_rx) = watch::channel(false);
        tokio::spawn(run_accept_loop(listener, Arc::clone(&shared), shutdown_rx));
        debug!(%local_addr, "stream server listening");
        Ok(Self {
            shared,
            shutdown,
            local_addr,
        })
    }

    /// The address the listener actually bound, useful with port 0.
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

    /// Connected player IDs in no particular order.
    #[must_use]
    pub fn players(&self) -> Vec<PlayerId> {
        self.shared.connections.read().keys().copied().collect()
    }

    /// Remote address of a connected player.
    #[must_use]
    pub fn peer_addr(&self, player: PlayerId) -> Option<SocketAddr> {
        self.shared
            .connections
            .read()
            .get(&player)
            .map(|conn| conn.addr)
    }

    /// Registers a callback invoked when a connection is accepted.
    pub fn on_connect(&self, callback: impl Fn(PlayerId) + Send + Sync + 'static) {
        self.shared.on_connect.write().push(Arc::new(callback));
    }

    /// Registers a callback invoked when a connection goes away.
    pub fn on_disconnect(&self, callback: impl Fn(PlayerId) + Send + Sync + 'static) {
        self.shared.on_disconnect.write().push(Arc::new(callback));
    }

    /// Queues a frame for one player's next batch.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Decode`] when the frame does not fit the
    /// registered schema, and [`TransportError::UnknownPlayer`] when the
    /// player has no live connection.
    pub fn send_to(&self, player: PlayerId, frame: Frame) -> TransportResult<()> {
        validate_frame(&self.shared.table, &frame)?;
        if !self.shared.connections.read().contains_key(&player) {
            return Err(TransportError::UnknownPlayer(player));
        }
        let shared = Arc::clone(&self.shared);
        self.shared.queue.push(move || {
            let writer = {
                let connections = shared.connections.read();
                match connections.get(&player) {
                    Some(conn) => Arc::clone(&conn.writer),
                    // Disconnected between send and flush; nothing to do.
                    None => return,
                }
            };
            encode_pending(&shared.table, &writer, &frame);
        });
        Ok(())
    }

    /// Queues a frame for every connected player.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Decode`] when the frame does not fit the
    /// registered schema.
    pub fn relay_all(&self, frame: Frame) -> TransportResult<()> {
        self.relay_except(frame, None)
    }

    /// Queues a frame for every connected player except `except`.
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
                let connections = shared.connections.read();
                connections
                    .iter()
                    .filter(|(player, _)| Some(**player) != except)
                    .map(|(_, conn)| Arc::clone(&conn.writer))
                    .collect()
            };
            for writer in &writers {
                encode_pending(&shared.table, writer, &frame);
            }
        });
        Ok(())
    }

    /// Drains queued sends and pushes every non-empty batch to its socket.
    ///
    /// Each dirty connection gets its pending bits terminated with the
    /// batch sentinel and handed to the writer task as one buffer.
    pub fn flush(&self) {
        self.shared.queue.drain();
        let connections = self.shared.connections.read();
        for conn in connections.values() {
            let mut writer = conn.writer.lock();
            if let Some(bytes) = seal_batch(&self.shared.table, &mut writer) {
                let _ = conn.outbound.send(bytes);
            }
        }
    }

    /// Sends an orderly disconnect to `player` and closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnknownPlayer`] when the player has no
    /// live connection.
    pub fn disconnect(&self, player: PlayerId) -> TransportResult<()> {
        self.shared.queue.drain();
        {
            let connections = self.shared.connections.read();
            let conn = connections
                .get(&player)
                .ok_or(TransportError::UnknownPlayer(player))?;
            let mut writer = conn.writer.lock();
            if let Err(err) = write_frame(&self.shared.table, &mut writer, &Frame::Disconnect) {
                error!(player, %err, "failed to encode disconnect notice");
            }
            if let Some(bytes) = seal_batch(&self.shared.table, &mut writer) {
                let _ = conn.outbound.send(bytes);
            }
        }
        self.shared.drop_connection(player);
        Ok(())
    }

    /// Stops accepting and tears down every connection.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Drop for TcpServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Connecting side of the stream transport.
pub struct TcpClient {
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
    closed: AtomicBool,
    on_disconnect: RwLock<Vec<ConnectionCallback>>,
}

impl TcpClient {
    /// Connects to a server and starts the read loop.
    ///
    /// Inbound frames dispatch with the host's player ID as their origin.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when the connection fails.
    pub async fn connect(
        addr: SocketAddr,
        table: PacketTable,
        queue: ActionQueue,
        handlers: HandlerRegistry,
        config: TransportConfig,
    ) -> TransportResult<Self> {
        let stream = TcpStream::connect(addr).await?;
        let _ = stream.set_nodelay(true);
        let local_addr = stream.local_addr()?;
        let (read_half, write_half) = stream.into_split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(ClientShared {
            table,
            queue,
            handlers,
            writer: Arc::new(Mutex::new(BitWriter::new())),
            outbound,
            closed: AtomicBool::new(false),
            on_disconnect: RwLock::new(Vec::new()),
        });
        let (shutdown, shutdown_rx) = watch::channel(false);
        tokio::spawn(run_writer(write_half, outbound_rx));
        tokio::spawn(run_client_reader(
            Arc::clone(&shared),
            read_half,
            shutdown_rx,
            config,
        ));
        Ok(Self {
            shared,
            shutdown,
            local_addr,
        })
    }

    /// The local address of the connected socket.
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

    /// Whether the connection has been torn down, locally or remotely.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Registers a callback invoked when the connection goes away.
    pub fn on_disconnect(&self, callback: impl Fn(PlayerId) + Send + Sync + 'static) {
        self.shared.on_disconnect.write().push(Arc::new(callback));
    }

    /// Queues a frame for the next batch to the server.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Decode`] when the frame does not fit the
    /// registered schema, and [`TransportError::Closed`] after teardown.
    pub fn send(&self, frame: Frame) -> TransportResult<()> {
        validate_frame(&self.shared.table, &frame)?;
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let shared = Arc::clone(&self.shared);
        self.shared.queue.push(move || {
            encode_pending(&shared.table, &shared.writer, &frame);
        });
        Ok(())
    }

    /// Drains queued sends and pushes the pending batch to the socket.
    pub fn flush(&self) {
        self.shared.queue.drain();
        let mut writer = self.shared.writer.lock();
        if let Some(bytes) = seal_batch(&self.shared.table, &mut writer) {
            let _ = self.shared.outbound.send(bytes);
        }
    }

    /// Sends an orderly disconnect and closes the connection.
    pub fn disconnect(&self) {
        self.shared.queue.drain();
        {
            let mut writer = self.shared.writer.lock();
            if let Err(err) = write_frame(&self.shared.table, &mut writer, &Frame::Disconnect) {
                error!(%err, "failed to encode disconnect notice");
            }
            if let Some(bytes) = seal_batch(&self.shared.table, &mut writer) {
                let _ = self.shared.outbound.send(bytes);
            }
        }
        self.shared.closed.store(true, Ordering::SeqCst);
        let _ = self.shutdown.send(true);
    }

    /// Closes the connection without the disconnect notice.
    pub fn shutdown(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        let _ = self.shutdown.send(true);
    }
}

impl Drop for TcpClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_accept_loop(
    listener: TcpListener,
    shared: Arc<ServerShared>,
    shutdown: watch::Receiver<bool>,
) {
    let mut shutdown_accept = shutdown.clone();
    loop {
        let accepted = tokio::select! {
            _ = shutdown_accept.changed() => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok((stream, addr)) => {
                let Some(player) = shared.allocator.allocate() else {
                    warn!(%addr, "player ID space exhausted, refusing connection");
                    continue;
                };
                accept_connection(&shared, player, stream, addr, shutdown.clone());
            }
            Err(err) => warn!(%err, "accept failed"),
        }
    }
}

fn accept_connection(
    shared: &Arc<ServerShared>,
    player: PlayerId,
    stream: TcpStream,
    addr: SocketAddr,
    shutdown: watch::Receiver<bool>,
) {
    let _ = stream.set_nodelay(true);
    let (read_half, write_half) = stream.into_split();
    let (outbound, outbound_rx) = mpsc::unbounded_channel();
    shared.connections.write().insert(
        player,
        Connection {
            outbound,
            writer: Arc::new(Mutex::new(BitWriter::new())),
            addr,
        },
    );
    debug!(player, %addr, "connection accepted");
    tokio::spawn(run_writer(write_half, outbound_rx));
    tokio::spawn(run_server_reader(
        Arc::clone(shared),
        player,
        read_half,
        shutdown,
    ));
    let callbacks = shared.on_connect.read().clone();
    for callback in &callbacks {
        callback(player);
    }
}

async fn run_writer(mut write_half: OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(bytes) = rx.recv().await {
        if write_half.write_all(&bytes).await.is_err() {
            break;
        }
    }
    let _ = write_half.shutdown().await;
}

async fn run_server_reader(
    shared: Arc<ServerShared>,
    player: PlayerId,
    read_half: OwnedReadHalf,
    shutdown: watch::Receiver<bool>,
) {
    read_loop(
        read_half,
        shutdown,
        shared.config.read_timeout,
        &shared.table,
        &shared.handlers,
        player,
    )
    .await;
    shared.drop_connection(player);
}

async fn run_client_reader(
    shared: Arc<ClientShared>,
    read_half: OwnedReadHalf,
    shutdown: watch::Receiver<bool>,
    config: TransportConfig,
) {
    read_loop(
        read_half,
        shutdown,
        config.read_timeout,
        &shared.table,
        &shared.handlers,
        crate::HOST_PLAYER_ID,
    )
    .await;
    shared.closed.store(true, Ordering::SeqCst);
    let callbacks = shared.on_disconnect.read().clone();
    for callback in &callbacks {
        callback(crate::HOST_PLAYER_ID);
    }
}

/// Core read loop shared by both ends.
///
/// Frames dispatch to handlers as they complete. Sentinels realign the
/// cursor silently, unknown tags are dropped with a note, a disconnect
/// notice still dispatches before the loop ends. Any decode error on a
/// recognized frame means the stream is unrecoverable.
async fn read_loop(
    mut read_half: OwnedReadHalf,
    mut shutdown: watch::Receiver<bool>,
    read_timeout: std::time::Duration,
    table: &PacketTable,
    handlers: &HandlerRegistry,
    from: PlayerId,
) {
    let mut inbound = InboundBuffer::new();
    let mut buf = vec![0u8; 4096];
    loop {
        let read = tokio::select! {
            _ = shutdown.changed() => break,
            read = timeout(read_timeout, read_half.read(&mut buf)) => read,
        };
        let received = match read {
            Err(_) => {
                warn!(player = from, "connection idle past the read timeout");
                break;
            }
            Ok(Err(err)) => {
                debug!(player = from, %err, "socket read failed");
                break;
            }
            Ok(Ok(0)) => break,
            Ok(Ok(received)) => received,
        };
        inbound.push_bytes(&buf[..received]);
        let mut fatal = false;
        loop {
            match inbound.try_read_frame(table) {
                Ok(None) => break,
                Ok(Some(Frame::BatchEnd)) => {}
                Ok(Some(Frame::Unknown { tag })) => {
                    debug!(player = from, tag = tag.0, "dropping unregistered packet");
                }
                Ok(Some(Frame::Disconnect)) => {
                    handlers.dispatch(&Frame::Disconnect, from);
                    fatal = true;
                    break;
                }
                Ok(Some(frame)) => handlers.dispatch(&frame, from),
                Err(err) => {
                    error!(player = from, %err, "inbound stream is corrupt");
                    fatal = true;
                    break;
                }
            }
        }
        inbound.compact();
        if fatal {
            break;
        }
    }
}
