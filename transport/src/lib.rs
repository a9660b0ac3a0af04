//! Socket transports for the bitlink protocol.
//!
//! Two channels carry the same framed format:
//! - [`TcpServer`]/[`TcpClient`]: ordered, reliable streams with
//!   incremental frame extraction across fragmented reads
//! - [`UdpServer`]/[`UdpClient`]: best-effort datagrams, one
//!   self-contained batch per datagram
//!
//! Outbound frames queue as deferred actions and accumulate bit-packed per
//! connection; an explicit `flush` seals each pending batch with the
//! sentinel and hands it to the socket. Inbound frames dispatch through a
//! shared [`HandlerRegistry`] on the receiving task.

mod allocator;
mod batch;
mod config;
mod error;
mod handlers;
mod inbound;
mod queue;
mod tcp;
mod udp;

pub use allocator::PlayerAllocator;
pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use handlers::HandlerRegistry;
pub use inbound::InboundBuffer;
pub use queue::ActionQueue;
pub use tcp::{TcpClient, TcpServer};
pub use udp::{UdpClient, UdpServer};

/// Session-scoped player identifier, carried in 12-bit wire fields.
pub type PlayerId = u16;

/// The hosting endpoint's fixed player ID.
pub const HOST_PLAYER_ID: PlayerId = 1;

/// First ID handed to a remote connection.
pub const FIRST_REMOTE_PLAYER_ID: PlayerId = 2;

/// Largest ID that fits the wire field.
pub const MAX_PLAYER_ID: PlayerId = (1 << wire::PLAYER_ID_BITS) - 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_id_bounds() {
        assert_eq!(HOST_PLAYER_ID, 1);
        assert_eq!(FIRST_REMOTE_PLAYER_ID, 2);
        assert_eq!(MAX_PLAYER_ID, 4095);
    }
}
