//! Transport-level errors.

use wire::WireError;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur at the socket and framing boundary.
///
/// All of these are fatal to the connection they occur on and never
/// propagate into application handler code; the read loop converts them
/// into a connection-closed notification.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("socket failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("inbound frame failed to decode: {0}")]
    Decode(#[from] WireError),

    #[error("connection is closed")]
    Closed,

    #[error("no data received within the read timeout")]
    Timeout,

    #[error("player {0} has no bound connection")]
    UnknownPlayer(u16),
}
