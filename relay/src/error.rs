//! Relay-level errors.

use transport::TransportError;
use wire::WireError;

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("packet table misuse: {0}")]
    Config(#[from] WireError),

    #[error("endpoint has not completed the handshake")]
    NotConnected,
}
