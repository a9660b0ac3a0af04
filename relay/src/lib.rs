//! Host-based relay layer over the bitlink transports.
//!
//! One endpoint hosts the session ([`HostEndpoint`]); everyone else joins
//! it ([`PeerEndpoint`]). Peers never talk to each other directly: a
//! packet for another peer goes to the host, which re-broadcasts it
//! according to the tag's [`RelayPolicy`].
//!
//! The join handshake runs over the reliable channel:
//! 1. the peer sends `Connect` with its username and datagram port,
//! 2. the host answers with `IdRelay` carrying the assigned player ID,
//! 3. the host replays the roster as `PlayerConnected` packets and binds
//!    the peer's datagram address,
//! 4. everyone else gets a single `PlayerConnected` announcement.
//!
//! Object IDs pack owner and counter into one `u64` so any endpoint can
//! mint them without coordination; the [`Replicated`] trait and per-tick
//! [`EntityRegistry::synchronize`] walk broadcast owned-entity state.

mod config;
mod error;
mod host;
mod object_id;
mod peer;
mod roster;
mod sync;

pub use config::RelayConfig;
pub use error::{RelayError, RelayResult};
pub use host::{HostEndpoint, RelayPolicy};
pub use object_id::{
    create_id, extract_object_id, extract_player_id, OBJECT_COUNTER_BITS, OBJECT_COUNTER_MASK,
};
pub use peer::PeerEndpoint;
pub use roster::Roster;
pub use sync::{EntityRegistry, Replicated};

/// Which side of the session an endpoint is, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Peer,
}
