//! Packet framing and reliability classification for the bitlink protocol.
//!
//! Every packet on the wire is a tag followed by a body whose layout only
//! the registered schema knows. This crate owns:
//! - [`PacketTag`] values and the reserved internal tag space
//! - [`PacketTable`], the per-process tag registry with
//!   [`Reliability`] classification
//! - The internal handshake packet bodies
//! - [`read_frame`]/[`write_frame`] over a bit cursor
//!
//! The batch-end sentinel ([`PacketTag::BATCH_END`]) frames flush
//! boundaries: readers realign their bit cursor on it instead of
//! delivering it.

mod error;
mod frame;
mod packets;
mod table;
mod tag;

pub use error::{WireError, WireResult};
pub use frame::{read_frame, write_app_frame, write_frame, write_tag, Frame};
pub use packets::{ConnectPacket, IdRelayPacket, PlayerConnectedPacket};
pub use table::{PacketEntry, PacketTable, PacketTableBuilder};
pub use tag::{PacketTag, Reliability, PLAYER_ID_BITS};
