//! Packet tags and reliability classes.

/// Number of bits in a player ID field.
pub const PLAYER_ID_BITS: u32 = 12;

/// The tag value prefixed to every framed packet.
///
/// Tags below [`PacketTag::FIRST_APP`] are reserved for the internal
/// protocol; application types register from [`PacketTag::FIRST_APP`]
/// upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketTag(pub u16);

impl PacketTag {
    /// Appended after the last packet of a batch; triggers a reader reset
    /// instead of delivery.
    pub const BATCH_END: Self = Self(0);
    /// Host-to-peer player ID assignment.
    pub const ID_RELAY: Self = Self(1);
    /// Peer-to-host join request carrying UDP port and username.
    pub const CONNECT: Self = Self(2);
    /// Orderly teardown notice, no payload.
    pub const DISCONNECT: Self = Self(3);
    /// Host-to-peer roster announcement.
    pub const PLAYER_CONNECTED: Self = Self(4);
    /// First tag available to application packet types.
    pub const FIRST_APP: Self = Self(5);

    /// Returns `true` for tags reserved by the internal protocol.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.0 < Self::FIRST_APP.0
    }
}

/// Which channel a packet type travels on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reliability {
    /// Ordered delivery over the stream transport.
    Reliable,
    /// Best-effort delivery over the datagram transport.
    Unreliable,
    /// Legal on either channel; every send must pick one explicitly.
    Both,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_tags_are_contiguous() {
        assert_eq!(PacketTag::BATCH_END.0, 0);
        assert_eq!(PacketTag::ID_RELAY.0, 1);
        assert_eq!(PacketTag::CONNECT.0, 2);
        assert_eq!(PacketTag::DISCONNECT.0, 3);
        assert_eq!(PacketTag::PLAYER_CONNECTED.0, 4);
        assert_eq!(PacketTag::FIRST_APP.0, 5);
    }

    #[test]
    fn reserved_predicate() {
        assert!(PacketTag::BATCH_END.is_reserved());
        assert!(PacketTag::PLAYER_CONNECTED.is_reserved());
        assert!(!PacketTag::FIRST_APP.is_reserved());
        assert!(!PacketTag(100).is_reserved());
    }
}
