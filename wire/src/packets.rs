//! Internal protocol packet bodies.
//!
//! These are the hand-written equivalents of generated glue: each struct
//! encodes field by field in declaration order with the same bit layout the
//! schema walk would produce.

use bitstream::{BitReader, BitWriter};
use codec::{CodecResult, PacketBody};

use crate::tag::PLAYER_ID_BITS;

/// Peer-to-host join request (reliable channel only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectPacket {
    /// The UDP port the joining peer listens on.
    pub udp_port: i32,
    /// Display name announced to the roster.
    pub username: String,
}

impl PacketBody for ConnectPacket {
    fn encode(&self, writer: &mut BitWriter) -> CodecResult<()> {
        writer.write_int(self.udp_port, 32)?;
        writer.write_var_string(&self.username);
        Ok(())
    }

    fn decode(reader: &mut BitReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            udp_port: reader.read_int(32)?,
            username: reader.read_var_string()?,
        })
    }
}

/// Host-to-peer player ID assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRelayPacket {
    /// The assigned 12-bit player ID.
    pub player_id: u16,
}

impl PacketBody for IdRelayPacket {
    fn encode(&self, writer: &mut BitWriter) -> CodecResult<()> {
        writer.write_uint(u32::from(self.player_id), PLAYER_ID_BITS)?;
        Ok(())
    }

    fn decode(reader: &mut BitReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            player_id: reader.read_uint(PLAYER_ID_BITS)? as u16,
        })
    }
}

/// Host-to-peer roster announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConnectedPacket {
    /// The announced player's 12-bit ID.
    pub player_id: u16,
    /// The announced player's display name.
    pub username: String,
}

impl PacketBody for PlayerConnectedPacket {
    fn encode(&self, writer: &mut BitWriter) -> CodecResult<()> {
        writer.write_uint(u32::from(self.player_id), PLAYER_ID_BITS)?;
        writer.write_var_string(&self.username);
        Ok(())
    }

    fn decode(reader: &mut BitReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            player_id: reader.read_uint(PLAYER_ID_BITS)? as u16,
            username: reader.read_var_string()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: PacketBody + PartialEq + std::fmt::Debug>(body: &T) -> T {
        let mut writer = BitWriter::new();
        body.encode(&mut writer).unwrap();
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);
        T::decode(&mut reader).unwrap()
    }

    #[test]
    fn connect_roundtrip() {
        let packet = ConnectPacket {
            udp_port: 5000,
            username: "bob".into(),
        };
        assert_eq!(roundtrip(&packet), packet);
    }

    #[test]
    fn id_relay_uses_twelve_bits() {
        let packet = IdRelayPacket { player_id: 0xFFF };
        let mut writer = BitWriter::new();
        packet.encode(&mut writer).unwrap();
        assert_eq!(writer.bits_written(), 12);
        assert_eq!(roundtrip(&packet), packet);
    }

    #[test]
    fn player_connected_roundtrip() {
        let packet = PlayerConnectedPacket {
            player_id: 3,
            username: "alice".into(),
        };
        assert_eq!(roundtrip(&packet), packet);
    }
}
