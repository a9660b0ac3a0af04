//! Tag-prefixed frame read/write.

use bitstream::{BitReader, BitWriter};
use codec::{decode_value, encode_value, PacketBody, Value};

use crate::error::{WireError, WireResult};
use crate::packets::{ConnectPacket, IdRelayPacket, PlayerConnectedPacket};
use crate::table::PacketTable;
use crate::tag::PacketTag;

/// One decoded unit of the framed stream.
///
/// `Unknown` carries a syntactically valid tag with no registered schema.
/// The body cannot be skipped without one, so the caller drops the frame
/// and relies on the next batch sentinel to restore alignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    App { tag: PacketTag, value: Value },
    Connect(ConnectPacket),
    IdRelay(IdRelayPacket),
    PlayerConnected(PlayerConnectedPacket),
    Disconnect,
    BatchEnd,
    Unknown { tag: PacketTag },
}

impl Frame {
    /// The tag this frame travels under.
    #[must_use]
    pub const fn tag(&self) -> PacketTag {
        match self {
            Self::App { tag, .. } | Self::Unknown { tag } => *tag,
            Self::Connect(_) => PacketTag::CONNECT,
            Self::IdRelay(_) => PacketTag::ID_RELAY,
            Self::PlayerConnected(_) => PacketTag::PLAYER_CONNECTED,
            Self::Disconnect => PacketTag::DISCONNECT,
            Self::BatchEnd => PacketTag::BATCH_END,
        }
    }
}

/// Writes just the tag at the table's configured width.
pub fn write_tag(table: &PacketTable, writer: &mut BitWriter, tag: PacketTag) -> WireResult<()> {
    writer.write_uint(u32::from(tag.0), table.tag_bits())?;
    Ok(())
}

/// Writes an application frame: tag, then the schema-encoded body.
pub fn write_app_frame(
    table: &PacketTable,
    writer: &mut BitWriter,
    tag: PacketTag,
    value: &Value,
) -> WireResult<()> {
    let Some(schema) = table.schema(tag) else {
        return Err(WireError::UnknownTag { tag });
    };
    write_tag(table, writer, tag)?;
    encode_value(schema, value, writer)?;
    Ok(())
}

/// Writes any frame variant.
pub fn write_frame(table: &PacketTable, writer: &mut BitWriter, frame: &Frame) -> WireResult<()> {
    match frame {
        Frame::App { tag, value } => write_app_frame(table, writer, *tag, value),
        Frame::Connect(body) => {
            write_tag(table, writer, PacketTag::CONNECT)?;
            body.encode(writer)?;
            Ok(())
        }
        Frame::IdRelay(body) => {
            write_tag(table, writer, PacketTag::ID_RELAY)?;
            body.encode(writer)?;
            Ok(())
        }
        Frame::PlayerConnected(body) => {
            write_tag(table, writer, PacketTag::PLAYER_CONNECTED)?;
            body.encode(writer)?;
            Ok(())
        }
        Frame::Disconnect => write_tag(table, writer, PacketTag::DISCONNECT),
        Frame::BatchEnd => write_tag(table, writer, PacketTag::BATCH_END),
        Frame::Unknown { tag } => Err(WireError::UnknownTag { tag: *tag }),
    }
}

/// Reads the next frame: tag first, then the matching body.
pub fn read_frame(table: &PacketTable, reader: &mut BitReader<'_>) -> WireResult<Frame> {
    let tag = PacketTag(reader.read_uint(table.tag_bits())? as u16);
    match tag {
        PacketTag::BATCH_END => Ok(Frame::BatchEnd),
        PacketTag::ID_RELAY => Ok(Frame::IdRelay(IdRelayPacket::decode(reader)?)),
        PacketTag::CONNECT => Ok(Frame::Connect(ConnectPacket::decode(reader)?)),
        PacketTag::DISCONNECT => Ok(Frame::Disconnect),
        PacketTag::PLAYER_CONNECTED => {
            Ok(Frame::PlayerConnected(PlayerConnectedPacket::decode(reader)?))
        }
        tag => match table.schema(tag) {
            Some(schema) => Ok(Frame::App {
                tag,
                value: decode_value(schema, reader)?,
            }),
            None => Ok(Frame::Unknown { tag }),
        },
    }
}
