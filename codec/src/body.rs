//! Statically typed packet bodies.

use bitstream::{BitReader, BitWriter};

use crate::error::CodecResult;

/// A concrete type with a hand-written (or generated) wire encoding.
///
/// This is the contract the dynamic [`encode_value`](crate::encode_value) /
/// [`decode_value`](crate::decode_value) walk also satisfies: pure functions
/// over the cursor with no other side effects. Internal protocol packets and
/// application packet structs implement it directly when the dynamic value
/// model is unnecessary overhead.
pub trait PacketBody: Sized {
    /// Writes the body's bits.
    fn encode(&self, writer: &mut BitWriter) -> CodecResult<()>;

    /// Reads a body back from the cursor.
    fn decode(reader: &mut BitReader<'_>) -> CodecResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecResult;

    struct Ping {
        sequence: u32,
    }

    impl PacketBody for Ping {
        fn encode(&self, writer: &mut BitWriter) -> CodecResult<()> {
            writer.write_uint(self.sequence, 32)?;
            Ok(())
        }

        fn decode(reader: &mut BitReader<'_>) -> CodecResult<Self> {
            Ok(Self {
                sequence: reader.read_uint(32)?,
            })
        }
    }

    #[test]
    fn hand_written_body_roundtrip() {
        let mut writer = BitWriter::new();
        Ping { sequence: 7 }.encode(&mut writer).unwrap();
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);
        let ping = Ping::decode(&mut reader).unwrap();
        assert_eq!(ping.sequence, 7);
    }
}
