//! Incremental frame extraction from a byte stream.

use bitstream::{BitError, BitReader};
use codec::CodecError;
use wire::{read_frame, Frame, PacketTable, WireError};

/// Accumulates received bytes and yields complete frames.
///
/// TCP delivers arbitrary fragments, so a frame may arrive split across
/// several reads. The cursor only advances when a whole frame decodes;
/// running out of buffered bits is not an error, it just means "wait for
/// more bytes".
#[derive(Debug, Default)]
pub struct InboundBuffer {
    bytes: Vec<u8>,
    bit_pos: usize,
}

impl InboundBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly received bytes.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Attempts to decode the next frame.
    ///
    /// Returns `Ok(None)` when the buffer holds only a partial frame; the
    /// cursor is left where it was so the next attempt retries from the
    /// frame boundary. A batch sentinel realigns the cursor to the next
    /// byte before it is returned.
    pub fn try_read_frame(&mut self, table: &PacketTable) -> Result<Option<Frame>, WireError> {
        let mut reader = BitReader::new(&self.bytes);
        reader.set_position(self.bit_pos)?;
        match read_frame(table, &mut reader) {
            Ok(frame) => {
                if matches!(frame, Frame::BatchEnd) {
                    reader.align_to_byte();
                }
                self.bit_pos = reader.bit_position();
                Ok(Some(frame))
            }
            Err(WireError::Codec(CodecError::Bits(BitError::EndOfBuffer { .. }))) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Byte-aligns the cursor and drops the consumed prefix.
    ///
    /// The recovery primitive for a known batch boundary: whatever is
    /// left of the current byte is garbage and the next frame starts on
    /// the following byte.
    pub fn reset(&mut self) {
        if self.bit_pos % 8 != 0 {
            self.bit_pos += 8 - self.bit_pos % 8;
        }
        self.compact();
    }

    /// Drops fully consumed bytes so the buffer does not grow without
    /// bound on long-lived connections.
    pub fn compact(&mut self) {
        let consumed = self.bit_pos / 8;
        if consumed > 0 {
            self.bytes.drain(..consumed);
            self.bit_pos -= consumed * 8;
        }
    }

    /// Bits currently buffered but not yet consumed.
    #[must_use]
    pub fn bits_pending(&self) -> usize {
        self.bytes.len() * 8 - self.bit_pos
    }
}
