//! Bit-level reader with bounded operations.

use crate::error::{BitError, BitResult};

/// A bit-level reader for decoding packed binary data.
///
/// Bits are consumed least-significant-first, mirroring
/// [`BitWriter`](crate::BitWriter). All read operations are bounds-checked
/// and return errors on failure; the reader never panics on malformed input.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` from a byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Returns the number of bits remaining to read.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.data
            .len()
            .saturating_mul(8)
            .saturating_sub(self.bit_pos)
    }

    /// Returns `true` if there are no more bits to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Returns the current bit position.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Moves the cursor to an absolute bit position.
    ///
    /// Used to rewind after a partial decode attempt.
    pub fn set_position(&mut self, bit_pos: usize) -> BitResult<()> {
        let total = self.data.len() * 8;
        if bit_pos > total {
            return Err(BitError::EndOfBuffer {
                requested: bit_pos,
                available: total,
            });
        }
        self.bit_pos = bit_pos;
        Ok(())
    }

    /// Discards the remainder of the current byte, if any.
    ///
    /// This is the resynchronization primitive invoked at batch boundaries:
    /// whatever partial bits follow the sentinel are dropped so the next
    /// read starts byte-aligned.
    pub fn align_to_byte(&mut self) {
        let rem = self.bit_pos % 8;
        if rem != 0 {
            self.bit_pos += 8 - rem;
        }
    }

    /// Reads a single bit as 0 or 1.
    pub fn read_bit(&mut self) -> BitResult<u8> {
        if self.bits_remaining() == 0 {
            return Err(BitError::EndOfBuffer {
                requested: 1,
                available: 0,
            });
        }
        let byte_idx = self.bit_pos / 8;
        let bit_idx = self.bit_pos % 8;
        let bit = (self.data[byte_idx] >> bit_idx) & 1;
        self.bit_pos += 1;
        Ok(bit)
    }

    /// Reads a single bit as a boolean.
    pub fn read_bool(&mut self) -> BitResult<bool> {
        Ok(self.read_bit()? == 1)
    }

    /// Reads `count` bits into `ceil(count / 8)` bytes.
    ///
    /// Bit `i` of the logical value lands at bit `i % 8` of output byte
    /// `i / 8`.
    pub fn read_bits(&mut self, count: usize) -> BitResult<Vec<u8>> {
        self.ensure_bits(count)?;
        let mut out = vec![0u8; count.div_ceil(8)];
        for i in 0..count {
            out[i / 8] |= self.read_bit()? << (i % 8);
        }
        Ok(out)
    }

    /// Reads 8 bits as a byte.
    pub fn read_byte(&mut self) -> BitResult<u8> {
        self.ensure_bits(8)?;
        if self.bit_pos % 8 == 0 {
            let value = self.data[self.bit_pos / 8];
            self.bit_pos += 8;
            return Ok(value);
        }
        let mut value = 0u8;
        for i in 0..8 {
            value |= self.read_bit()? << i;
        }
        Ok(value)
    }

    /// Reads `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> BitResult<Vec<u8>> {
        self.ensure_bits(count * 8)?;
        if self.bit_pos % 8 == 0 {
            let idx = self.bit_pos / 8;
            self.bit_pos += count * 8;
            return Ok(self.data[idx..idx + count].to_vec());
        }
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.read_byte()?);
        }
        Ok(out)
    }

    /// Reads `bits` bits as an unsigned 32-bit integer, LSB first.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits` is 0 or exceeds 32.
    pub fn read_uint(&mut self, bits: u32) -> BitResult<u32> {
        check_width(bits, 32)?;
        self.ensure_bits(bits as usize)?;
        let mut value = 0u32;
        for i in 0..bits {
            value |= u32::from(self.read_bit()?) << i;
        }
        Ok(value)
    }

    /// Reads `bits` bits as an unsigned 64-bit integer, LSB first.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits` is 0 or exceeds 64.
    pub fn read_ulong(&mut self, bits: u32) -> BitResult<u64> {
        check_width(bits, 64)?;
        self.ensure_bits(bits as usize)?;
        let mut value = 0u64;
        for i in 0..bits {
            value |= u64::from(self.read_bit()?) << i;
        }
        Ok(value)
    }

    /// Reads a signed 32-bit integer written in `bits` bits.
    ///
    /// One sign bit, then `bits - 1` magnitude bits; when the sign bit is
    /// set, every bit from the magnitude width up to bit 31 is set to
    /// reconstruct the two's-complement value.
    pub fn read_int(&mut self, bits: u32) -> BitResult<i32> {
        check_width(bits, 32)?;
        self.ensure_bits(bits as usize)?;
        let sign = self.read_bit()?;
        let mut raw = 0u32;
        for i in 0..bits - 1 {
            raw |= u32::from(self.read_bit()?) << i;
        }
        if sign == 1 {
            for i in bits - 1..32 {
                raw |= 1 << i;
            }
        }
        Ok(raw as i32)
    }

    /// Reads a signed 64-bit integer written in `bits` bits.
    ///
    /// Sign extension covers the full 64-bit width of the target type.
    pub fn read_long(&mut self, bits: u32) -> BitResult<i64> {
        check_width(bits, 64)?;
        self.ensure_bits(bits as usize)?;
        let sign = self.read_bit()?;
        let mut raw = 0u64;
        for i in 0..bits - 1 {
            raw |= u64::from(self.read_bit()?) << i;
        }
        if sign == 1 {
            for i in bits - 1..64 {
                raw |= 1 << i;
            }
        }
        Ok(raw as i64)
    }

    /// Reads 32 raw bits and reinterprets them as an IEEE-754 float.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::UnsupportedFloatWidth`] for any `bits` other
    /// than 32.
    pub fn read_float(&mut self, bits: u32) -> BitResult<f32> {
        if bits != 32 {
            return Err(BitError::UnsupportedFloatWidth { bits });
        }
        Ok(f32::from_bits(self.read_uint(32)?))
    }

    /// Reads `length` bytes and decodes them as strict UTF-8.
    ///
    /// Malformed sequences fail with [`BitError::InvalidUtf8`]; there is no
    /// replacement-character fallback.
    pub fn read_string(&mut self, length: usize) -> BitResult<String> {
        let bytes = self.read_bytes(length)?;
        String::from_utf8(bytes).map_err(|_| BitError::InvalidUtf8)
    }

    /// Reads a 7-bit-encoded length prefix, then that many UTF-8 bytes.
    pub fn read_var_string(&mut self) -> BitResult<String> {
        let length = self.read_var_uint()?;
        self.read_string(length as usize)
    }

    /// Reads a 7-bit-encoded variable-length unsigned integer.
    ///
    /// Rejects prefixes longer than 5 bytes (the maximum for a `u32`).
    pub fn read_var_uint(&mut self) -> BitResult<u32> {
        let mut result = 0u32;
        for shift in (0..35).step_by(7) {
            let byte = self.read_byte()?;
            result |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(BitError::InvalidVarint)
    }

    fn ensure_bits(&self, bits: usize) -> BitResult<()> {
        let available = self.bits_remaining();
        if bits > available {
            return Err(BitError::EndOfBuffer {
                requested: bits,
                available,
            });
        }
        Ok(())
    }
}

fn check_width(bits: u32, max_bits: u32) -> BitResult<()> {
    if bits == 0 || bits > max_bits {
        return Err(BitError::InvalidBitCount { bits, max_bits });
    }
    Ok(())
}
