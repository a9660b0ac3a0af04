//! Bit-level writer for encoding packed binary data.

use crate::error::{BitError, BitResult};

/// A bit-level writer for encoding packed binary data.
///
/// Bits are packed least-significant-first: bit `i` of a logical value lands
/// at bit position `i % 8` of output byte `i / 8`. Writes accumulate in an
/// internal buffer; call [`finish`](Self::finish) or [`drain`](Self::drain)
/// to get the padded byte buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// The accumulated complete bytes.
    bytes: Vec<u8>,
    /// Current byte being filled (not yet pushed to bytes).
    current_byte: u8,
    /// Number of bits written to `current_byte` (0-7).
    bit_count: u8,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `BitWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// Returns the number of bits written so far.
    #[must_use]
    pub fn bits_written(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }

    /// Writes a single bit. Any nonzero value writes a 1.
    pub fn write_bit(&mut self, bit: u8) {
        self.current_byte |= u8::from(bit != 0) << self.bit_count;
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// Writes the low bit of each element in order.
    pub fn write_bits(&mut self, bits: &[u8]) {
        for &bit in bits {
            self.write_bit(bit & 1);
        }
    }

    /// Writes a single bit from a boolean.
    pub fn write_bool(&mut self, value: bool) {
        self.write_bit(u8::from(value));
    }

    /// Writes all 8 bits of a byte, LSB first.
    pub fn write_byte(&mut self, value: u8) {
        if self.bit_count == 0 {
            self.bytes.push(value);
        } else {
            for i in 0..8 {
                self.write_bit((value >> i) & 1);
            }
        }
    }

    /// Writes a sequence of bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bit_count == 0 {
            self.bytes.extend_from_slice(bytes);
        } else {
            for &byte in bytes {
                self.write_byte(byte);
            }
        }
    }

    /// Writes the low `bits` bits of an unsigned 32-bit integer, LSB first.
    ///
    /// Values wider than `bits` are truncated to the low `bits` bits.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits` is 0 or exceeds 32.
    pub fn write_uint(&mut self, value: u32, bits: u32) -> BitResult<()> {
        check_width(bits, 32)?;
        for i in 0..bits {
            self.write_bit(((value >> i) & 1) as u8);
        }
        Ok(())
    }

    /// Writes the low `bits` bits of an unsigned 64-bit integer, LSB first.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits` is 0 or exceeds 64.
    pub fn write_ulong(&mut self, value: u64, bits: u32) -> BitResult<()> {
        check_width(bits, 64)?;
        for i in 0..bits {
            self.write_bit(((value >> i) & 1) as u8);
        }
        Ok(())
    }

    /// Writes a signed 32-bit integer in `bits` bits.
    ///
    /// The sign bit (bit 31 of the value) is written first, followed by the
    /// low `bits - 1` bits of the unsigned reinterpretation. The reader
    /// reconstructs the value by sign-extending above the magnitude width.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits` is 0 or exceeds 32.
    pub fn write_int(&mut self, value: i32, bits: u32) -> BitResult<()> {
        check_width(bits, 32)?;
        let raw = value as u32;
        self.write_bit((raw >> 31) as u8);
        for i in 0..bits - 1 {
            self.write_bit(((raw >> i) & 1) as u8);
        }
        Ok(())
    }

    /// Writes a signed 64-bit integer in `bits` bits.
    ///
    /// Symmetric with [`write_int`](Self::write_int): sign bit from bit 63
    /// first, then `bits - 1` magnitude bits.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits` is 0 or exceeds 64.
    pub fn write_long(&mut self, value: i64, bits: u32) -> BitResult<()> {
        check_width(bits, 64)?;
        let raw = value as u64;
        self.write_bit((raw >> 63) as u8);
        for i in 0..bits - 1 {
            self.write_bit(((raw >> i) & 1) as u8);
        }
        Ok(())
    }

    /// Writes an IEEE-754 single-precision float as its raw 32-bit pattern.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::UnsupportedFloatWidth`] for any `bits` other
    /// than 32. The format has no general float compressor.
    pub fn write_float(&mut self, value: f32, bits: u32) -> BitResult<()> {
        if bits != 32 {
            return Err(BitError::UnsupportedFloatWidth { bits });
        }
        self.write_uint(value.to_bits(), 32)
    }

    /// Writes the raw UTF-8 bytes of a string with no length prefix.
    ///
    /// The length must be known externally; pair with
    /// [`BitReader::read_string`](crate::BitReader::read_string).
    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    /// Writes a 7-bit-encoded length prefix followed by UTF-8 bytes.
    pub fn write_var_string(&mut self, value: &str) {
        let bytes = value.as_bytes();
        self.write_var_uint(bytes.len() as u32);
        self.write_bytes(bytes);
    }

    /// Writes a 7-bit-encoded variable-length unsigned integer.
    ///
    /// Classic scheme: 7 payload bits per byte, continuation bit in the
    /// high bit, least-significant group first.
    pub fn write_var_uint(&mut self, value: u32) {
        let mut remaining = value;
        loop {
            let mut byte = (remaining & 0x7F) as u8;
            remaining >>= 7;
            if remaining != 0 {
                byte |= 0x80;
            }
            self.write_byte(byte);
            if remaining == 0 {
                return;
            }
        }
    }

    /// Flushes any partially-filled byte, padding high bits with zero.
    ///
    /// A no-op when the cursor is already byte-aligned.
    pub fn flush(&mut self) {
        if self.bit_count > 0 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// Flushes and takes the accumulated bytes, leaving the writer reusable.
    #[must_use]
    pub fn drain(&mut self) -> Vec<u8> {
        self.flush();
        std::mem::take(&mut self.bytes)
    }

    /// Finishes writing and returns the byte buffer.
    ///
    /// If the last byte is incomplete, its high bits are padded with zeros.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.flush();
        self.bytes
    }

    /// Finishes writing and appends to the provided buffer.
    pub fn finish_into(mut self, buf: &mut Vec<u8>) {
        self.flush();
        buf.append(&mut self.bytes);
    }
}

fn check_width(bits: u32, max_bits: u32) -> BitResult<()> {
    if bits == 0 || bits > max_bits {
        return Err(BitError::InvalidBitCount { bits, max_bits });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_writer() {
        let writer = BitWriter::new();
        assert_eq!(writer.bits_written(), 0);
        let bytes = writer.finish();
        assert!(bytes.is_empty());
    }

    #[test]
    fn write_single_bit_one() {
        let mut writer = BitWriter::new();
        writer.write_bit(1);
        assert_eq!(writer.bits_written(), 1);
        let bytes = writer.finish();
        // First bit occupies the low position of the first byte.
        assert_eq!(bytes, vec![0b0000_0001]);
    }

    #[test]
    fn write_single_bit_zero() {
        let mut writer = BitWriter::new();
        writer.write_bit(0);
        let bytes = writer.finish();
        assert_eq!(bytes, vec![0b0000_0000]);
    }

    #[test]
    fn nonzero_bit_counts_as_one() {
        let mut writer = BitWriter::new();
        writer.write_bit(0xFF);
        let bytes = writer.finish();
        assert_eq!(bytes, vec![0b0000_0001]);
    }

    #[test]
    fn write_full_byte_of_bools() {
        let mut writer = BitWriter::new();
        for bit in [true, false, true, false, true, false, true, false] {
            writer.write_bool(bit);
        }
        assert_eq!(writer.bits_written(), 8);
        let bytes = writer.finish();
        // 1,0,1,0,1,0,1,0 from bit 0 upward = 0b0101_0101
        assert_eq!(bytes, vec![0b0101_0101]);
    }

    #[test]
    fn write_partial_byte_with_padding() {
        let mut writer = BitWriter::new();
        // Write 5 bits: 1,1,0,1,0 -> low bits 01011, padded high bits 0
        writer.write_bits(&[1, 1, 0, 1, 0]);
        let bytes = writer.finish();
        assert_eq!(bytes, vec![0b0000_1011]);
    }

    #[test]
    fn write_bits_uses_low_bit_only() {
        let mut writer = BitWriter::new();
        writer.write_bits(&[0x02, 0x03, 0xFE, 0xFF]);
        let bytes = writer.finish();
        // Low bits are 0,1,0,1
        assert_eq!(bytes, vec![0b0000_1010]);
    }

    #[test]
    fn write_uint_partial() {
        let mut writer = BitWriter::new();
        writer.write_uint(0b1010, 4).unwrap();
        assert_eq!(writer.bits_written(), 4);
        let bytes = writer.finish();
        assert_eq!(bytes, vec![0b0000_1010]);
    }

    #[test]
    fn write_uint_full_byte() {
        let mut writer = BitWriter::new();
        writer.write_uint(0xAB, 8).unwrap();
        let bytes = writer.finish();
        assert_eq!(bytes, vec![0xAB]);
    }

    #[test]
    fn write_uint_multiple_bytes_little_endian() {
        let mut writer = BitWriter::new();
        writer.write_uint(0xABCD, 16).unwrap();
        let bytes = writer.finish();
        // LSB-first packing emits the low byte first.
        assert_eq!(bytes, vec![0xCD, 0xAB]);
    }

    #[test]
    fn write_uint_across_byte_boundary() {
        let mut writer = BitWriter::new();
        writer.write_uint(0b1111, 4).unwrap();
        writer.write_uint(0b1010_1010, 8).unwrap();
        let bytes = writer.finish();
        // 1111 fills bits 0-3, then 10101010 spans bits 4-11.
        assert_eq!(bytes, vec![0b1010_1111, 0b0000_1010]);
    }

    #[test]
    fn write_uint_truncates_wide_values() {
        let mut writer = BitWriter::new();
        // 256 in 8 bits keeps only the low 8 bits.
        writer.write_uint(256, 8).unwrap();
        let bytes = writer.finish();
        assert_eq!(bytes, vec![0x00]);
    }

    #[test]
    fn write_uint_rejects_zero_width() {
        let mut writer = BitWriter::new();
        let result = writer.write_uint(0, 0);
        assert!(matches!(
            result,
            Err(BitError::InvalidBitCount {
                bits: 0,
                max_bits: 32
            })
        ));
    }

    #[test]
    fn write_uint_rejects_over_natural_width() {
        let mut writer = BitWriter::new();
        let result = writer.write_uint(0, 33);
        assert!(matches!(
            result,
            Err(BitError::InvalidBitCount {
                bits: 33,
                max_bits: 32
            })
        ));
    }

    #[test]
    fn write_ulong_64_bits() {
        let mut writer = BitWriter::new();
        writer.write_ulong(u64::MAX, 64).unwrap();
        let bytes = writer.finish();
        assert_eq!(bytes, vec![0xFF; 8]);
    }

    #[test]
    fn write_ulong_rejects_65() {
        let mut writer = BitWriter::new();
        let result = writer.write_ulong(0, 65);
        assert!(matches!(
            result,
            Err(BitError::InvalidBitCount {
                bits: 65,
                max_bits: 64
            })
        ));
    }

    #[test]
    fn write_int_negative_one_width_five() {
        let mut writer = BitWriter::new();
        writer.write_int(-1, 5).unwrap();
        let bytes = writer.finish();
        // Sign bit 1 at position 0, magnitude 1111 at positions 1-4.
        assert_eq!(bytes, vec![0b0001_1111]);
    }

    #[test]
    fn write_int_positive_width_five() {
        let mut writer = BitWriter::new();
        writer.write_int(15, 5).unwrap();
        let bytes = writer.finish();
        // Sign bit 0, then 1111.
        assert_eq!(bytes, vec![0b0001_1110]);
    }

    #[test]
    fn write_float_requires_32_bits() {
        let mut writer = BitWriter::new();
        let result = writer.write_float(1.5, 16);
        assert!(matches!(
            result,
            Err(BitError::UnsupportedFloatWidth { bits: 16 })
        ));
    }

    #[test]
    fn write_float_pattern() {
        let mut writer = BitWriter::new();
        writer.write_float(1.5, 32).unwrap();
        let bytes = writer.finish();
        // 1.5f = 0x3FC00000, low byte first.
        assert_eq!(bytes, vec![0x00, 0x00, 0xC0, 0x3F]);
    }

    #[test]
    fn write_byte_aligned_fast_path() {
        let mut writer = BitWriter::new();
        writer.write_byte(0xAB);
        writer.write_bytes(&[0xCD, 0xEF]);
        let bytes = writer.finish();
        assert_eq!(bytes, vec![0xAB, 0xCD, 0xEF]);
    }

    #[test]
    fn write_byte_unaligned() {
        let mut writer = BitWriter::new();
        writer.write_bit(1);
        writer.write_byte(0xFF);
        let bytes = writer.finish();
        // 1 + eight 1s = nine set bits from position 0.
        assert_eq!(bytes, vec![0xFF, 0x01]);
    }

    #[test]
    fn var_uint_byte_counts() {
        for (value, expected_len) in [(0u32, 1), (127, 1), (128, 2), (16384, 3)] {
            let mut writer = BitWriter::new();
            writer.write_var_uint(value);
            let bytes = writer.finish();
            assert_eq!(bytes.len(), expected_len, "byte count for {value}");
        }
    }

    #[test]
    fn var_uint_continuation_bits() {
        let mut writer = BitWriter::new();
        writer.write_var_uint(300);
        let bytes = writer.finish();
        assert_eq!(bytes, vec![0xAC, 0x02]);
    }

    #[test]
    fn flush_when_aligned_is_noop() {
        let mut writer = BitWriter::new();
        writer.write_byte(0xAA);
        writer.flush();
        writer.flush();
        let bytes = writer.finish();
        assert_eq!(bytes, vec![0xAA]);
    }

    #[test]
    fn flush_pads_partial_byte() {
        let mut writer = BitWriter::new();
        writer.write_bit(1);
        writer.flush();
        writer.write_bit(1);
        let bytes = writer.finish();
        // Each bit lands in its own byte because flush realigned the cursor.
        assert_eq!(bytes, vec![0x01, 0x01]);
    }

    #[test]
    fn drain_leaves_writer_reusable() {
        let mut writer = BitWriter::new();
        writer.write_byte(0x01);
        assert_eq!(writer.drain(), vec![0x01]);
        assert_eq!(writer.bits_written(), 0);
        writer.write_byte(0x02);
        assert_eq!(writer.drain(), vec![0x02]);
    }

    #[test]
    fn finish_into() {
        let mut writer = BitWriter::new();
        writer.write_byte(0xAB);

        let mut buf = vec![0x00, 0x11];
        writer.finish_into(&mut buf);
        assert_eq!(buf, vec![0x00, 0x11, 0xAB]);
    }

    #[test]
    fn writer_default() {
        let writer = BitWriter::default();
        assert_eq!(writer.bits_written(), 0);
    }
}
