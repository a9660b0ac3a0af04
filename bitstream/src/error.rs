//! Error types for bitstream operations.

use std::fmt;

/// Result type for bitstream operations.
pub type BitResult<T> = Result<T, BitError>;

/// Errors that can occur during bit-level encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitError {
    /// Attempted to read past the end of the buffer.
    EndOfBuffer {
        /// Number of bits requested.
        requested: usize,
        /// Number of bits available.
        available: usize,
    },

    /// A requested bit width is zero or exceeds the natural width of the type.
    InvalidBitCount {
        /// The invalid bit count provided.
        bits: u32,
        /// Maximum allowed bits for this operation.
        max_bits: u32,
    },

    /// Floats are only encodable at their full 32-bit width.
    UnsupportedFloatWidth {
        /// The bit count that was requested.
        bits: u32,
    },

    /// A string field did not decode as valid UTF-8.
    InvalidUtf8,

    /// A 7-bit length prefix ran past its maximum byte count.
    InvalidVarint,
}

impl fmt::Display for BitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfBuffer {
                requested,
                available,
            } => {
                write!(
                    f,
                    "attempted to read {requested} bits but only {available} bits available"
                )
            }
            Self::InvalidBitCount { bits, max_bits } => {
                write!(f, "invalid bit count {bits}, maximum allowed is {max_bits}")
            }
            Self::UnsupportedFloatWidth { bits } => {
                write!(f, "floats require exactly 32 bits, got {bits}")
            }
            Self::InvalidUtf8 => write!(f, "string bytes are not valid UTF-8"),
            Self::InvalidVarint => write!(f, "7-bit encoded integer exceeds maximum length"),
        }
    }
}

impl std::error::Error for BitError {}
