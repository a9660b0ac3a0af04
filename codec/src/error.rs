//! Error types for structural encode/decode.

use std::fmt;

use bitstream::BitError;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while walking a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// An underlying bit-level failure.
    Bits(BitError),

    /// The value's shape does not match the schema at this site.
    TypeMismatch { expected: &'static str },

    /// A struct value carries the wrong number of fields.
    FieldCountMismatch {
        struct_name: String,
        expected: usize,
        actual: usize,
    },

    /// A fixed-length string field has the wrong byte length.
    FixedStringLength { expected: usize, actual: usize },

    /// A null value appeared at a non-nullable site.
    NullNotAllowed,

    /// An auto-sized enum ordinal is outside the declared variant set.
    EnumOrdinalOutOfRange { ordinal: u64, variant_count: usize },

    /// A union selector does not name a declared variant.
    UnknownUnionVariant { selector: u64, variant_count: usize },

    /// A decoded element count was negative.
    NegativeCount { count: i32 },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bits(err) => write!(f, "bit-level failure: {err}"),
            Self::TypeMismatch { expected } => {
                write!(f, "value does not match schema, expected {expected}")
            }
            Self::FieldCountMismatch {
                struct_name,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "struct `{struct_name}` expects {expected} fields, value has {actual}"
                )
            }
            Self::FixedStringLength { expected, actual } => {
                write!(
                    f,
                    "fixed-length string expects {expected} bytes, value has {actual}"
                )
            }
            Self::NullNotAllowed => write!(f, "null value at a non-nullable site"),
            Self::EnumOrdinalOutOfRange {
                ordinal,
                variant_count,
            } => {
                write!(
                    f,
                    "enum ordinal {ordinal} is outside {variant_count} declared variants"
                )
            }
            Self::UnknownUnionVariant {
                selector,
                variant_count,
            } => {
                write!(
                    f,
                    "union selector {selector} is outside {variant_count} declared variants"
                )
            }
            Self::NegativeCount { count } => {
                write!(f, "decoded a negative element count {count}")
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bits(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BitError> for CodecError {
    fn from(err: BitError) -> Self {
        Self::Bits(err)
    }
}
