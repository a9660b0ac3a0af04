//! Schema validation errors.

use std::fmt;

use crate::PrimitiveKind;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when building or validating a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Duplicate field name within a struct.
    DuplicateFieldName { struct_name: String, field: String },

    /// A bit-width override is zero or exceeds the kind's natural width.
    InvalidBitWidth {
        kind: PrimitiveKind,
        bits: u32,
        max_bits: u32,
    },

    /// A count prefix width must fit in a 32-bit signed count.
    InvalidLengthBitWidth { bits: u32 },

    /// Floats have no compressed representation.
    UnsupportedFloatWidth { bits: u32 },

    /// A bit-width override was placed on a composite element.
    BitWidthOnComposite,

    /// An enum's underlying kind must be an integer primitive.
    NonIntegerEnumUnderlying { name: String, kind: PrimitiveKind },

    /// An enum must declare at least one variant.
    EmptyEnum { name: String },

    /// A tagged union must declare at least one variant.
    EmptyUnion,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateFieldName { struct_name, field } => {
                write!(f, "struct `{struct_name}` declares field `{field}` twice")
            }
            Self::InvalidBitWidth {
                kind,
                bits,
                max_bits,
            } => {
                write!(
                    f,
                    "bit width {bits} is invalid for {kind:?}, allowed range is 1..={max_bits}"
                )
            }
            Self::InvalidLengthBitWidth { bits } => {
                write!(f, "length prefix width {bits} is outside 1..=32")
            }
            Self::UnsupportedFloatWidth { bits } => {
                write!(f, "floats require exactly 32 bits, got {bits}")
            }
            Self::BitWidthOnComposite => {
                write!(f, "bit-width overrides only apply to primitive elements")
            }
            Self::NonIntegerEnumUnderlying { name, kind } => {
                write!(f, "enum `{name}` has non-integer underlying kind {kind:?}")
            }
            Self::EmptyEnum { name } => {
                write!(f, "enum `{name}` declares no variants")
            }
            Self::EmptyUnion => write!(f, "tagged union declares no variants"),
        }
    }
}

impl std::error::Error for SchemaError {}
