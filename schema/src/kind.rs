//! Primitive wire kinds.

/// The primitive leaf kinds a schema can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveKind {
    /// UTF-8 text, length-prefixed unless a fixed byte length is configured.
    String,
    /// IEEE-754 single precision, always 32 bits on the wire.
    Float,
    /// Signed 32-bit integer.
    Int,
    /// Unsigned 32-bit integer.
    UInt,
    /// Signed 16-bit integer.
    Short,
    /// Unsigned 16-bit integer.
    UShort,
    /// Signed 64-bit integer.
    Long,
    /// Unsigned 64-bit integer.
    ULong,
    /// Single bit.
    Bool,
    /// Unsigned 8-bit integer.
    Byte,
    /// Signed 8-bit integer.
    SByte,
}

impl PrimitiveKind {
    /// Returns the natural wire width in bits, or `None` for strings whose
    /// width is length-dependent.
    #[must_use]
    pub const fn natural_bits(self) -> Option<u32> {
        match self {
            Self::String => None,
            Self::Bool => Some(1),
            Self::Byte | Self::SByte => Some(8),
            Self::Short | Self::UShort => Some(16),
            Self::Float | Self::Int | Self::UInt => Some(32),
            Self::Long | Self::ULong => Some(64),
        }
    }

    /// Returns `true` for kinds encoded with a leading sign bit.
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::Int | Self::Short | Self::Long | Self::SByte)
    }

    /// Returns `true` for integer kinds, signed or unsigned.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int
                | Self::UInt
                | Self::Short
                | Self::UShort
                | Self::Long
                | Self::ULong
                | Self::Byte
                | Self::SByte
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_widths() {
        assert_eq!(PrimitiveKind::Bool.natural_bits(), Some(1));
        assert_eq!(PrimitiveKind::Byte.natural_bits(), Some(8));
        assert_eq!(PrimitiveKind::UShort.natural_bits(), Some(16));
        assert_eq!(PrimitiveKind::Int.natural_bits(), Some(32));
        assert_eq!(PrimitiveKind::ULong.natural_bits(), Some(64));
        assert_eq!(PrimitiveKind::String.natural_bits(), None);
    }

    #[test]
    fn signedness() {
        assert!(PrimitiveKind::Int.is_signed());
        assert!(PrimitiveKind::SByte.is_signed());
        assert!(!PrimitiveKind::UInt.is_signed());
        assert!(!PrimitiveKind::Bool.is_signed());
    }

    #[test]
    fn integer_kinds() {
        assert!(PrimitiveKind::Byte.is_integer());
        assert!(!PrimitiveKind::Float.is_integer());
        assert!(!PrimitiveKind::String.is_integer());
        assert!(!PrimitiveKind::Bool.is_integer());
    }
}
