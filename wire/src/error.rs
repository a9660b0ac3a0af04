//! Error types for packet framing and table configuration.

use std::fmt;

use codec::CodecError;

use crate::tag::PacketTag;

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors that can occur while building a packet table or framing packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// A body failed to encode or decode.
    Codec(CodecError),

    /// An application type tried to claim a reserved internal tag.
    ReservedTag { tag: PacketTag },

    /// The same tag was registered twice.
    DuplicateTag { tag: PacketTag },

    /// A send or encode referenced a tag with no registered schema.
    UnknownTag { tag: PacketTag },

    /// A type classified as both reliable and unreliable was used without
    /// an explicit override.
    AmbiguousReliability { tag: PacketTag },

    /// A registered schema failed validation.
    InvalidSchema(schema::SchemaError),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(err) => write!(f, "body codec failure: {err}"),
            Self::ReservedTag { tag } => {
                write!(f, "tag {} is reserved for internal protocol packets", tag.0)
            }
            Self::DuplicateTag { tag } => {
                write!(f, "tag {} is already registered", tag.0)
            }
            Self::UnknownTag { tag } => {
                write!(f, "tag {} has no registered schema", tag.0)
            }
            Self::AmbiguousReliability { tag } => {
                write!(
                    f,
                    "tag {} is classified both reliable and unreliable, an explicit override is required",
                    tag.0
                )
            }
            Self::InvalidSchema(err) => write!(f, "invalid schema: {err}"),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(err) => Some(err),
            Self::InvalidSchema(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CodecError> for WireError {
    fn from(err: CodecError) -> Self {
        Self::Codec(err)
    }
}

impl From<bitstream::BitError> for WireError {
    fn from(err: bitstream::BitError) -> Self {
        Self::Codec(CodecError::Bits(err))
    }
}

impl From<schema::SchemaError> for WireError {
    fn from(err: schema::SchemaError) -> Self {
        Self::InvalidSchema(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_tag() {
        let err = WireError::ReservedTag { tag: PacketTag(3) };
        assert!(err.to_string().contains('3'));
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn codec_errors_carry_source() {
        let err = WireError::from(CodecError::NullNotAllowed);
        assert!(std::error::Error::source(&err).is_some());
    }
}
