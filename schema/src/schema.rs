//! Schema tree definitions and validation.

use std::collections::HashSet;

use crate::error::{SchemaError, SchemaResult};
use crate::PrimitiveKind;

/// A field within a [`SchemaType::Struct`].
///
/// Nullable fields are preceded on the wire by one presence bit. A bit-width
/// override narrows the field's primitive encoding; for strings it is a
/// fixed byte length instead of a 7-bit-encoded prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDef {
    pub name: String,
    pub ty: SchemaType,
    pub bits: Option<u32>,
    pub nullable: bool,
}

impl FieldDef {
    /// Creates a required field with no width override.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: SchemaType) -> Self {
        Self {
            name: name.into(),
            ty,
            bits: None,
            nullable: false,
        }
    }

    /// Sets a bit-width override.
    #[must_use]
    pub fn with_bits(mut self, bits: u32) -> Self {
        self.bits = Some(bits);
        self
    }

    /// Marks the field as nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// The recursive shape description driving structural encode/decode.
///
/// The tree for a concrete type is fixed at registration time and must be
/// identical between every reader and writer exchanging that type; there is
/// no on-wire type identifier beyond the outer packet tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchemaType {
    /// A primitive leaf, optionally narrowed to `bits` on the wire.
    Primitive {
        kind: PrimitiveKind,
        bits: Option<u32>,
    },

    /// A named product type; fields encode strictly in declaration order.
    Struct { name: String, fields: Vec<FieldDef> },

    /// Length-prefixed homogeneous sequence.
    Array {
        element: Box<SchemaType>,
        length_bits: Option<u32>,
        element_bits: Option<u32>,
        element_nullable: bool,
    },

    /// Length-prefixed sequence of key/value pairs in encode order.
    Map {
        key: Box<SchemaType>,
        value: Box<SchemaType>,
        length_bits: Option<u32>,
        key_bits: Option<u32>,
        value_bits: Option<u32>,
        value_nullable: bool,
    },

    /// A closed set of named constants.
    ///
    /// Auto-sized enums encode the 0-indexed ordinal in
    /// [`selector_width`] bits; otherwise the underlying primitive's
    /// natural width carries the raw underlying value.
    Enum {
        name: String,
        underlying: PrimitiveKind,
        variants: Vec<String>,
        auto_size: bool,
    },

    /// One of several alternatives, prefixed by a [`selector_width`]-bit
    /// 0-indexed selector.
    Union { variants: Vec<SchemaType> },
}

impl SchemaType {
    /// A length-prefixed UTF-8 string.
    #[must_use]
    pub const fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }

    /// A 32-bit float.
    #[must_use]
    pub const fn float() -> Self {
        Self::primitive(PrimitiveKind::Float)
    }

    /// A signed 32-bit integer at its natural width.
    #[must_use]
    pub const fn int() -> Self {
        Self::primitive(PrimitiveKind::Int)
    }

    /// An unsigned 32-bit integer at its natural width.
    #[must_use]
    pub const fn uint() -> Self {
        Self::primitive(PrimitiveKind::UInt)
    }

    /// A single presence/flag bit.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::primitive(PrimitiveKind::Bool)
    }

    /// A primitive at its natural width.
    #[must_use]
    pub const fn primitive(kind: PrimitiveKind) -> Self {
        Self::Primitive { kind, bits: None }
    }

    /// A primitive narrowed to `bits`.
    #[must_use]
    pub const fn primitive_with_bits(kind: PrimitiveKind, bits: u32) -> Self {
        Self::Primitive {
            kind,
            bits: Some(bits),
        }
    }

    /// Starts building a named struct.
    #[must_use]
    pub fn structure(name: impl Into<String>) -> StructBuilder {
        StructBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// An array with default count width and no element overrides.
    #[must_use]
    pub fn array(element: Self) -> Self {
        Self::Array {
            element: Box::new(element),
            length_bits: None,
            element_bits: None,
            element_nullable: false,
        }
    }

    /// A map with default count width and no overrides.
    #[must_use]
    pub fn map(key: Self, value: Self) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
            length_bits: None,
            key_bits: None,
            value_bits: None,
            value_nullable: false,
        }
    }

    /// An auto-sized enum over the given variant names.
    #[must_use]
    pub fn auto_enum(name: impl Into<String>, variants: Vec<String>) -> Self {
        Self::Enum {
            name: name.into(),
            underlying: PrimitiveKind::Int,
            variants,
            auto_size: true,
        }
    }

    /// A tagged union over the given variant shapes.
    #[must_use]
    pub fn union(variants: Vec<Self>) -> Self {
        Self::Union { variants }
    }

    /// Validates the whole tree.
    ///
    /// Checks bit-width overrides against natural widths, count prefix
    /// widths, enum underlying kinds, and rejects empty enums/unions and
    /// duplicate struct field names.
    pub fn validate(&self) -> SchemaResult<()> {
        match self {
            Self::Primitive { kind, bits } => validate_primitive_width(*kind, *bits),
            Self::Struct { name, fields } => {
                let mut seen = HashSet::new();
                for field in fields {
                    if !seen.insert(field.name.as_str()) {
                        return Err(SchemaError::DuplicateFieldName {
                            struct_name: name.clone(),
                            field: field.name.clone(),
                        });
                    }
                    validate_site(&field.ty, field.bits)?;
                    field.ty.validate()?;
                }
                Ok(())
            }
            Self::Array {
                element,
                length_bits,
                element_bits,
                ..
            } => {
                validate_length_bits(*length_bits)?;
                validate_site(element, *element_bits)?;
                element.validate()
            }
            Self::Map {
                key,
                value,
                length_bits,
                key_bits,
                value_bits,
                ..
            } => {
                validate_length_bits(*length_bits)?;
                validate_site(key, *key_bits)?;
                validate_site(value, *value_bits)?;
                key.validate()?;
                value.validate()
            }
            Self::Enum {
                name,
                underlying,
                variants,
                ..
            } => {
                if variants.is_empty() {
                    return Err(SchemaError::EmptyEnum { name: name.clone() });
                }
                if !underlying.is_integer() {
                    return Err(SchemaError::NonIntegerEnumUnderlying {
                        name: name.clone(),
                        kind: *underlying,
                    });
                }
                Ok(())
            }
            Self::Union { variants } => {
                if variants.is_empty() {
                    return Err(SchemaError::EmptyUnion);
                }
                for variant in variants {
                    variant.validate()?;
                }
                Ok(())
            }
        }
    }
}

/// Builder for [`SchemaType::Struct`].
#[derive(Debug)]
pub struct StructBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl StructBuilder {
    /// Adds a required field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: SchemaType) -> Self {
        self.fields.push(FieldDef::new(name, ty));
        self
    }

    /// Adds a required field with a bit-width override.
    #[must_use]
    pub fn field_with_bits(mut self, name: impl Into<String>, ty: SchemaType, bits: u32) -> Self {
        self.fields.push(FieldDef::new(name, ty).with_bits(bits));
        self
    }

    /// Adds a nullable field.
    #[must_use]
    pub fn nullable_field(mut self, name: impl Into<String>, ty: SchemaType) -> Self {
        self.fields.push(FieldDef::new(name, ty).nullable());
        self
    }

    /// Builds the struct after validation.
    pub fn build(self) -> SchemaResult<SchemaType> {
        let ty = SchemaType::Struct {
            name: self.name,
            fields: self.fields,
        };
        ty.validate()?;
        Ok(ty)
    }
}

/// Returns the selector width in bits for `count` alternatives.
///
/// `ceil(log2(count))` with a 1-bit minimum: a single-variant union still
/// consumes one selector bit.
#[must_use]
pub const fn selector_width(count: usize) -> u32 {
    if count <= 2 {
        1
    } else {
        usize::BITS - (count - 1).leading_zeros()
    }
}

fn validate_primitive_width(kind: PrimitiveKind, bits: Option<u32>) -> SchemaResult<()> {
    let Some(bits) = bits else { return Ok(()) };
    match kind.natural_bits() {
        // A string override is a fixed byte length, not a bit width.
        None => {
            if bits == 0 {
                return Err(SchemaError::InvalidBitWidth {
                    kind,
                    bits,
                    max_bits: u32::MAX,
                });
            }
            Ok(())
        }
        Some(32) if kind == PrimitiveKind::Float => {
            if bits == 32 {
                Ok(())
            } else {
                Err(SchemaError::UnsupportedFloatWidth { bits })
            }
        }
        Some(max_bits) => {
            if bits == 0 || bits > max_bits {
                return Err(SchemaError::InvalidBitWidth {
                    kind,
                    bits,
                    max_bits,
                });
            }
            Ok(())
        }
    }
}

fn validate_length_bits(length_bits: Option<u32>) -> SchemaResult<()> {
    if let Some(bits) = length_bits {
        if bits == 0 || bits > 32 {
            return Err(SchemaError::InvalidLengthBitWidth { bits });
        }
    }
    Ok(())
}

// A width override at an element/key/value/field site only makes sense for
// primitive shapes.
fn validate_site(ty: &SchemaType, bits: Option<u32>) -> SchemaResult<()> {
    match (ty, bits) {
        (_, None) => Ok(()),
        (SchemaType::Primitive { kind, .. }, Some(bits)) => {
            validate_primitive_width(*kind, Some(bits))
        }
        (_, Some(_)) => Err(SchemaError::BitWidthOnComposite),
    }
}
