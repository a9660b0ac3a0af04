//! Recursive schema-driven encoding.

use bitstream::BitWriter;
use schema::{selector_width, PrimitiveKind, SchemaType};

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Encodes `value` according to `ty`.
///
/// The walk writes exactly the bits the matching [`decode_value`] expects:
/// presence bits before nullable sites, counts before sequences, selectors
/// before union variants, and nothing else.
///
/// [`decode_value`]: crate::decode_value
pub fn encode_value(ty: &SchemaType, value: &Value, writer: &mut BitWriter) -> CodecResult<()> {
    encode_site(ty, None, false, value, writer)
}

pub(crate) fn encode_site(
    ty: &SchemaType,
    bits_override: Option<u32>,
    nullable: bool,
    value: &Value,
    writer: &mut BitWriter,
) -> CodecResult<()> {
    if nullable {
        let present = !matches!(value, Value::Null);
        writer.write_bool(present);
        if !present {
            return Ok(());
        }
    } else if matches!(value, Value::Null) {
        return Err(CodecError::NullNotAllowed);
    }

    match ty {
        SchemaType::Primitive { kind, bits } => {
            encode_primitive(*kind, bits_override.or(*bits), value, writer)
        }
        SchemaType::Struct { name, fields } => {
            let Value::Struct(values) = value else {
                return Err(CodecError::TypeMismatch { expected: "struct" });
            };
            if values.len() != fields.len() {
                return Err(CodecError::FieldCountMismatch {
                    struct_name: name.clone(),
                    expected: fields.len(),
                    actual: values.len(),
                });
            }
            for (field, field_value) in fields.iter().zip(values) {
                encode_site(&field.ty, field.bits, field.nullable, field_value, writer)?;
            }
            Ok(())
        }
        SchemaType::Array {
            element,
            length_bits,
            element_bits,
            element_nullable,
        } => {
            let Value::Array(items) = value else {
                return Err(CodecError::TypeMismatch { expected: "array" });
            };
            writer.write_int(items.len() as i32, length_bits.unwrap_or(32))?;
            for item in items {
                encode_site(element, *element_bits, *element_nullable, item, writer)?;
            }
            Ok(())
        }
        SchemaType::Map {
            key,
            value: value_ty,
            length_bits,
            key_bits,
            value_bits,
            value_nullable,
        } => {
            let Value::Map(entries) = value else {
                return Err(CodecError::TypeMismatch { expected: "map" });
            };
            writer.write_int(entries.len() as i32, length_bits.unwrap_or(32))?;
            for (entry_key, entry_value) in entries {
                encode_site(key, *key_bits, false, entry_key, writer)?;
                encode_site(value_ty, *value_bits, *value_nullable, entry_value, writer)?;
            }
            Ok(())
        }
        SchemaType::Enum {
            underlying,
            variants,
            auto_size,
            ..
        } => {
            let Value::Enum(raw) = value else {
                return Err(CodecError::TypeMismatch { expected: "enum" });
            };
            if *auto_size {
                if *raw >= variants.len() as u64 {
                    return Err(CodecError::EnumOrdinalOutOfRange {
                        ordinal: *raw,
                        variant_count: variants.len(),
                    });
                }
                writer.write_ulong(*raw, selector_width(variants.len()))?;
                Ok(())
            } else {
                encode_enum_underlying(*underlying, *raw, writer)
            }
        }
        SchemaType::Union { variants } => {
            let Value::Union {
                variant,
                value: inner,
            } = value
            else {
                return Err(CodecError::TypeMismatch { expected: "union" });
            };
            if *variant >= variants.len() {
                return Err(CodecError::UnknownUnionVariant {
                    selector: *variant as u64,
                    variant_count: variants.len(),
                });
            }
            writer.write_ulong(*variant as u64, selector_width(variants.len()))?;
            encode_site(&variants[*variant], None, false, inner, writer)
        }
    }
}

fn encode_primitive(
    kind: PrimitiveKind,
    bits: Option<u32>,
    value: &Value,
    writer: &mut BitWriter,
) -> CodecResult<()> {
    match (kind, value) {
        (PrimitiveKind::String, Value::Str(s)) => match bits {
            // A width override on a string is a fixed byte length with no
            // prefix; the reader must know it from the same schema.
            Some(len) => {
                if s.len() != len as usize {
                    return Err(CodecError::FixedStringLength {
                        expected: len as usize,
                        actual: s.len(),
                    });
                }
                writer.write_string(s);
                Ok(())
            }
            None => {
                writer.write_var_string(s);
                Ok(())
            }
        },
        (PrimitiveKind::Float, Value::F32(v)) => Ok(writer.write_float(*v, bits.unwrap_or(32))?),
        (PrimitiveKind::Int, Value::I32(v)) => Ok(writer.write_int(*v, bits.unwrap_or(32))?),
        (PrimitiveKind::UInt, Value::U32(v)) => Ok(writer.write_uint(*v, bits.unwrap_or(32))?),
        (PrimitiveKind::Short, Value::I16(v)) => {
            Ok(writer.write_int(i32::from(*v), bits.unwrap_or(16))?)
        }
        (PrimitiveKind::UShort, Value::U16(v)) => {
            Ok(writer.write_uint(u32::from(*v), bits.unwrap_or(16))?)
        }
        (PrimitiveKind::Long, Value::I64(v)) => Ok(writer.write_long(*v, bits.unwrap_or(64))?),
        (PrimitiveKind::ULong, Value::U64(v)) => Ok(writer.write_ulong(*v, bits.unwrap_or(64))?),
        (PrimitiveKind::Bool, Value::Bool(v)) => {
            writer.write_bool(*v);
            Ok(())
        }
        (PrimitiveKind::Byte, Value::U8(v)) => {
            Ok(writer.write_uint(u32::from(*v), bits.unwrap_or(8))?)
        }
        (PrimitiveKind::SByte, Value::I8(v)) => {
            Ok(writer.write_int(i32::from(*v), bits.unwrap_or(8))?)
        }
        (kind, _) => Err(CodecError::TypeMismatch {
            expected: kind_name(kind),
        }),
    }
}

// Non-auto enums travel at the underlying kind's natural width; the value
// model holds the underlying's raw bits zero-extended to u64.
fn encode_enum_underlying(kind: PrimitiveKind, raw: u64, writer: &mut BitWriter) -> CodecResult<()> {
    match kind {
        PrimitiveKind::Int => Ok(writer.write_int(raw as u32 as i32, 32)?),
        PrimitiveKind::UInt => Ok(writer.write_uint(raw as u32, 32)?),
        PrimitiveKind::Short => Ok(writer.write_int(i32::from(raw as u16 as i16), 16)?),
        PrimitiveKind::UShort => Ok(writer.write_uint(u32::from(raw as u16), 16)?),
        PrimitiveKind::Long => Ok(writer.write_long(raw as i64, 64)?),
        PrimitiveKind::ULong => Ok(writer.write_ulong(raw, 64)?),
        PrimitiveKind::Byte => Ok(writer.write_uint(u32::from(raw as u8), 8)?),
        PrimitiveKind::SByte => Ok(writer.write_int(i32::from(raw as u8 as i8), 8)?),
        _ => Err(CodecError::TypeMismatch { expected: "integer enum underlying" }),
    }
}

pub(crate) const fn kind_name(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::String => "string",
        PrimitiveKind::Float => "float",
        PrimitiveKind::Int => "int",
        PrimitiveKind::UInt => "uint",
        PrimitiveKind::Short => "short",
        PrimitiveKind::UShort => "ushort",
        PrimitiveKind::Long => "long",
        PrimitiveKind::ULong => "ulong",
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::Byte => "byte",
        PrimitiveKind::SByte => "sbyte",
    }
}
