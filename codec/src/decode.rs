//! Recursive schema-driven decoding.

use bitstream::BitReader;
use schema::{selector_width, PrimitiveKind, SchemaType};

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Decodes a [`Value`] matching `ty` from the reader.
///
/// Mirrors [`encode_value`]: the reader must hold the same schema tree the
/// writer used, or the bit cursor desynchronizes.
///
/// [`encode_value`]: crate::encode_value
pub fn decode_value(ty: &SchemaType, reader: &mut BitReader<'_>) -> CodecResult<Value> {
    decode_site(ty, None, false, reader)
}

pub(crate) fn decode_site(
    ty: &SchemaType,
    bits_override: Option<u32>,
    nullable: bool,
    reader: &mut BitReader<'_>,
) -> CodecResult<Value> {
    if nullable && !reader.read_bool()? {
        return Ok(Value::Null);
    }

    match ty {
        SchemaType::Primitive { kind, bits } => {
            decode_primitive(*kind, bits_override.or(*bits), reader)
        }
        SchemaType::Struct { fields, .. } => {
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                values.push(decode_site(&field.ty, field.bits, field.nullable, reader)?);
            }
            Ok(Value::Struct(values))
        }
        SchemaType::Array {
            element,
            length_bits,
            element_bits,
            element_nullable,
        } => {
            let count = read_count(reader, *length_bits)?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_site(element, *element_bits, *element_nullable, reader)?);
            }
            Ok(Value::Array(items))
        }
        SchemaType::Map {
            key,
            value: value_ty,
            length_bits,
            key_bits,
            value_bits,
            value_nullable,
        } => {
            let count = read_count(reader, *length_bits)?;
            let mut entries = Vec::with_capacity(count);
            for _ in 0..count {
                let entry_key = decode_site(key, *key_bits, false, reader)?;
                let entry_value = decode_site(value_ty, *value_bits, *value_nullable, reader)?;
                entries.push((entry_key, entry_value));
            }
            Ok(Value::Map(entries))
        }
        SchemaType::Enum {
            underlying,
            variants,
            auto_size,
            ..
        } => {
            if *auto_size {
                let ordinal = reader.read_ulong(selector_width(variants.len()))?;
                if ordinal >= variants.len() as u64 {
                    return Err(CodecError::EnumOrdinalOutOfRange {
                        ordinal,
                        variant_count: variants.len(),
                    });
                }
                Ok(Value::Enum(ordinal))
            } else {
                decode_enum_underlying(*underlying, reader)
            }
        }
        SchemaType::Union { variants } => {
            let selector = reader.read_ulong(selector_width(variants.len()))?;
            let Some(variant_ty) = variants.get(selector as usize) else {
                return Err(CodecError::UnknownUnionVariant {
                    selector,
                    variant_count: variants.len(),
                });
            };
            let inner = decode_site(variant_ty, None, false, reader)?;
            Ok(Value::Union {
                variant: selector as usize,
                value: Box::new(inner),
            })
        }
    }
}

fn read_count(reader: &mut BitReader<'_>, length_bits: Option<u32>) -> CodecResult<usize> {
    let count = reader.read_int(length_bits.unwrap_or(32))?;
    if count < 0 {
        return Err(CodecError::NegativeCount { count });
    }
    Ok(count as usize)
}

fn decode_primitive(
    kind: PrimitiveKind,
    bits: Option<u32>,
    reader: &mut BitReader<'_>,
) -> CodecResult<Value> {
    match kind {
        PrimitiveKind::String => match bits {
            Some(len) => Ok(Value::Str(reader.read_string(len as usize)?)),
            None => Ok(Value::Str(reader.read_var_string()?)),
        },
        PrimitiveKind::Float => Ok(Value::F32(reader.read_float(bits.unwrap_or(32))?)),
        PrimitiveKind::Int => Ok(Value::I32(reader.read_int(bits.unwrap_or(32))?)),
        PrimitiveKind::UInt => Ok(Value::U32(reader.read_uint(bits.unwrap_or(32))?)),
        PrimitiveKind::Short => Ok(Value::I16(reader.read_int(bits.unwrap_or(16))? as i16)),
        PrimitiveKind::UShort => Ok(Value::U16(reader.read_uint(bits.unwrap_or(16))? as u16)),
        PrimitiveKind::Long => Ok(Value::I64(reader.read_long(bits.unwrap_or(64))?)),
        PrimitiveKind::ULong => Ok(Value::U64(reader.read_ulong(bits.unwrap_or(64))?)),
        PrimitiveKind::Bool => Ok(Value::Bool(reader.read_bool()?)),
        PrimitiveKind::Byte => Ok(Value::U8(reader.read_uint(bits.unwrap_or(8))? as u8)),
        PrimitiveKind::SByte => Ok(Value::I8(reader.read_int(bits.unwrap_or(8))? as i8)),
    }
}

fn decode_enum_underlying(kind: PrimitiveKind, reader: &mut BitReader<'_>) -> CodecResult<Value> {
    let raw = match kind {
        PrimitiveKind::Int => u64::from(reader.read_int(32)? as u32),
        PrimitiveKind::UInt => u64::from(reader.read_uint(32)?),
        PrimitiveKind::Short => u64::from(reader.read_int(16)? as u16),
        PrimitiveKind::UShort => u64::from(reader.read_uint(16)? as u16),
        PrimitiveKind::Long => reader.read_long(64)? as u64,
        PrimitiveKind::ULong => reader.read_ulong(64)?,
        PrimitiveKind::Byte => u64::from(reader.read_uint(8)? as u8),
        PrimitiveKind::SByte => u64::from(reader.read_int(8)? as u8),
        _ => {
            return Err(CodecError::TypeMismatch {
                expected: "integer enum underlying",
            })
        }
    };
    Ok(Value::Enum(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream::BitWriter;

    #[test]
    fn union_decode_rejects_out_of_range_selector() {
        // Two variants need a 1-bit selector; three need 2 bits. Feed a
        // 2-bit selector of 3 into a 3-variant union.
        let ty = SchemaType::union(vec![
            SchemaType::uint(),
            SchemaType::boolean(),
            SchemaType::float(),
        ]);
        let mut writer = BitWriter::new();
        writer.write_ulong(3, 2).unwrap();
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);
        let err = decode_value(&ty, &mut reader).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnknownUnionVariant {
                selector: 3,
                variant_count: 3
            }
        ));
    }

    #[test]
    fn auto_enum_decode_validates_ordinal() {
        // 3 variants use a 2-bit selector; ordinal 3 is unassigned.
        let ty = SchemaType::auto_enum("Mode", vec!["A".into(), "B".into(), "C".into()]);
        let mut writer = BitWriter::new();
        writer.write_ulong(3, 2).unwrap();
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);
        let err = decode_value(&ty, &mut reader).unwrap_err();
        assert!(matches!(err, CodecError::EnumOrdinalOutOfRange { .. }));
    }

    #[test]
    fn negative_count_rejected() {
        let ty = SchemaType::array(SchemaType::uint());
        let mut writer = BitWriter::new();
        writer.write_int(-1, 32).unwrap();
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);
        let err = decode_value(&ty, &mut reader).unwrap_err();
        assert!(matches!(err, CodecError::NegativeCount { count: -1 }));
    }

    #[test]
    fn truncated_input_reports_end_of_buffer() {
        let ty = SchemaType::uint();
        let mut reader = BitReader::new(&[0xFF]);
        let err = decode_value(&ty, &mut reader).unwrap_err();
        assert!(matches!(err, CodecError::Bits(_)));
    }
}
