//! Schema-driven structural encode/decode for the bitlink wire format.
//!
//! This crate walks a [`schema::SchemaType`] tree to pack a dynamic
//! [`Value`] into a [`bitstream::BitWriter`] and back:
//! - One presence bit before every nullable site
//! - Struct fields strictly in declaration order, no field tags
//! - Count-prefixed arrays and maps
//! - Compact selectors for tagged unions and auto-sized enums
//!
//! Statically typed packets implement [`PacketBody`] instead and skip the
//! dynamic model entirely.

mod body;
mod decode;
mod encode;
mod error;
mod value;

pub use body::PacketBody;
pub use decode::decode_value;
pub use encode::encode_value;
pub use error::{CodecError, CodecResult};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream::{BitReader, BitWriter};
    use schema::SchemaType;

    fn roundtrip(ty: &SchemaType, value: &Value) -> Value {
        let mut writer = BitWriter::new();
        encode_value(ty, value, &mut writer).unwrap();
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);
        decode_value(ty, &mut reader).unwrap()
    }

    #[test]
    fn primitive_roundtrip() {
        assert_eq!(
            roundtrip(&SchemaType::uint(), &Value::U32(1234)),
            Value::U32(1234)
        );
        assert_eq!(
            roundtrip(&SchemaType::int(), &Value::I32(-1234)),
            Value::I32(-1234)
        );
        assert_eq!(
            roundtrip(&SchemaType::string(), &Value::from("héllo")),
            Value::from("héllo")
        );
    }

    #[test]
    fn empty_array_roundtrip() {
        let ty = SchemaType::array(SchemaType::uint());
        assert_eq!(roundtrip(&ty, &Value::Array(vec![])), Value::Array(vec![]));
    }

    #[test]
    fn map_preserves_insertion_order() {
        let ty = SchemaType::map(SchemaType::string(), SchemaType::uint());
        let value = Value::Map(vec![
            (Value::from("b"), Value::U32(2)),
            (Value::from("a"), Value::U32(1)),
        ]);
        assert_eq!(roundtrip(&ty, &value), value);
    }

    #[test]
    fn nullable_roundtrip_both_states() {
        let ty = SchemaType::structure("Opt")
            .nullable_field("name", SchemaType::string())
            .build()
            .unwrap();
        let absent = Value::Struct(vec![Value::Null]);
        let present = Value::Struct(vec![Value::from("x")]);
        assert_eq!(roundtrip(&ty, &absent), absent);
        assert_eq!(roundtrip(&ty, &present), present);
    }

    #[test]
    fn union_roundtrip() {
        let ty = SchemaType::union(vec![SchemaType::uint(), SchemaType::string()]);
        let value = Value::Union {
            variant: 1,
            value: Box::new(Value::from("payload")),
        };
        assert_eq!(roundtrip(&ty, &value), value);
    }

    #[test]
    fn single_variant_union_consumes_one_selector_bit() {
        let ty = SchemaType::union(vec![SchemaType::boolean()]);
        let mut writer = BitWriter::new();
        encode_value(
            &ty,
            &Value::Union {
                variant: 0,
                value: Box::new(Value::Bool(true)),
            },
            &mut writer,
        )
        .unwrap();
        // 1 selector bit + 1 payload bit.
        assert_eq!(writer.bits_written(), 2);
    }

    #[test]
    fn five_variant_union_consumes_three_selector_bits() {
        let ty = SchemaType::union(vec![
            SchemaType::boolean(),
            SchemaType::boolean(),
            SchemaType::boolean(),
            SchemaType::boolean(),
            SchemaType::boolean(),
        ]);
        let mut writer = BitWriter::new();
        encode_value(
            &ty,
            &Value::Union {
                variant: 4,
                value: Box::new(Value::Bool(false)),
            },
            &mut writer,
        )
        .unwrap();
        assert_eq!(writer.bits_written(), 4);
    }

    #[test]
    fn auto_enum_roundtrip() {
        let ty = SchemaType::auto_enum("Mode", vec!["A".into(), "B".into(), "C".into()]);
        assert_eq!(roundtrip(&ty, &Value::Enum(2)), Value::Enum(2));
    }

    #[test]
    fn nested_struct_roundtrip() {
        let inner = SchemaType::structure("Inner")
            .field_with_bits("id", SchemaType::uint(), 12)
            .field("label", SchemaType::string())
            .build()
            .unwrap();
        let ty = SchemaType::structure("Outer")
            .field("items", SchemaType::array(inner))
            .field("flag", SchemaType::boolean())
            .build()
            .unwrap();

        let value = Value::Struct(vec![
            Value::Array(vec![
                Value::Struct(vec![Value::U32(7), Value::from("seven")]),
                Value::Struct(vec![Value::U32(4095), Value::from("max")]),
            ]),
            Value::Bool(true),
        ]);
        assert_eq!(roundtrip(&ty, &value), value);
    }

    #[test]
    fn negative_values_at_narrow_widths() {
        let ty = SchemaType::structure("Narrow")
            .field_with_bits("a", SchemaType::int(), 5)
            .field_with_bits("b", SchemaType::int(), 5)
            .field_with_bits("c", SchemaType::int(), 5)
            .field_with_bits("d", SchemaType::int(), 5)
            .build()
            .unwrap();
        let value = Value::Struct(vec![
            Value::I32(-1),
            Value::I32(-16),
            Value::I32(15),
            Value::I32(0),
        ]);
        assert_eq!(roundtrip(&ty, &value), value);
    }
}
