//! Property tests pairing generated schema trees with matching values.

use bitstream::{BitReader, BitWriter};
use codec::{decode_value, encode_value, Value};
use proptest::prelude::*;
use schema::{PrimitiveKind, SchemaType};

// A small closed set of leaf shapes paired with value generators keeps the
// schema and the value in agreement by construction.
fn leaf() -> impl Strategy<Value = (SchemaType, Value)> {
    prop_oneof![
        any::<u32>().prop_map(|v| (SchemaType::uint(), Value::U32(v))),
        any::<i32>().prop_map(|v| (SchemaType::int(), Value::I32(v))),
        any::<bool>().prop_map(|v| (SchemaType::boolean(), Value::Bool(v))),
        any::<f32>().prop_map(|v| (SchemaType::float(), Value::F32(v))),
        (0u32..32).prop_map(|v| {
            (
                SchemaType::primitive_with_bits(PrimitiveKind::UInt, 5),
                Value::U32(v),
            )
        }),
        (-16i32..16).prop_map(|v| {
            (
                SchemaType::primitive_with_bits(PrimitiveKind::Int, 5),
                Value::I32(v),
            )
        }),
        "[a-z0-9]{0,8}".prop_map(|s| (SchemaType::string(), Value::Str(s))),
    ]
}

fn tree() -> impl Strategy<Value = (SchemaType, Value)> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            // Struct of up to 4 fields.
            prop::collection::vec(inner.clone(), 1..4).prop_map(|fields| {
                let mut builder = SchemaType::structure("Gen");
                let mut values = Vec::new();
                for (i, (ty, value)) in fields.into_iter().enumerate() {
                    builder = builder.field(format!("f{i}"), ty);
                    values.push(value);
                }
                (builder.build().unwrap(), Value::Struct(values))
            }),
            // Homogeneous array replicating one element shape.
            (inner.clone(), 0..4usize).prop_map(|((ty, value), len)| {
                (
                    SchemaType::array(ty),
                    Value::Array(vec![value; len]),
                )
            }),
            // Two-variant union selecting the first.
            (inner.clone(), inner).prop_map(|((ty_a, value_a), (ty_b, _))| {
                (
                    SchemaType::union(vec![ty_a, ty_b]),
                    Value::Union {
                        variant: 0,
                        value: Box::new(value_a),
                    },
                )
            }),
        ]
    })
}

proptest! {
    #[test]
    fn prop_schema_value_roundtrip((ty, value) in tree()) {
        let mut writer = BitWriter::new();
        encode_value(&ty, &value, &mut writer).unwrap();
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        let decoded = decode_value(&ty, &mut reader).unwrap();

        // Compare float payloads bitwise to sidestep NaN inequality.
        prop_assert_eq!(format!("{decoded:?}"), format!("{:?}", value));
    }
}
