//! Property tests for width validation and selector sizing.

use proptest::prelude::*;
use schema::{selector_width, PrimitiveKind, SchemaType};

fn integer_kind() -> impl Strategy<Value = PrimitiveKind> {
    prop_oneof![
        Just(PrimitiveKind::Int),
        Just(PrimitiveKind::UInt),
        Just(PrimitiveKind::Short),
        Just(PrimitiveKind::UShort),
        Just(PrimitiveKind::Long),
        Just(PrimitiveKind::ULong),
        Just(PrimitiveKind::Byte),
        Just(PrimitiveKind::SByte),
    ]
}

proptest! {
    #[test]
    fn widths_within_natural_validate(kind in integer_kind(), frac in 0.0f64..=1.0) {
        let natural = kind.natural_bits().unwrap();
        let bits = 1 + ((f64::from(natural - 1) * frac) as u32);
        let ty = SchemaType::primitive_with_bits(kind, bits);
        prop_assert!(ty.validate().is_ok());
    }

    #[test]
    fn widths_past_natural_are_rejected(kind in integer_kind(), excess in 1u32..32) {
        let natural = kind.natural_bits().unwrap();
        let ty = SchemaType::primitive_with_bits(kind, natural + excess);
        prop_assert!(ty.validate().is_err());
    }

    #[test]
    fn selector_width_covers_the_count(count in 1usize..100_000) {
        let width = selector_width(count);
        // Every index 0..count fits in `width` bits, and the width is tight.
        prop_assert!(count <= 1 << width);
        if width > 1 {
            prop_assert!(count > 1 << (width - 1));
        }
    }
}
