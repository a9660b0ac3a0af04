//! Deterministic schema hashing.
//!
//! There is no on-wire type identifier, so two endpoints can only detect a
//! schema mismatch out of band. Hashing the registered tree once at startup
//! and comparing digests is that check.

use blake3::Hasher;

use crate::{PrimitiveKind, SchemaType};

/// Computes a deterministic hash of a schema tree.
#[must_use]
pub fn schema_hash(ty: &SchemaType) -> u64 {
    let mut hasher = Hasher::new();
    write_type(&mut hasher, ty);
    let hash = hasher.finalize();
    let bytes = hash.as_bytes();
    u64::from_le_bytes(bytes[0..8].try_into().expect("digest has 32 bytes"))
}

fn write_type(hasher: &mut Hasher, ty: &SchemaType) {
    match ty {
        SchemaType::Primitive { kind, bits } => {
            write_u8(hasher, 0);
            write_u8(hasher, kind_tag(*kind));
            write_opt_u32(hasher, *bits);
        }
        SchemaType::Struct { name, fields } => {
            write_u8(hasher, 1);
            write_str(hasher, name);
            write_u32(hasher, fields.len() as u32);
            for field in fields {
                write_str(hasher, &field.name);
                write_opt_u32(hasher, field.bits);
                write_u8(hasher, u8::from(field.nullable));
                write_type(hasher, &field.ty);
            }
        }
        SchemaType::Array {
            element,
            length_bits,
            element_bits,
            element_nullable,
        } => {
            write_u8(hasher, 2);
            write_opt_u32(hasher, *length_bits);
            write_opt_u32(hasher, *element_bits);
            write_u8(hasher, u8::from(*element_nullable));
            write_type(hasher, element);
        }
        SchemaType::Map {
            key,
            value,
            length_bits,
            key_bits,
            value_bits,
            value_nullable,
        } => {
            write_u8(hasher, 3);
            write_opt_u32(hasher, *length_bits);
            write_opt_u32(hasher, *key_bits);
            write_opt_u32(hasher, *value_bits);
            write_u8(hasher, u8::from(*value_nullable));
            write_type(hasher, key);
            write_type(hasher, value);
        }
        SchemaType::Enum {
            name,
            underlying,
            variants,
            auto_size,
        } => {
            write_u8(hasher, 4);
            write_str(hasher, name);
            write_u8(hasher, kind_tag(*underlying));
            write_u8(hasher, u8::from(*auto_size));
            write_u32(hasher, variants.len() as u32);
            for variant in variants {
                write_str(hasher, variant);
            }
        }
        SchemaType::Union { variants } => {
            write_u8(hasher, 5);
            write_u32(hasher, variants.len() as u32);
            for variant in variants {
                write_type(hasher, variant);
            }
        }
    }
}

const fn kind_tag(kind: PrimitiveKind) -> u8 {
    match kind {
        PrimitiveKind::String => 0,
        PrimitiveKind::Float => 1,
        PrimitiveKind::Int => 2,
        PrimitiveKind::UInt => 3,
        PrimitiveKind::Short => 4,
        PrimitiveKind::UShort => 5,
        PrimitiveKind::Long => 6,
        PrimitiveKind::ULong => 7,
        PrimitiveKind::Bool => 8,
        PrimitiveKind::Byte => 9,
        PrimitiveKind::SByte => 10,
    }
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_u32(hasher: &mut Hasher, value: u32) {
    hasher.update(&value.to_le_bytes());
}

fn write_opt_u32(hasher: &mut Hasher, value: Option<u32>) {
    match value {
        None => write_u8(hasher, 0),
        Some(v) => {
            write_u8(hasher, 1);
            write_u32(hasher, v);
        }
    }
}

fn write_str(hasher: &mut Hasher, value: &str) {
    write_u32(hasher, value.len() as u32);
    hasher.update(value.as_bytes());
}
