//! Wire-shape descriptions for the bitlink codec.
//!
//! This crate defines the recursive [`SchemaType`] tree that drives
//! structural encode/decode:
//! - Primitive leaves with optional per-site bit-width overrides
//! - Structs, length-prefixed arrays and maps, nullable sites
//! - Auto-sized enums and tagged unions with compact selectors
//! - Deterministic schema hashing
//!
//! # Design Principles
//!
//! - **Explicit schemas** - No reflection on arbitrary Rust types; trees are
//!   built once at registration time.
//! - **Strict contract** - Reader and writer must hold identical trees; the
//!   wire carries no field tags or type identifiers.
//! - **Deterministic hashing** - The schema hash is stable given the same
//!   definition, enabling out-of-band compatibility checks.

mod error;
mod hash;
mod kind;
mod schema;

pub use error::{SchemaError, SchemaResult};
pub use hash::schema_hash;
pub use kind::PrimitiveKind;
pub use schema::{selector_width, FieldDef, SchemaType, StructBuilder};
