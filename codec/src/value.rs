//! Dynamic value model for schema-driven encode/decode.

/// A dynamically typed value matching some [`schema::SchemaType`] shape.
///
/// Struct fields appear in declaration order; map entries preserve
/// insertion order, which is also wire order. [`Value::Enum`] holds the
/// wire-level number: the 0-indexed ordinal for auto-sized enums, otherwise
/// the raw two's-complement bits of the underlying value. [`Value::Null`]
/// is only valid at sites the schema marks nullable.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    F32(f32),
    I32(i32),
    U32(u32),
    I16(i16),
    U16(u16),
    I64(i64),
    U64(u64),
    Bool(bool),
    U8(u8),
    I8(i8),
    Struct(Vec<Value>),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Enum(u64),
    Union { variant: usize, value: Box<Value> },
    Null,
}

impl Value {
    /// Short human-readable name of the value's shape, for diagnostics.
    #[must_use]
    pub const fn shape_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::F32(_) => "float",
            Self::I32(_) => "int",
            Self::U32(_) => "uint",
            Self::I16(_) => "short",
            Self::U16(_) => "ushort",
            Self::I64(_) => "long",
            Self::U64(_) => "ulong",
            Self::Bool(_) => "bool",
            Self::U8(_) => "byte",
            Self::I8(_) => "sbyte",
            Self::Struct(_) => "struct",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Enum(_) => "enum",
            Self::Union { .. } => "union",
            Self::Null => "null",
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}
