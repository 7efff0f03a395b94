//! Field kinds and their default SQL column types.

use std::fmt;

use crate::errors::{MapperError, MapperResult};

/// The storage-relevant shape of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Text,
    /// Date and time of day, stored in the canonical text layout.
    Timestamp,
    /// Sequence or nested aggregate stored as a JSON document.
    Document,
    /// A field type with no SQL mapping. Only usable on excluded fields.
    Opaque(&'static str),
}

impl Kind {
    /// Default column type for this kind, used when no `type=` override is given.
    pub fn default_sql_type(self) -> MapperResult<&'static str> {
        let sql_type = match self {
            Kind::Bool | Kind::Int8 => "TINYINT",
            Kind::Int16 => "SMALLINT",
            Kind::Int32 => "INTEGER",
            Kind::Int64 => "BIGINT",
            Kind::UInt8 => "TINYINT UNSIGNED",
            Kind::UInt16 => "SMALLINT UNSIGNED",
            Kind::UInt32 => "INTEGER UNSIGNED",
            Kind::UInt64 => "BIGINT UNSIGNED",
            Kind::Float32 => "FLOAT",
            Kind::Float64 => "DOUBLE",
            Kind::Text | Kind::Document => "TEXT",
            Kind::Timestamp => "TIMESTAMP",
            Kind::Opaque(type_name) => {
                return Err(MapperError::unsupported(
                    type_name,
                    "no SQL column type for this field kind",
                ))
            }
        };
        Ok(sql_type)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Bool => f.write_str("bool"),
            Kind::Int8 => f.write_str("i8"),
            Kind::Int16 => f.write_str("i16"),
            Kind::Int32 => f.write_str("i32"),
            Kind::Int64 => f.write_str("i64"),
            Kind::UInt8 => f.write_str("u8"),
            Kind::UInt16 => f.write_str("u16"),
            Kind::UInt32 => f.write_str("u32"),
            Kind::UInt64 => f.write_str("u64"),
            Kind::Float32 => f.write_str("f32"),
            Kind::Float64 => f.write_str("f64"),
            Kind::Text => f.write_str("text"),
            Kind::Timestamp => f.write_str("timestamp"),
            Kind::Document => f.write_str("document"),
            Kind::Opaque(name) => write!(f, "opaque({name})"),
        }
    }
}
