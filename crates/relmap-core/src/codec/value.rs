//! Bindable scalar values and the raw column text they come back as.

use std::borrow::Cow;

use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};

/// A value ready to bind to a statement placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    /// Bound as an integer when it fits in `i64`, else as decimal text.
    Unsigned(u64),
    Real(f64),
    Text(String),
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            SqlValue::Integer(n) => ToSqlOutput::Owned(Value::Integer(*n)),
            SqlValue::Unsigned(n) => match i64::try_from(*n) {
                Ok(n) => ToSqlOutput::Owned(Value::Integer(n)),
                Err(_) => ToSqlOutput::Owned(Value::Text(n.to_string())),
            },
            SqlValue::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        };
        Ok(output)
    }
}

/// Column value as raw text bytes, the form every field decoder reads.
/// `None` for SQL NULL.
pub fn raw_bytes(value: ValueRef<'_>) -> Option<Cow<'_, [u8]>> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(n) => Some(Cow::Owned(n.to_string().into_bytes())),
        ValueRef::Real(f) => Some(Cow::Owned(f.to_string().into_bytes())),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(Cow::Borrowed(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(value: &SqlValue) -> Value {
        match value.to_sql().unwrap() {
            ToSqlOutput::Owned(v) => v,
            ToSqlOutput::Borrowed(v) => v.into(),
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn test_unsigned_binding() {
        assert_eq!(bound(&SqlValue::Unsigned(42)), Value::Integer(42));
        assert_eq!(
            bound(&SqlValue::Unsigned(u64::MAX)),
            Value::Text(u64::MAX.to_string())
        );
    }

    #[test]
    fn test_bool_binds_as_integer() {
        assert_eq!(bound(&SqlValue::Bool(true)), Value::Integer(1));
        assert_eq!(bound(&SqlValue::Bool(false)), Value::Integer(0));
    }

    #[test]
    fn test_raw_bytes_renders_numbers_as_text() {
        assert_eq!(raw_bytes(ValueRef::Null), None);
        assert_eq!(raw_bytes(ValueRef::Integer(-12)).unwrap().as_ref(), b"-12");
        assert_eq!(raw_bytes(ValueRef::Real(9.5)).unwrap().as_ref(), b"9.5");
        assert_eq!(raw_bytes(ValueRef::Text(b"abc")).unwrap().as_ref(), b"abc");
    }
}
