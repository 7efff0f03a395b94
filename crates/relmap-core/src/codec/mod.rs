//! Value codec: field values to bindable scalars and back from raw column text.

mod document;
mod value;

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::errors::{MapperError, MapperResult};
use crate::schema::Kind;

pub use document::Json;
pub use value::{raw_bytes, SqlValue};

/// Canonical layout for timestamp columns.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Statically known kind of a persistable field type.
pub trait FieldType: FieldValue {
    const KIND: Kind;
}

/// Encode/decode access to one record field.
pub trait FieldValue {
    fn encode(&self) -> MapperResult<SqlValue>;

    /// Replace the value from raw column text. `None` is SQL NULL.
    fn decode(&mut self, column: &str, raw: Option<&[u8]>) -> MapperResult<()>;
}

pub(crate) fn required<'a>(column: &str, raw: Option<&'a [u8]>) -> MapperResult<&'a [u8]> {
    raw.ok_or_else(|| MapperError::decode(column, "unexpected NULL"))
}

fn text<'a>(column: &str, raw: Option<&'a [u8]>) -> MapperResult<&'a str> {
    std::str::from_utf8(required(column, raw)?).map_err(|e| MapperError::decode(column, e))
}

fn parse<T>(column: &str, raw: Option<&[u8]>) -> MapperResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    let s = text(column, raw)?;
    s.trim()
        .parse()
        .map_err(|e| MapperError::decode(column, format!("`{s}`: {e}")))
}

/// SQLite binds NaN as NULL, which no float field can read back.
fn real(value: f64) -> MapperResult<SqlValue> {
    if value.is_nan() {
        return Err(MapperError::bad_parameter("NaN cannot be stored in a float column"));
    }
    Ok(SqlValue::Real(value))
}

macro_rules! signed_field {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl FieldType for $ty {
            const KIND: Kind = Kind::$kind;
        }

        impl FieldValue for $ty {
            fn encode(&self) -> MapperResult<SqlValue> {
                Ok(SqlValue::Integer(*self as i64))
            }

            fn decode(&mut self, column: &str, raw: Option<&[u8]>) -> MapperResult<()> {
                let n: i64 = parse(column, raw)?;
                *self = <$ty>::try_from(n).map_err(|e| MapperError::decode(column, e))?;
                Ok(())
            }
        }
    )*};
}

macro_rules! unsigned_field {
    ($($ty:ty => $kind:ident, $variant:ident, $wide:ty),* $(,)?) => {$(
        impl FieldType for $ty {
            const KIND: Kind = Kind::$kind;
        }

        impl FieldValue for $ty {
            fn encode(&self) -> MapperResult<SqlValue> {
                Ok(SqlValue::$variant(*self as $wide))
            }

            fn decode(&mut self, column: &str, raw: Option<&[u8]>) -> MapperResult<()> {
                let n: u64 = parse(column, raw)?;
                *self = <$ty>::try_from(n).map_err(|e| MapperError::decode(column, e))?;
                Ok(())
            }
        }
    )*};
}

signed_field! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    isize => Int64,
}

unsigned_field! {
    u8 => UInt8, Integer, i64,
    u16 => UInt16, Integer, i64,
    u32 => UInt32, Integer, i64,
    u64 => UInt64, Unsigned, u64,
    usize => UInt64, Unsigned, u64,
}

impl FieldType for bool {
    const KIND: Kind = Kind::Bool;
}

impl FieldValue for bool {
    fn encode(&self) -> MapperResult<SqlValue> {
        Ok(SqlValue::Bool(*self))
    }

    fn decode(&mut self, column: &str, raw: Option<&[u8]>) -> MapperResult<()> {
        let s = text(column, raw)?.trim();
        *self = match s.parse::<i64>() {
            Ok(n) => n != 0,
            Err(_) if s.eq_ignore_ascii_case("true") => true,
            Err(_) if s.eq_ignore_ascii_case("false") => false,
            Err(e) => return Err(MapperError::decode(column, format!("`{s}`: {e}"))),
        };
        Ok(())
    }
}

impl FieldType for f32 {
    const KIND: Kind = Kind::Float32;
}

impl FieldValue for f32 {
    fn encode(&self) -> MapperResult<SqlValue> {
        real(f64::from(*self))
    }

    fn decode(&mut self, column: &str, raw: Option<&[u8]>) -> MapperResult<()> {
        let n: f64 = parse(column, raw)?;
        *self = n as f32;
        Ok(())
    }
}

impl FieldType for f64 {
    const KIND: Kind = Kind::Float64;
}

impl FieldValue for f64 {
    fn encode(&self) -> MapperResult<SqlValue> {
        real(*self)
    }

    fn decode(&mut self, column: &str, raw: Option<&[u8]>) -> MapperResult<()> {
        *self = parse(column, raw)?;
        Ok(())
    }
}

impl FieldType for String {
    const KIND: Kind = Kind::Text;
}

impl FieldValue for String {
    fn encode(&self) -> MapperResult<SqlValue> {
        Ok(SqlValue::Text(self.clone()))
    }

    fn decode(&mut self, column: &str, raw: Option<&[u8]>) -> MapperResult<()> {
        text(column, raw)?.clone_into(self);
        Ok(())
    }
}

impl FieldType for NaiveDateTime {
    const KIND: Kind = Kind::Timestamp;
}

impl FieldValue for NaiveDateTime {
    fn encode(&self) -> MapperResult<SqlValue> {
        Ok(SqlValue::Text(self.format(TIME_FORMAT).to_string()))
    }

    fn decode(&mut self, column: &str, raw: Option<&[u8]>) -> MapperResult<()> {
        let s = text(column, raw)?;
        *self = NaiveDateTime::parse_from_str(s.trim(), TIME_FORMAT)
            .map_err(|e| MapperError::decode(column, format!("`{s}`: {e}")))?;
        Ok(())
    }
}

impl FieldType for DateTime<Utc> {
    const KIND: Kind = Kind::Timestamp;
}

impl FieldValue for DateTime<Utc> {
    fn encode(&self) -> MapperResult<SqlValue> {
        self.naive_utc().encode()
    }

    fn decode(&mut self, column: &str, raw: Option<&[u8]>) -> MapperResult<()> {
        let mut naive = self.naive_utc();
        naive.decode(column, raw)?;
        *self = naive.and_utc();
        Ok(())
    }
}

/// Nullable column: `None` binds NULL and NULL decodes to `None`.
impl<T: FieldType + Default> FieldType for Option<T> {
    const KIND: Kind = T::KIND;
}

impl<T: FieldType + Default> FieldValue for Option<T> {
    fn encode(&self) -> MapperResult<SqlValue> {
        match self {
            Some(value) => value.encode(),
            None => Ok(SqlValue::Null),
        }
    }

    fn decode(&mut self, column: &str, raw: Option<&[u8]>) -> MapperResult<()> {
        match raw {
            None => *self = None,
            Some(_) => {
                let mut value = T::default();
                value.decode(column, raw)?;
                *self = Some(value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn round_trip<T: FieldValue + Default>(value: &T) -> T {
        let raw = match value.encode().unwrap() {
            SqlValue::Null => None,
            SqlValue::Bool(b) => Some(i64::from(b).to_string()),
            SqlValue::Integer(n) => Some(n.to_string()),
            SqlValue::Unsigned(n) => Some(n.to_string()),
            SqlValue::Real(f) => Some(f.to_string()),
            SqlValue::Text(s) => Some(s),
        };
        let mut decoded = T::default();
        decoded
            .decode("col", raw.as_deref().map(str::as_bytes))
            .unwrap();
        decoded
    }

    #[test]
    fn test_integer_round_trips() {
        assert_eq!(round_trip(&i8::MIN), i8::MIN);
        assert_eq!(round_trip(&i16::MAX), i16::MAX);
        assert_eq!(round_trip(&-70_000i32), -70_000);
        assert_eq!(round_trip(&i64::MIN), i64::MIN);
        assert_eq!(round_trip(&u8::MAX), u8::MAX);
        assert_eq!(round_trip(&u32::MAX), u32::MAX);
        assert_eq!(round_trip(&u64::MAX), u64::MAX);
    }

    #[test]
    fn test_bool_decodes_integers_and_literals() {
        let mut flag = false;
        flag.decode("flag", Some(b"1")).unwrap();
        assert!(flag);
        flag.decode("flag", Some(b"0")).unwrap();
        assert!(!flag);
        flag.decode("flag", Some(b"7")).unwrap();
        assert!(flag);
        flag.decode("flag", Some(b"FALSE")).unwrap();
        assert!(!flag);
        assert!(flag.decode("flag", Some(b"maybe")).is_err());
    }

    #[test]
    fn test_out_of_range_integer_fails() {
        let mut small = 0i8;
        let err = small.decode("weight", Some(b"300")).unwrap_err();
        assert!(matches!(err, MapperError::Decode { ref column, .. } if column == "weight"));
        assert_eq!(small, 0);

        let mut unsigned = 0u16;
        assert!(unsigned.decode("level", Some(b"-1")).is_err());
    }

    #[test]
    fn test_numeric_garbage_fails() {
        let mut n = 5i64;
        assert!(n.decode("n", Some(b"12abc")).is_err());
        assert_eq!(n, 5);
        let mut f = 0.5f64;
        assert!(f.decode("f", Some(b"")).is_err());
    }

    #[test]
    fn test_float_round_trips() {
        assert_eq!(round_trip(&9.5f32), 9.5);
        assert_eq!(round_trip(&0.1f32), 0.1);
        assert_eq!(round_trip(&std::f64::consts::PI), std::f64::consts::PI);
    }

    #[test]
    fn test_nan_is_rejected_infinity_round_trips() {
        assert!(matches!(
            f64::NAN.encode().unwrap_err(),
            MapperError::BadParameter { .. }
        ));
        assert!(matches!(
            f32::NAN.encode().unwrap_err(),
            MapperError::BadParameter { .. }
        ));
        assert!(Some(f64::NAN).encode().is_err());
        assert_eq!(round_trip(&f64::INFINITY), f64::INFINITY);
        assert_eq!(round_trip(&f32::NEG_INFINITY), f32::NEG_INFINITY);
    }

    #[test]
    fn test_string_round_trip_and_null() {
        assert_eq!(round_trip(&"héllo, wörld".to_string()), "héllo, wörld");
        let mut s = String::from("keep");
        assert!(s.decode("name", None).is_err());
    }

    #[test]
    fn test_timestamp_layout() {
        let t = NaiveDate::from_ymd_opt(2022, 4, 15)
            .unwrap()
            .and_hms_opt(14, 52, 26)
            .unwrap();
        assert_eq!(
            t.encode().unwrap(),
            SqlValue::Text("2022-04-15 14:52:26".to_string())
        );
        assert_eq!(round_trip(&t), t);
        assert_eq!(round_trip(&t.and_utc()), t.and_utc());
    }

    #[test]
    fn test_timestamp_parse_failure() {
        let mut t = NaiveDateTime::default();
        assert!(t.decode("time", Some(b"2022-04-15T14:52:26Z")).is_err());
    }

    #[test]
    fn test_option_null_round_trip() {
        let none: Option<i32> = None;
        assert_eq!(none.encode().unwrap(), SqlValue::Null);
        assert_eq!(round_trip(&none), None);
        assert_eq!(round_trip(&Some(12i32)), Some(12));
        assert_eq!(<Option<String> as FieldType>::KIND, Kind::Text);
    }
}
