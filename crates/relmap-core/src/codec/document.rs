//! Opt-in JSON document columns.

use std::ops::{Deref, DerefMut};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::MapperResult;
use crate::schema::Kind;

use super::{required, FieldType, FieldValue, SqlValue};

/// Stores the wrapped value as a JSON text column.
///
/// Sequences and nested records only persist when wrapped, so the storage
/// form of every field is visible in its type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Json<T> {
    fn from(value: T) -> Self {
        Json(value)
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Serialize + DeserializeOwned> FieldType for Json<T> {
    const KIND: Kind = Kind::Document;
}

impl<T: Serialize + DeserializeOwned> FieldValue for Json<T> {
    fn encode(&self) -> MapperResult<SqlValue> {
        Ok(SqlValue::Text(serde_json::to_string(&self.0)?))
    }

    fn decode(&mut self, column: &str, raw: Option<&[u8]>) -> MapperResult<()> {
        self.0 = serde_json::from_slice(required(column, raw)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Profile {
        nickname: String,
        scores: Vec<u32>,
    }

    #[test]
    fn test_sequence_round_trip() {
        let tags = Json(vec!["a".to_string(), "b".to_string()]);
        let encoded = tags.encode().unwrap();
        assert_eq!(encoded, SqlValue::Text(r#"["a","b"]"#.to_string()));

        let mut decoded: Json<Vec<String>> = Json::default();
        decoded.decode("tags", Some(br#"["a","b"]"#)).unwrap();
        assert_eq!(decoded, tags);
    }

    #[test]
    fn test_nested_record_round_trip() {
        let profile = Json(Profile {
            nickname: "ali".to_string(),
            scores: vec![3, 1, 4],
        });
        let SqlValue::Text(text) = profile.encode().unwrap() else {
            panic!("documents encode as text");
        };

        let mut decoded: Json<Profile> = Json::default();
        decoded.decode("profile", Some(text.as_bytes())).unwrap();
        assert_eq!(decoded, profile);
    }

    #[test]
    fn test_malformed_document_fails() {
        let mut decoded: Json<BTreeMap<String, i32>> = Json::default();
        let err = decoded.decode("extra", Some(b"{not json")).unwrap_err();
        assert_eq!(err.code(), "DOCUMENT_ERROR");
    }

    #[test]
    fn test_non_string_map_keys_fail_to_encode() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], 1);
        let err = Json(map).encode().unwrap_err();
        assert_eq!(err.code(), "DOCUMENT_ERROR");
    }
}
