//! Query-string deserialization helpers.
//!
//! Query parameters arrive as strings (and as strings only, once a struct is
//! `#[serde(flatten)]`ed), and empty values such as `?branch_id=` mean "not set".

use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use uuid::Uuid;

fn deserialize_optional_parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.trim().parse::<T>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_parsed(deserializer)
}

pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_parsed(deserializer)
}

pub fn deserialize_optional_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_parsed(deserializer)
}

pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_parsed(deserializer)
}

/// Deserializes any `FromStr` value (enums included) from an optional query string.
pub fn deserialize_optional_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    deserialize_optional_parsed(deserializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Query {
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        is_active: Option<bool>,
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        branch_id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_i32")]
        semester: Option<i32>,
    }

    #[test]
    fn test_empty_values_are_none() {
        let q: Query = serde_json::from_str(r#"{"is_active":"","branch_id":"","semester":""}"#)
            .unwrap();
        assert_eq!(q.is_active, None);
        assert_eq!(q.branch_id, None);
        assert_eq!(q.semester, None);
    }

    #[test]
    fn test_values_are_parsed() {
        let id = Uuid::new_v4();
        let q: Query = serde_json::from_str(&format!(
            r#"{{"is_active":"true","branch_id":"{}","semester":"3"}}"#,
            id
        ))
        .unwrap();
        assert_eq!(q.is_active, Some(true));
        assert_eq!(q.branch_id, Some(id));
        assert_eq!(q.semester, Some(3));
    }

    #[test]
    fn test_missing_fields_default_to_none() {
        let q: Query = serde_json::from_str("{}").unwrap();
        assert!(q.is_active.is_none());
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        assert!(serde_json::from_str::<Query>(r#"{"semester":"abc"}"#).is_err());
    }
}
