//! Field validators shared by the DTOs.
//!
//! Plugged into `#[validate(custom(function = "..."))]` attributes.

use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use validator::ValidationError;

/// Minimum number of digits in a valid phone number.
pub const PHONE_MIN_DIGITS: usize = 7;
/// Maximum number of digits in a valid phone number (E.164).
pub const PHONE_MAX_DIGITS: usize = 15;

pub const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

/// Digits, spaces, dashes, parentheses and a leading `+`; 7 to 15 digits.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return Err(error("phone", "phone number cannot be empty".to_string()));
    }

    let valid_chars = trimmed
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || c == '-' || c == '(' || c == ')' || c == ' ' || (c == '+' && i == 0));
    if !valid_chars {
        return Err(error(
            "phone",
            "phone number contains invalid characters".to_string(),
        ));
    }

    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits) {
        return Err(error(
            "phone",
            format!(
                "phone number must have between {} and {} digits",
                PHONE_MIN_DIGITS, PHONE_MAX_DIGITS
            ),
        ));
    }

    Ok(())
}

pub fn validate_blood_group(blood_group: &str) -> Result<(), ValidationError> {
    if BLOOD_GROUPS.contains(&blood_group) {
        Ok(())
    } else {
        Err(error(
            "blood_group",
            format!("blood group must be one of {}", BLOOD_GROUPS.join(", ")),
        ))
    }
}

/// Lower-cases and trims an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringList {
    List(Vec<String>),
    Joined(String),
}

impl StringList {
    fn into_vec(self) -> Vec<String> {
        let items = match self {
            Self::List(items) => items,
            Self::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Accepts either a JSON array of strings or a comma separated string.
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    StringList::deserialize(deserializer).map(StringList::into_vec)
}

/// Optional variant of [`deserialize_string_list`] for partial updates.
pub fn deserialize_optional_string_list<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<StringList>::deserialize(deserializer).map(|list| list.map(StringList::into_vec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_phone_numbers() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+91 98765-43210").is_ok());
        assert!(validate_phone("(555) 123-4567").is_ok());
    }

    #[test]
    fn test_invalid_phone_numbers() {
        assert!(validate_phone("").is_err());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("1234567890123456").is_err());
        assert!(validate_phone("98765abc10").is_err());
        assert!(validate_phone("98+76543210").is_err());
    }

    #[test]
    fn test_blood_group() {
        assert!(validate_blood_group("AB+").is_ok());
        assert!(validate_blood_group("O-").is_ok());
        assert!(validate_blood_group("C+").is_err());
        assert!(validate_blood_group("ab+").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_string_list")]
        items: Vec<String>,
    }

    #[test]
    fn test_string_list_accepts_array_or_csv() {
        let from_array: Holder = serde_json::from_str(r#"{"items": ["Rust", " SQL "]}"#).unwrap();
        assert_eq!(from_array.items, vec!["Rust", "SQL"]);

        let from_csv: Holder = serde_json::from_str(r#"{"items": "Rust, SQL,,Go"}"#).unwrap();
        assert_eq!(from_csv.items, vec!["Rust", "SQL", "Go"]);

        let missing: Holder = serde_json::from_str("{}").unwrap();
        assert!(missing.items.is_empty());
    }
}
