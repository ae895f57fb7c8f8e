/// API route handlers
///
/// This module contains all HTTP route handlers organized by resource:
/// - `auth`: Login
/// - `health`: Health check endpoint
/// - `tasks`: Task CRUD, status updates, comments, dashboard stats
/// - `users`: User management (admin)
pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use serde::{Deserialize, Deserializer};

/// Deserializes a field that distinguishes "absent" from "null".
///
/// Plain `Option<T>` collapses a missing key and an explicit `null` into
/// `None`. Wrapping the field as `Option<Option<T>>` with
/// `#[serde(default, deserialize_with = "double_option")]` keeps them
/// apart: absent stays `None`, `null` becomes `Some(None)`, and a value
/// becomes `Some(Some(value))`. Update payloads rely on this to tell
/// "leave the field alone" from "clear it".
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        note: Option<Option<String>>,
    }

    #[test]
    fn double_option_distinguishes_absent_null_and_value() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.note, None);

        let null: Patch = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(null.note, Some(None));

        let value: Patch = serde_json::from_str(r#"{"note": "hi"}"#).unwrap();
        assert_eq!(value.note, Some(Some("hi".to_string())));
    }
}
