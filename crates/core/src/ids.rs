//! String-only identifier newtypes.
//!
//! Provider identifiers are long digit strings (`"1907581130097192962"`)
//! that overflow an `f64` and are rejected by the provider when sent as
//! JSON numbers. These wrappers can only be built from text, never from an
//! integer, and always serialize as JSON strings.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a published AI application (`webappId` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

/// Identifier of a raw workflow (`workflowId` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(String);

/// Provider-issued task identifier.
///
/// Serializes as a string. Deserializes from a string or, because some
/// provider responses emit it unquoted, from an integer whose decimal
/// digits are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl AppId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl WorkflowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AppId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AppId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkflowId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for WorkflowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        string_or_integer(deserializer).map(TaskId)
    }
}

// ---------------------------------------------------------------------------
// Lenient string deserialization
// ---------------------------------------------------------------------------

struct StringOrInteger;

impl<'de> Visitor<'de> for StringOrInteger {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or an integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }
}

/// Deserialize a JSON string, or an integer rendered as its decimal digits.
///
/// Floats are rejected: a fractional identifier has already lost digits.
pub fn string_or_integer<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(StringOrInteger)
}

/// Optional variant of [`string_or_integer`] for use with `#[serde(default)]`.
pub fn opt_string_or_integer<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "string_or_integer")] String);

    Option::<Wrapped>::deserialize(deserializer).map(|w| w.map(|Wrapped(s)| s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_only_app_id_serializes_as_string() {
        let id = AppId::from("1907581130097192962");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""1907581130097192962""#);
    }

    #[test]
    fn task_id_accepts_quoted_digits() {
        let id: TaskId = serde_json::from_str(r#""1910246754753896450""#).unwrap();
        assert_eq!(id.as_str(), "1910246754753896450");
    }

    #[test]
    fn task_id_accepts_bare_integer_without_precision_loss() {
        let id: TaskId = serde_json::from_str("1910246754753896450").unwrap();
        assert_eq!(id.as_str(), "1910246754753896450");
    }

    #[test]
    fn task_id_rejects_float() {
        assert!(serde_json::from_str::<TaskId>("1.5").is_err());
    }

    #[test]
    fn opt_string_or_integer_handles_null_and_missing() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(default, deserialize_with = "opt_string_or_integer")]
            id: Option<String>,
        }

        let missing: Probe = serde_json::from_str("{}").unwrap();
        assert!(missing.id.is_none());

        let null: Probe = serde_json::from_str(r#"{"id":null}"#).unwrap();
        assert!(null.id.is_none());

        let number: Probe = serde_json::from_str(r#"{"id":39}"#).unwrap();
        assert_eq!(number.id.as_deref(), Some("39"));
    }

    #[test]
    fn display_is_raw_text() {
        assert_eq!(WorkflowId::new("42").to_string(), "42");
    }
}
