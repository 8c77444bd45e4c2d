//! Node/field parameter normalization.
//!
//! The provider validates every `nodeInfoList` entry and rejects the whole
//! job (`APIKEY_INVALID_NODE_INFO`) if any `fieldValue` is not a JSON
//! string. Callers hand over heterogeneous values (`0.25`, `true`, `"cat"`)
//! as [`RawAssignment`]s; [`normalize`] is the only way to obtain the
//! wire-ready [`NodeFieldAssignment`] list.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TaskError;
use crate::ids::opt_string_or_integer;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A caller-supplied parameter binding, before normalization.
///
/// Deserializes from the same camelCase shape the provider uses, but
/// tolerates numeric node ids and non-string values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAssignment {
    #[serde(default, deserialize_with = "opt_string_or_integer")]
    pub node_id: Option<String>,
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub field_value: Value,
    #[serde(default)]
    pub param_key: Option<String>,
}

impl RawAssignment {
    /// Convenience constructor accepting any JSON-convertible value.
    ///
    /// ```
    /// use photofx_core::params::RawAssignment;
    ///
    /// let strength = RawAssignment::new("39", "strength", 0.25);
    /// let upscale = RawAssignment::new("52", "enabled", true);
    /// let prompt = RawAssignment::new("6", "text", "a red fox");
    /// # let _ = (strength, upscale, prompt);
    /// ```
    pub fn new(
        node_id: impl Into<String>,
        field_name: impl Into<String>,
        field_value: impl Into<Value>,
    ) -> Self {
        Self {
            node_id: Some(node_id.into()),
            field_name: Some(field_name.into()),
            field_value: field_value.into(),
            param_key: None,
        }
    }

    /// Attach the optional parameter key some apps use to label inputs.
    pub fn with_param_key(mut self, key: impl Into<String>) -> Self {
        self.param_key = Some(key.into());
        self
    }
}

/// A wire-ready node/field binding. `field_value` is always a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFieldAssignment {
    pub node_id: String,
    pub field_name: String,
    pub field_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize caller assignments into wire form.
///
/// - strings pass through unchanged;
/// - numbers use serde_json's locale-independent decimal text;
/// - booleans become `"true"` / `"false"`;
/// - arrays and objects become compact JSON text;
/// - `null` (including non-finite floats, which serde_json stores as
///   `null`) is rejected.
///
/// A missing or blank `nodeId` / `fieldName` is rejected with the index of
/// the offending entry.
pub fn normalize(raw: &[RawAssignment]) -> Result<Vec<NodeFieldAssignment>, TaskError> {
    raw.iter()
        .enumerate()
        .map(|(i, assignment)| normalize_one(i, assignment))
        .collect()
}

fn normalize_one(index: usize, raw: &RawAssignment) -> Result<NodeFieldAssignment, TaskError> {
    let node_id = required_text(index, "nodeId", raw.node_id.as_deref())?;
    let field_name = required_text(index, "fieldName", raw.field_name.as_deref())?;
    let field_value = stringify_value(&raw.field_value).ok_or_else(|| {
        TaskError::InvalidParameter(format!(
            "nodeInfoList[{index}] (node {node_id}, field {field_name}): fieldValue must not be null"
        ))
    })?;

    Ok(NodeFieldAssignment {
        node_id,
        field_name,
        field_value,
        param_key: raw.param_key.clone(),
    })
}

fn required_text(index: usize, name: &str, value: Option<&str>) -> Result<String, TaskError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(TaskError::InvalidParameter(format!(
            "nodeInfoList[{index}]: {name} is required"
        ))),
    }
}

/// Render a JSON value as the string the provider expects.
///
/// Returns `None` for `null`.
pub fn stringify_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
