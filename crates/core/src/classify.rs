//! Provider response classification.
//!
//! Maps the provider's `{code, msg}` envelope and raw HTTP statuses onto
//! [`TaskError`] so the client and the poller report the same vocabulary.
//! The provider's codes are not documented as stable, so classification
//! keys off message markers and falls back to [`TaskError::Provider`].

use crate::error::TaskError;

/// Envelope `code` the provider uses for success.
pub const CODE_SUCCESS: i64 = 0;

/// Message fragments meaning the referenced entity does not exist.
const NOT_FOUND_MARKERS: &[&str] = &["not exist", "not_exist", "not found", "not_found"];

/// Message fragments meaning the submitted parameters were rejected.
const INVALID_PARAMETER_MARKERS: &[&str] = &[
    "invalid_node_info",
    "params_invalid",
    "param_invalid",
    "invalid param",
    "parameter invalid",
    "validate",
];

/// Message fragments meaning the provider gave up waiting on something upstream.
const TRANSIENT_MARKERS: &[&str] = &["timeout", "timed out", "try again later"];

/// Classify a non-zero provider envelope into a typed error.
///
/// `code == 0` is not an error; callers must check for success first.
/// Passing a zero code here still yields [`TaskError::Provider`] so the
/// mistake is visible rather than silent.
pub fn classify_provider_response(code: i64, msg: &str) -> TaskError {
    let lowered = msg.to_ascii_lowercase();
    let message = if msg.is_empty() {
        format!("provider returned code {code}")
    } else {
        msg.to_string()
    };

    if contains_any(&lowered, NOT_FOUND_MARKERS) {
        TaskError::NotFound(message)
    } else if contains_any(&lowered, INVALID_PARAMETER_MARKERS) {
        TaskError::InvalidParameter(message)
    } else if contains_any(&lowered, TRANSIENT_MARKERS) {
        TaskError::TransientNetwork(message)
    } else {
        TaskError::Provider { code, message }
    }
}

/// Classify a non-2xx HTTP status.
///
/// - 408, 429 and every 5xx are transient (gateway trouble, throttling).
/// - 404 is [`TaskError::NotFound`] only when the body says so; a bare 404
///   usually means a wrong base URL, which is a provider error.
/// - Everything else is [`TaskError::Provider`] carrying the status as code.
pub fn classify_http_status(status: u16, body: &str) -> TaskError {
    if status == 408 || status == 429 || (500..600).contains(&status) {
        return TaskError::TransientNetwork(format!("HTTP {status}: {}", truncate(body)));
    }
    let lowered = body.to_ascii_lowercase();
    if status == 404 && contains_any(&lowered, NOT_FOUND_MARKERS) {
        return TaskError::NotFound(truncate(body).to_string());
    }
    TaskError::Provider {
        code: i64::from(status),
        message: truncate(body).to_string(),
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Keep log lines and error messages bounded when a gateway returns HTML.
fn truncate(body: &str) -> &str {
    const MAX_BODY_CHARS: usize = 512;
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
