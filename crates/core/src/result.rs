//! Result payload resolution.
//!
//! The provider's outputs endpoint returns either an array or a keyed
//! object. Entries may be asset paths (absolute URLs, site-relative paths,
//! bare relative paths) or unrelated metadata. [`resolve_result_urls`]
//! keeps only the path-like entries, in provider order, and makes each
//! one absolute against the region's base URL.

use serde_json::Value;

use crate::region::RegionConfig;

/// File extensions recognised as provider assets.
const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "gif", "bmp", "tif", "tiff", "avif", "heic", "svg", "mp4",
    "webm", "mov", "mp3", "wav", "flac", "zip", "glb", "obj", "json", "txt",
];

/// Field carrying the asset location when an array entry is an object.
const FILE_URL_FIELD: &str = "fileUrl";

/// Resolve a raw outputs payload into absolute asset URLs.
///
/// `null`, empty arrays, and empty objects resolve to an empty list; this
/// never fails.
pub fn resolve_result_urls(raw: &Value, region: &RegionConfig) -> Vec<String> {
    candidate_entries(raw)
        .into_iter()
        .filter(|entry| looks_like_asset_path(entry))
        .map(|entry| absolutize(entry, region.base_url()))
        .collect()
}

/// Flatten the payload into candidate strings without judging them yet.
fn candidate_entries(raw: &Value) -> Vec<&str> {
    match raw {
        Value::Array(items) => items.iter().filter_map(entry_text).collect(),
        Value::Object(map) => map.values().filter_map(Value::as_str).collect(),
        Value::String(s) => vec![s.as_str()],
        Value::Null | Value::Bool(_) | Value::Number(_) => Vec::new(),
    }
}

/// A string array entry, or the `fileUrl` of an object entry.
fn entry_text(item: &Value) -> Option<&str> {
    match item {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get(FILE_URL_FIELD).and_then(Value::as_str),
        _ => None,
    }
}

/// Whether a string plausibly names an asset rather than metadata.
///
/// True for absolute `http(s)://` URLs, site-relative paths starting with
/// `/`, and anything whose final segment carries a known asset extension.
pub fn looks_like_asset_path(entry: &str) -> bool {
    let entry = entry.trim();
    if entry.is_empty() {
        return false;
    }
    if is_absolute_url(entry) || entry.starts_with('/') {
        return true;
    }
    has_asset_extension(entry)
}

fn has_asset_extension(entry: &str) -> bool {
    let without_query = entry.split(['?', '#']).next().unwrap_or(entry);
    let last_segment = without_query.rsplit('/').next().unwrap_or(without_query);
    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ASSET_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext)),
        _ => false,
    }
}

fn is_absolute_url(entry: &str) -> bool {
    let lowered = entry.get(..8).unwrap_or(entry).to_ascii_lowercase();
    lowered.starts_with("https://") || lowered.starts_with("http://")
}

/// Join a relative path onto `base_url` with exactly one `/` between them.
/// Absolute URLs are returned unchanged.
fn absolutize(entry: &str, base_url: &str) -> String {
    let entry = entry.trim();
    if is_absolute_url(entry) {
        return entry.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        entry.trim_start_matches('/')
    )
}
