//! Region routing.
//!
//! The provider partitions its infrastructure by region. Each region has
//! its own base URL and requires a matching `Host` header because the
//! provider's edge multiplexes by host. The table is built once at startup
//! and only read afterwards, so a [`RegionRouter`] can be shared across
//! tasks without synchronization.

use crate::error::TaskError;

// ---------------------------------------------------------------------------
// Known regions
// ---------------------------------------------------------------------------

/// Mainland China region id.
pub const REGION_CHINA: &str = "china";
/// Hong Kong / international region id.
pub const REGION_HONGKONG: &str = "hongkong";

const CHINA_BASE_URL: &str = "https://www.runninghub.cn";
const CHINA_HOST: &str = "www.runninghub.cn";
const HONGKONG_BASE_URL: &str = "https://www.runninghub.ai";
const HONGKONG_HOST: &str = "www.runninghub.ai";

// ---------------------------------------------------------------------------
// RegionConfig
// ---------------------------------------------------------------------------

/// Immutable connection details for one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionConfig {
    id: String,
    base_url: String,
    host_header: String,
}

impl RegionConfig {
    /// Build a region entry. A trailing `/` on `base_url` is dropped so that
    /// path joining can always insert exactly one separator.
    pub fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        host_header: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            id: id.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            host_header: host_header.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Base URL without a trailing slash, e.g. `https://www.runninghub.ai`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Value for the `Host` request header.
    pub fn host_header(&self) -> &str {
        &self.host_header
    }

    /// Absolute URL for an API path such as `/task/openapi/status`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// RegionRouter
// ---------------------------------------------------------------------------

/// Errors building a region table.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegionTableError {
    #[error("Region table must contain at least one region")]
    Empty,

    #[error("Region id must not be empty")]
    EmptyId,

    #[error("Duplicate region id: {0}")]
    DuplicateId(String),

    #[error("Region {id} has an invalid base URL: {base_url}")]
    InvalidBaseUrl { id: String, base_url: String },

    #[error("Region {0} has an empty host header")]
    EmptyHost(String),
}

/// Read-only lookup from region id to [`RegionConfig`].
#[derive(Debug, Clone)]
pub struct RegionRouter {
    regions: Vec<RegionConfig>,
}

impl RegionRouter {
    /// Build a router from a custom region table.
    ///
    /// Rejects an empty table, blank or duplicate ids, base URLs that are
    /// not `http(s)://`, and blank host headers.
    pub fn new(regions: Vec<RegionConfig>) -> Result<Self, RegionTableError> {
        if regions.is_empty() {
            return Err(RegionTableError::Empty);
        }
        for (i, region) in regions.iter().enumerate() {
            if region.id.trim().is_empty() {
                return Err(RegionTableError::EmptyId);
            }
            if regions[..i].iter().any(|r| r.id == region.id) {
                return Err(RegionTableError::DuplicateId(region.id.clone()));
            }
            if !(region.base_url.starts_with("https://") || region.base_url.starts_with("http://"))
            {
                return Err(RegionTableError::InvalidBaseUrl {
                    id: region.id.clone(),
                    base_url: region.base_url.clone(),
                });
            }
            if region.host_header.trim().is_empty() {
                return Err(RegionTableError::EmptyHost(region.id.clone()));
            }
        }
        Ok(Self { regions })
    }

    /// Resolve a region id.
    ///
    /// An unknown id is a configuration error; there is no fallback region.
    pub fn resolve(&self, region_id: &str) -> Result<&RegionConfig, TaskError> {
        self.regions
            .iter()
            .find(|r| r.id == region_id)
            .ok_or_else(|| TaskError::UnknownRegion(region_id.to_string()))
    }

    /// All configured region ids, in table order.
    pub fn region_ids(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.id.as_str())
    }
}

impl Default for RegionRouter {
    /// The provider's production regions.
    fn default() -> Self {
        Self {
            regions: vec![
                RegionConfig::new(REGION_CHINA, CHINA_BASE_URL, CHINA_HOST),
                RegionConfig::new(REGION_HONGKONG, HONGKONG_BASE_URL, HONGKONG_HOST),
            ],
        }
    }
}
