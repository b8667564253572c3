//! Configuration constants, run configuration and URL templates.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{HarvesterError, Result};

/// Default base URL of the provider API.
pub const DEFAULT_API_URL: &str = "https://api.seaaroundus.org/api/v1";

/// Default base URL of the provider's public web pages.
pub const DEFAULT_SITE_URL: &str = "https://www.seaaroundus.org/data/#";

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for transient transport failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Number of top series requested per catch time-series fetch.
pub const DEFAULT_CATCH_LIMIT: u32 = 10;

/// Default location of the committed-version state file.
pub const DEFAULT_STATE_FILE: &str = "harvest-state.yaml";

/// Category name pattern: lowercase words joined by single dashes.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CATEGORY_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]+(-[a-z]+)*$").expect("valid regex"));

/// Validate a category name as typed on the command line.
///
/// # Examples
/// ```
/// use seaaroundus_harvester::config::validate_category_name;
///
/// assert!(validate_category_name("fishing-entity").is_ok());
/// assert!(validate_category_name("EEZ").is_err());
/// ```
pub fn validate_category_name(name: &str) -> Result<()> {
    if CATEGORY_NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(HarvesterError::UnknownCategory(name.to_string()))
    }
}

/// Validate a base URL and strip trailing slashes.
fn normalize_base_url(raw: &str, what: &str) -> Result<String> {
    let parsed = Url::parse(raw)
        .map_err(|e| HarvesterError::InvalidConfig(format!("{what} '{raw}': {e}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(HarvesterError::InvalidConfig(format!(
            "{what} '{raw}' must use http or https"
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

/// Immutable configuration for one harvest run.
///
/// Built once and passed by reference into the transport, the extractors
/// and the transformers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvesterConfig {
    pub api_base_url: String,
    pub site_base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub catch_limit: u32,
    pub state_file: PathBuf,
}

impl HarvesterConfig {
    /// Configuration with all defaults.
    pub fn new() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            site_base_url: DEFAULT_SITE_URL.to_string(),
            timeout_secs: HTTP_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            catch_limit: DEFAULT_CATCH_LIMIT,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }

    /// Load configuration from `SAU_*` environment variables.
    ///
    /// Unset or unparsable numeric values fall back to the defaults. An
    /// invalid `SAU_API_URL` or `SAU_SITE_URL` is an
    /// [`HarvesterError::InvalidConfig`](crate::error::HarvesterError::InvalidConfig).
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(url) = std::env::var("SAU_API_URL") {
            config = config.with_api_base_url(&url)?;
        }
        if let Ok(url) = std::env::var("SAU_SITE_URL") {
            config = config.with_site_base_url(&url)?;
        }

        config.timeout_secs = std::env::var("SAU_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(HTTP_TIMEOUT_SECS);

        config.max_retries = std::env::var("SAU_HTTP_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_RETRIES);

        config.catch_limit = std::env::var("SAU_CATCH_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CATCH_LIMIT);

        if let Ok(path) = std::env::var("SAU_STATE_FILE") {
            config.state_file = PathBuf::from(path);
        }

        Ok(config)
    }

    pub fn with_api_base_url(mut self, url: &str) -> Result<Self> {
        self.api_base_url = normalize_base_url(url, "API base URL")?;
        Ok(self)
    }

    pub fn with_site_base_url(mut self, url: &str) -> Result<Self> {
        self.site_base_url = normalize_base_url(url, "site base URL")?;
        Ok(self)
    }

    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = path.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// URL builder bound to this configuration.
    #[must_use]
    pub fn urls(&self) -> UrlBuilder<'_> {
        UrlBuilder { config: self }
    }
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds every provider and web URL from a [`HarvesterConfig`].
#[derive(Debug, Clone, Copy)]
pub struct UrlBuilder<'a> {
    config: &'a HarvesterConfig,
}

impl UrlBuilder<'_> {
    /// Index (listing) endpoint of a category.
    ///
    /// # Examples
    /// ```
    /// use seaaroundus_harvester::config::HarvesterConfig;
    ///
    /// let config = HarvesterConfig::new();
    /// assert_eq!(
    ///     config.urls().index("eez", true),
    ///     "https://api.seaaroundus.org/api/v1/eez/?geojson=true"
    /// );
    /// ```
    #[must_use]
    pub fn index(&self, path: &str, geojson: bool) -> String {
        let base = &self.config.api_base_url;
        if geojson {
            format!("{base}/{path}/?geojson=true")
        } else {
            format!("{base}/{path}/")
        }
    }

    /// Detail endpoint of one entity.
    #[must_use]
    pub fn detail(&self, path: &str, id: i64) -> String {
        format!("{}/{path}/{id}", self.config.api_base_url)
    }

    /// Catch time-series endpoint for one measure and dimension.
    #[must_use]
    pub fn catch(
        &self,
        path: &str,
        measure: &str,
        dimension: &str,
        id: i64,
        format: &str,
    ) -> String {
        format!(
            "{}/{path}/{measure}/{dimension}/?region_id={id}&limit={}&format={format}",
            self.config.api_base_url, self.config.catch_limit
        )
    }

    /// Public web page of one entity.
    #[must_use]
    pub fn site(&self, path: &str, id: i64) -> String {
        format!("{}/{path}/{id}", self.config.site_base_url)
    }

    /// Public catch chart of one entity for a measure and dimension.
    #[must_use]
    pub fn catch_chart(&self, path: &str, id: i64, measure: &str, dimension: &str) -> String {
        format!(
            "{}/{path}/{id}?chart=catch-chart&dimension={dimension}&measure={measure}&limit={}",
            self.config.site_base_url, self.config.catch_limit
        )
    }
}
