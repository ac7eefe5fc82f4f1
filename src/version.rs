//! API version detection.
//!
//! A configured versioning engine maps each inbound request to a version id,
//! which selects the version-scoped trees registered through
//! [`Router::version`](crate::Router::version). Detection sources are tried
//! in a fixed order: header, query parameter, custom closure. Whatever is
//! detected is validated against the allowed set; anything invalid or absent
//! falls back to the configured default.

use crate::http::Request;
use std::fmt;
use std::sync::Arc;

/// User-supplied version detector.
pub type VersionDetectorFn = Arc<dyn Fn(&Request) -> Option<String> + Send + Sync>;

/// Versioning engine configuration.
#[derive(Clone)]
pub struct VersioningConfig {
    /// Header carrying the version id, matched case-insensitively.
    pub header_name: Option<String>,
    /// Query parameter carrying the version id.
    pub query_param: Option<String>,
    /// Custom detector, consulted when neither header nor query is set.
    pub custom_detector: Option<VersionDetectorFn>,
    /// Version used when detection yields nothing valid.
    pub default_version: String,
    /// Allowed versions. Empty means every detected value is accepted.
    pub valid_versions: Vec<String>,
}

impl VersioningConfig {
    pub fn new(default_version: &str) -> Self {
        Self {
            header_name: None,
            query_param: None,
            custom_detector: None,
            default_version: default_version.to_string(),
            valid_versions: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str) -> Self {
        self.header_name = Some(name.to_string());
        self
    }

    pub fn with_query_param(mut self, name: &str) -> Self {
        self.query_param = Some(name.to_string());
        self
    }

    pub fn with_custom_detector(mut self, detector: VersionDetectorFn) -> Self {
        self.custom_detector = Some(detector);
        self
    }

    pub fn with_valid_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_versions = versions.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Debug for VersioningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersioningConfig")
            .field("header_name", &self.header_name)
            .field("query_param", &self.query_param)
            .field("custom_detector", &self.custom_detector.is_some())
            .field("default_version", &self.default_version)
            .field("valid_versions", &self.valid_versions)
            .finish()
    }
}

/// Resolves the version for a request, always returning a usable id.
pub(crate) fn detect_version(config: &VersioningConfig, request: &Request) -> String {
    let detected = if let Some(header) = &config.header_name {
        request.header(header).map(str::to_string)
    } else if let Some(param) = &config.query_param {
        query_value(request.query(), param).map(str::to_string)
    } else if let Some(detector) = &config.custom_detector {
        detector(request)
    } else {
        None
    };

    match detected {
        Some(v)
            if config.valid_versions.is_empty()
                || config.valid_versions.iter().any(|allowed| allowed == &v) =>
        {
            v
        }
        _ => config.default_version.clone(),
    }
}

/// Scans a raw query string for `name=value` without allocating.
///
/// Pairs are `&`-separated; a bare `name` (no `=`) yields an empty value.
/// Only exact name matches count, so `version=2` does not satisfy `ver`.
fn query_value<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    if query.is_empty() || name.is_empty() {
        return None;
    }
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some((key, value)) if key == name => return Some(value),
            None if pair == name => return Some(""),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_value_boundaries() {
        assert_eq!(query_value("v=2&x=3", "v"), Some("2"));
        assert_eq!(query_value("ver=2&v=3", "v"), Some("3"));
        assert_eq!(query_value("version=2", "v"), None);
        assert_eq!(query_value("v", "v"), Some(""));
        assert_eq!(query_value("v=", "v"), Some(""));
        assert_eq!(query_value("", "v"), None);
        assert_eq!(query_value("a=1&b=2", "c"), None);
    }

    #[test]
    fn test_detect_from_header_case_insensitive() {
        let config = VersioningConfig::new("v1").with_header("X-Api-Version");
        let request = Request::new("GET", "/x").with_header("x-api-version", "v2");
        assert_eq!(detect_version(&config, &request), "v2");
    }

    #[test]
    fn test_detect_from_query() {
        let config = VersioningConfig::new("v1").with_query_param("api_version");
        let request = Request::new("GET", "/x").with_query("api_version=v3&debug=1");
        assert_eq!(detect_version(&config, &request), "v3");
    }

    #[test]
    fn test_invalid_version_falls_back_to_default() {
        let config = VersioningConfig::new("v1")
            .with_header("x-api-version")
            .with_valid_versions(["v1", "v2"]);
        let request = Request::new("GET", "/x").with_header("x-api-version", "v9");
        assert_eq!(detect_version(&config, &request), "v1");
    }

    #[test]
    fn test_absent_version_falls_back_to_default() {
        let config = VersioningConfig::new("v1").with_header("x-api-version");
        let request = Request::new("GET", "/x");
        assert_eq!(detect_version(&config, &request), "v1");
    }

    #[test]
    fn test_custom_detector() {
        let config = VersioningConfig::new("v1").with_custom_detector(Arc::new(|req: &Request| {
            req.path().starts_with("/beta").then(|| "beta".to_string())
        }));
        let request = Request::new("GET", "/beta/users");
        assert_eq!(detect_version(&config, &request), "beta");
        let request = Request::new("GET", "/users");
        assert_eq!(detect_version(&config, &request), "v1");
    }
}
