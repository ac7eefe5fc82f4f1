//! Minimal request and response handles.
//!
//! The router matches on a decoded path and reads headers or the raw query
//! string for version detection; everything else about HTTP transport is the
//! hosting server's business. These types are the narrow interface the core
//! shares with that outer layer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// An inbound request as seen by the matching engine.
///
/// The path must already be percent-decoded by the host server; the router
/// never decodes (and therefore never double-decodes).
#[derive(Debug, Clone, Default)]
pub struct Request {
    method: String,
    path: String,
    query: String,
    headers: Vec<(String, String)>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl Request {
    /// Builds a request for the given method and path.
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            query: String::new(),
            headers: Vec::new(),
            cancelled: None,
        }
    }

    /// Sets the raw (undecoded) query string, without the leading `?`.
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }

    /// Appends a header. Names are matched case-insensitively on lookup.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Attaches a cancellation flag. When the router's cancellation check is
    /// enabled, the middleware chain stops before the next handler once the
    /// flag reads `true`.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Case-insensitive single-value header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// The response a handler chain writes into.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Appends bytes to the body.
    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.body.extend_from_slice(bytes);
        self
    }

    /// Appends a string to the body.
    pub fn write_str(&mut self, text: &str) -> &mut Self {
        self.body.extend_from_slice(text.as_bytes());
        self
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// True when no handler has touched the response yet.
    pub(crate) fn is_untouched(&self) -> bool {
        self.status == 200 && self.headers.is_empty() && self.body.is_empty()
    }

    pub(crate) fn reset(&mut self) {
        self.status = 200;
        self.headers.clear();
        self.body.clear();
    }
}
