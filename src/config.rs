//! Router configuration.
//!
//! Configuration is a plain value handed to [`Router::with_config`]; there is
//! no process-wide state. Every knob the engine honors is listed here.
//!
//! [`Router::with_config`]: crate::Router::with_config

use crate::diagnostics::{DiagnosticsSink, ObservabilityRecorder};
use crate::version::VersioningConfig;
use std::fmt;
use std::sync::Arc;

/// Bloom filter hash count bounds. Values outside are clamped, not rejected.
pub const BLOOM_HASH_MIN: usize = 1;
pub const BLOOM_HASH_MAX: usize = 10;

/// Tuning and feature flags for a [`Router`](crate::Router).
#[derive(Clone)]
pub struct RouterConfig {
    /// Bloom filter size in bits. When `None` the filter is auto-sized at
    /// freeze to `10 × static_route_count`, clamped to `[100, 1_000_000]`.
    pub bloom_size: Option<usize>,
    /// Number of bloom hash functions, clamped to `[1, 10]`.
    pub bloom_hash_fns: usize,
    /// Enables the frozen static-table and template fast paths.
    pub compiled_routes: bool,
    /// Checks the request's cancellation flag between handlers.
    pub cancellation_check: bool,
    /// Enables the first-segment-indexed dynamic template scan.
    pub template_routing: bool,
    /// How many contexts to pre-allocate per pool size class at construction.
    pub pool_warm_per_class: usize,
    /// Version detection; `None` routes everything through the unversioned
    /// trees.
    pub versioning: Option<VersioningConfig>,
    /// Sink for internal diagnostic events.
    pub diagnostics: Option<Arc<dyn DiagnosticsSink>>,
    /// Recorder invoked once per dispatched request.
    pub observability: Option<Arc<dyn ObservabilityRecorder>>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            bloom_size: None,
            bloom_hash_fns: 3,
            compiled_routes: true,
            cancellation_check: true,
            template_routing: true,
            pool_warm_per_class: 8,
            versioning: None,
            diagnostics: None,
            observability: None,
        }
    }
}

impl fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterConfig")
            .field("bloom_size", &self.bloom_size)
            .field("bloom_hash_fns", &self.bloom_hash_fns)
            .field("compiled_routes", &self.compiled_routes)
            .field("cancellation_check", &self.cancellation_check)
            .field("template_routing", &self.template_routing)
            .field("pool_warm_per_class", &self.pool_warm_per_class)
            .field("versioning", &self.versioning)
            .field("diagnostics", &self.diagnostics.is_some())
            .field("observability", &self.observability.is_some())
            .finish()
    }
}

impl RouterConfig {
    /// The effective bloom hash count after clamping.
    pub(crate) fn clamped_bloom_hashes(&self) -> usize {
        self.bloom_hash_fns.clamp(BLOOM_HASH_MIN, BLOOM_HASH_MAX)
    }
}
