//! Shared type definitions for registered routes.

use crate::constraint::ConstraintSet;
use crate::context::Handler;
use crate::pattern::RoutePattern;
use std::sync::Arc;

/// Index of a route in the router's registry. Tree terminals and compiled
/// tables store ids instead of owning route data, so one registry entry is
/// the single source of truth for a route's chain and constraints.
pub(crate) type RouteId = usize;

/// Everything the router knows about one registered route.
#[derive(Clone)]
pub(crate) struct RouteEntry {
    pub pattern: RoutePattern,
    /// The original pattern string, shared with contexts for observability.
    pub template: Arc<str>,
    pub method: String,
    pub version: Option<String>,
    /// Global middleware ++ scope middleware ++ route handler, composed at
    /// registration.
    pub chain: Arc<[Handler]>,
    pub constraints: ConstraintSet,
    pub name: Option<Arc<str>>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry")
            .field("template", &self.template)
            .field("method", &self.method)
            .field("version", &self.version)
            .field("handlers", &self.chain.len())
            .field("name", &self.name)
            .field("description", &self.description)
            .field("tags", &self.tags)
            .finish()
    }
}
