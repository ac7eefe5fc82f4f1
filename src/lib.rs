//! # routrix
//!
//! routrix is a high-throughput HTTP route matching engine for Rust. It
//! stores route patterns in per-method radix trees, supports parameters
//! (e.g., `/users/:id`) and trailing wildcards (e.g., `/files/*path`), and
//! compiles frozen fast-path tables: a bloom-gated fingerprint map for fully
//! static paths and a first-segment-indexed template list for dynamic ones.
//!
//! The router lives in two phases. While mutable it accepts registrations
//! (and serves lookups under a read lock); a one-shot [`Router::freeze`]
//! builds the compiled tables and publishes an immutable snapshot, after
//! which dispatch is lock-free and registration fails with
//! [`RouterError::RouterFrozen`].
//!
//! ## Features
//!
//! - Static, parameterized, and trailing-wildcard route matching with the
//!   precedence static > parameter > wildcard.
//! - Per-parameter constraints: anchored regexes or typed predicates
//!   (integer, UUID, ...), compiled at registration.
//! - Middleware chains driven through [`Context::next`] and
//!   [`Context::abort`], with pooled, size-classed request contexts.
//! - Nested registration scopes (`group`) and API versioning with
//!   header/query/custom detection.
//! - Structured error handling with `thiserror`; efficient data structures
//!   (`AHashMap`, `IndexMap`, `SmallVec`) on the hot path.
//!
//! ## Example
//!
//! ```rust
//! use routrix::{Request, Router, TypedKind};
//!
//! let router = Router::new();
//!
//! router
//!     .get("/users/:id", |ctx| {
//!         let id = ctx.param("id").unwrap_or("?").to_string();
//!         ctx.response_mut().write_str(&format!("user {id}"));
//!     })
//!     .expect("Failed to add /users/:id")
//!     .constrain_typed("id", TypedKind::Integer)
//!     .expect("Failed to constrain :id");
//!
//! router
//!     .get("/files/*path", |ctx| {
//!         let path = ctx.param("path").unwrap_or("").to_string();
//!         ctx.response_mut().write_str(&path);
//!     })
//!     .expect("Failed to add /files/*path");
//!
//! // Build the compiled tables; the router is read-only from here on.
//! router.freeze();
//!
//! let resp = router.dispatch(Request::new("GET", "/users/42"));
//! assert_eq!(resp.status(), 200);
//! assert_eq!(resp.body(), b"user 42");
//!
//! // The Integer constraint rejects this segment, so nothing matches.
//! let resp = router.dispatch(Request::new("GET", "/users/alice"));
//! assert_eq!(resp.status(), 404);
//!
//! let resp = router.dispatch(Request::new("GET", "/files/a/b.txt"));
//! assert_eq!(resp.body(), b"a/b.txt");
//! ```

pub mod config;
pub mod constraint;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod http;
pub mod pattern;
pub mod router;
pub mod version;

mod compiled;
mod dispatch;
mod operations;
mod pool;
mod tree;
mod types;

pub use config::RouterConfig;
pub use constraint::{TypedKind, Validator};
pub use context::{Context, Handler};
pub use diagnostics::{
    DiagnosticEvent, DiagnosticKind, DiagnosticsSink, MatchOutcome, MatchSource,
    ObservabilityRecorder,
};
pub use error::RouterError;
pub use http::{Request, Response};
pub use pattern::{RoutePattern, Token};
pub use router::{RouteHandle, Router, Scope};
pub use version::VersioningConfig;
