//! Defines the error types used throughout the `routrix` crate.
//!
//! Every variant is a registration-time failure. Dispatch never surfaces a
//! `RouterError`: a request that matches nothing is a routing outcome (the
//! not-found chain runs), not an error.

use thiserror::Error;

/// The primary error type for `routrix` operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The route pattern could not be parsed.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern string as given by the caller.
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },

    /// A handler is already registered for this method and pattern.
    #[error("duplicate route: {method} '{pattern}' is already registered")]
    DuplicateRoute {
        /// The HTTP method of the rejected registration.
        method: String,
        /// The pattern of the rejected registration.
        pattern: String,
    },

    /// Two patterns place differently named parameters at the same tree
    /// position. A node carries at most one parameter edge, so the names
    /// must agree.
    #[error(
        "conflicting parameter name in '{pattern}': position already bound as ':{existing}', got ':{new}'"
    )]
    ConflictingParamName {
        /// The parameter name already present on the edge.
        existing: String,
        /// The parameter name the new pattern tried to introduce.
        new: String,
        /// The pattern whose registration was rejected.
        pattern: String,
    },

    /// A constraint could not be compiled, most commonly a malformed regex.
    /// Raised at registration so matching never pays for a compile failure.
    #[error("invalid constraint on ':{param}': {detail}")]
    InvalidConstraint {
        /// The parameter the constraint was attached to.
        param: String,
        /// Compiler output or a short description of the problem.
        detail: String,
    },

    /// A constraint referenced a parameter the pattern does not bind.
    #[error("pattern '{pattern}' does not bind a parameter named ':{param}'")]
    UnknownParam {
        /// The parameter name the caller tried to constrain.
        param: String,
        /// The pattern of the route the constraint targeted.
        pattern: String,
    },

    /// Registration was attempted after `freeze`. The compiled tables are
    /// immutable; a frozen router only serves lookups.
    #[error("router is frozen; registration is no longer permitted")]
    RouterFrozen,
}
