//! Optional diagnostic and observability sinks.
//!
//! Both hooks are absent by default and invoked synchronously from the
//! dispatching thread; an implementation is responsible for its own
//! thread-safety and for staying cheap.

/// Classifies a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A frozen structure failed an internal consistency check. This always
    /// indicates an implementation bug; the router reports it and panics.
    InternalInvariantViolation,
}

/// A diagnostic event delivered to the configured sink.
#[derive(Debug, Clone)]
pub struct DiagnosticEvent {
    pub kind: DiagnosticKind,
    pub detail: String,
}

/// Receives router-internal diagnostic events.
pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, event: DiagnosticEvent);
}

/// Which stage of the lookup pipeline produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// Bloom-gated static fingerprint table.
    StaticTable,
    /// First-segment-indexed compiled template scan.
    CompiledTemplate,
    /// Radix tree walk.
    TreeWalk,
    /// No route matched.
    NotFound,
}

/// Per-request match outcome delivered to the observability recorder.
#[derive(Debug, Clone, Copy)]
pub struct MatchOutcome<'a> {
    pub method: &'a str,
    pub path: &'a str,
    /// The matched route template, `None` on a miss.
    pub template: Option<&'a str>,
    pub source: MatchSource,
}

/// Records match outcomes, one call per dispatched request.
pub trait ObservabilityRecorder: Send + Sync {
    fn record(&self, outcome: MatchOutcome<'_>);
}
