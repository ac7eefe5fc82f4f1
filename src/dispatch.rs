//! Request dispatch.
//!
//! The pipeline per request: detect the API version, pick the `(version,
//! method)` structures, then static table → compiled template scan → tree
//! walk, stopping at the first hit. A miss runs the not-found chain. Before
//! freeze the same resolution happens against the locked core, tree walk
//! only.
//!
//! Method resolution tries the request's method tree first, then the
//! any-method tree; a detected version's trees are consulted before the
//! unversioned ones, so unversioned routes stay reachable under every
//! version.

use crate::config::RouterConfig;
use crate::context::Handler;
use crate::diagnostics::{MatchOutcome, MatchSource};
use crate::http::{Request, Response};
use crate::operations::{Captures, lookup_route};
use crate::pool::PoolClass;
use crate::router::{Frozen, Router, compose_not_found};
use crate::types::RouteId;
use crate::version::detect_version;
use std::sync::Arc;

/// HTTP 499, the client-closed-request status used when cancellation stops
/// the chain before any handler wrote a response.
const STATUS_CLIENT_CLOSED: u16 = 499;

impl Router {
    /// Dispatches one request and returns the response the handler chain
    /// produced (or the not-found output).
    pub fn dispatch(&self, request: Request) -> Response {
        let version = self
            .config
            .versioning
            .as_ref()
            .map(|v| detect_version(v, &request));

        match self.frozen.load_full() {
            Some(frozen) => self.dispatch_frozen(&frozen, version, request),
            None => self.dispatch_mutable(version, request),
        }
    }

    fn dispatch_frozen(
        &self,
        frozen: &Frozen,
        version: Option<String>,
        request: Request,
    ) -> Response {
        let (ctx, chain, template, name) = {
            let hit = resolve_frozen(
                frozen,
                &self.config,
                &version,
                request.method(),
                request.path(),
            );
            match hit {
                Some((id, captures, source)) => {
                    let entry = &frozen.registry[id];
                    self.record(&request, Some(entry.template.as_ref()), source);
                    let mut ctx = self
                        .pool
                        .acquire(PoolClass::for_param_count(entry.pattern.param_count()));
                    ctx.bind_params(&captures);
                    drop(captures);
                    let chain = entry.chain.clone();
                    let template = entry.template.clone();
                    let name = entry.name.clone();
                    (ctx, chain, Some(template), name)
                }
                None => {
                    self.record(&request, None, MatchSource::NotFound);
                    let ctx = self.pool.acquire(PoolClass::Small);
                    (ctx, frozen.not_found_chain.clone(), None, None)
                }
            }
        };
        self.finish(ctx, request, chain, template, name)
    }

    fn dispatch_mutable(&self, version: Option<String>, request: Request) -> Response {
        let core = self.core.read();

        let (ctx, chain, template, name) = {
            let mut hit = None;
            let version_methods = if version.is_some() {
                core.versions.get(&version)
            } else {
                None
            };
            'resolve: for methods in [version_methods, core.versions.get(&None)]
                .into_iter()
                .flatten()
            {
                for method in [request.method(), ""] {
                    if let Some(tree) = methods.get(method) {
                        if let Some(found) = lookup_route(tree, &core.registry, request.path()) {
                            hit = Some(found);
                            break 'resolve;
                        }
                    }
                }
            }

            match hit {
                Some((id, captures)) => {
                    let entry = &core.registry[id];
                    self.record(&request, Some(entry.template.as_ref()), MatchSource::TreeWalk);
                    let mut ctx = self
                        .pool
                        .acquire(PoolClass::for_param_count(entry.pattern.param_count()));
                    ctx.bind_params(&captures);
                    drop(captures);
                    let chain = entry.chain.clone();
                    let template = entry.template.clone();
                    let name = entry.name.clone();
                    (ctx, chain, Some(template), name)
                }
                None => {
                    self.record(&request, None, MatchSource::NotFound);
                    let chain = compose_not_found(&core.global_middleware, core.not_found.clone());
                    let ctx = self.pool.acquire(PoolClass::Small);
                    (ctx, chain, None, None)
                }
            }
        };
        drop(core);
        self.finish(ctx, request, chain, template, name)
    }

    /// Runs the chain in a pooled context and returns the response.
    fn finish(
        &self,
        mut ctx: Box<crate::context::Context>,
        request: Request,
        chain: Arc<[Handler]>,
        template: Option<Arc<str>>,
        name: Option<Arc<str>>,
    ) -> Response {
        ctx.begin(request, chain, template, name);
        ctx.run();
        if ctx.was_cancelled() && ctx.response().is_untouched() {
            ctx.response_mut().set_status(STATUS_CLIENT_CLOSED);
        }
        let response = ctx.take_response();
        self.pool.release(ctx);
        response
    }

    fn record(&self, request: &Request, template: Option<&str>, source: MatchSource) {
        if let Some(recorder) = &self.config.observability {
            recorder.record(MatchOutcome {
                method: request.method(),
                path: request.path(),
                template,
                source,
            });
        }
    }
}

fn resolve_frozen<'t, 'p>(
    frozen: &'t Frozen,
    config: &RouterConfig,
    version: &Option<String>,
    method: &'p str,
    path: &'p str,
) -> Option<(RouteId, Captures<'t, 'p>, MatchSource)> {
    let version_methods = if version.is_some() {
        frozen.versions.get(version)
    } else {
        None
    };

    for methods in [version_methods, frozen.versions.get(&None)]
        .into_iter()
        .flatten()
    {
        for m in [method, ""] {
            let Some(slot) = methods.get(m) else { continue };

            if let Some(set) = &slot.compiled {
                if let Some(found) = set.find(path, &frozen.registry, config.template_routing) {
                    return Some(found);
                }
            }
            // Safety net, and the only path in non-compiled mode. Yields the
            // same result as the compiled scan on every input.
            if let Some((id, captures)) = lookup_route(&slot.tree, &frozen.registry, path) {
                return Some((id, captures, MatchSource::TreeWalk));
            }
        }
    }
    None
}
