//! Router state, the registration API, and the freeze transition.
//!
//! The router has two phases. While mutable, registration and lookup share a
//! `parking_lot::RwLock` over the core state. `freeze` is a one-shot latch:
//! the first caller builds every compiled table and publishes an immutable
//! snapshot through `ArcSwap`; from then on dispatch never takes a lock and
//! registration fails with [`RouterError::RouterFrozen`].

use crate::compiled::CompiledSet;
use crate::config::RouterConfig;
use crate::constraint::{TypedKind, Validator};
use crate::context::{Context, Handler};
use crate::diagnostics::{DiagnosticEvent, DiagnosticKind};
use crate::error::RouterError;
use crate::operations::insert_route;
use crate::pattern::RoutePattern;
use crate::pool::ContextPool;
use crate::tree::Tree;
use crate::types::{RouteEntry, RouteId};
use arc_swap::ArcSwapOption;
use indexmap::IndexMap;
use parking_lot::{Once, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Per-method trees of one version scope. The empty method key holds routes
/// registered for any method.
pub(crate) type MethodTrees = IndexMap<String, Tree>;

/// Mutable-phase state, guarded by the router's `RwLock`.
#[derive(Default)]
pub(crate) struct RouterCore {
    pub registry: Vec<RouteEntry>,
    /// Version key `None` is the unversioned scope.
    pub versions: IndexMap<Option<String>, MethodTrees>,
    pub global_middleware: Vec<Handler>,
    pub not_found: Option<Handler>,
}

/// One frozen `(version, method)` slot: the tree snapshot plus its compiled
/// tables when compiled routes are enabled.
pub(crate) struct FrozenMethod {
    pub tree: Tree,
    pub compiled: Option<CompiledSet>,
}

/// The immutable snapshot dispatch reads after freeze.
pub(crate) struct Frozen {
    pub registry: Vec<RouteEntry>,
    pub versions: IndexMap<Option<String>, IndexMap<String, FrozenMethod>>,
    pub not_found_chain: Arc<[Handler]>,
}

impl Frozen {
    fn build(core: &RouterCore, config: &RouterConfig) -> Self {
        let mut versions = IndexMap::with_capacity(core.versions.len());
        for (version, methods) in &core.versions {
            let mut frozen_methods = IndexMap::with_capacity(methods.len());
            for (method, tree) in methods {
                let compiled = config
                    .compiled_routes
                    .then(|| CompiledSet::build(tree, &core.registry, config));

                if let Some(set) = &compiled {
                    let expected = core
                        .registry
                        .iter()
                        .filter(|e| e.method == *method && e.version == *version)
                        .count();
                    if set.route_count() != expected {
                        let detail = format!(
                            "compiled table for ({version:?}, {method:?}) holds {} routes, registry has {expected}",
                            set.route_count(),
                        );
                        if let Some(sink) = &config.diagnostics {
                            sink.report(DiagnosticEvent {
                                kind: DiagnosticKind::InternalInvariantViolation,
                                detail: detail.clone(),
                            });
                        }
                        tracing::error!(%detail, "frozen structure inconsistency");
                        panic!("internal invariant violation: {detail}");
                    }
                }

                frozen_methods.insert(method.clone(), FrozenMethod { tree: tree.clone(), compiled });
            }
            versions.insert(version.clone(), frozen_methods);
        }

        Frozen {
            registry: core.registry.clone(),
            versions,
            not_found_chain: compose_not_found(&core.global_middleware, core.not_found.clone()),
        }
    }
}

/// The default not-found handler: a plain 404.
fn default_not_found() -> Handler {
    Arc::new(|ctx: &mut Context| {
        ctx.response_mut()
            .set_status(404)
            .set_header("content-type", "text/plain; charset=utf-8")
            .write_str("404 page not found");
    })
}

/// The not-found chain runs behind the global middleware, same as any route.
pub(crate) fn compose_not_found(
    global: &[Handler],
    not_found: Option<Handler>,
) -> Arc<[Handler]> {
    let mut chain: Vec<Handler> = global.to_vec();
    chain.push(not_found.unwrap_or_else(default_not_found));
    Arc::from(chain.into_boxed_slice())
}

/// The route matching engine.
pub struct Router {
    pub(crate) config: RouterConfig,
    pub(crate) core: RwLock<RouterCore>,
    pub(crate) frozen: ArcSwapOption<Frozen>,
    frozen_flag: AtomicBool,
    freeze_latch: Once,
    pub(crate) pool: ContextPool,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    pub fn with_config(config: RouterConfig) -> Self {
        let pool = ContextPool::new(config.cancellation_check);
        pool.warm(config.pool_warm_per_class);
        Self {
            config,
            core: RwLock::new(RouterCore::default()),
            frozen: ArcSwapOption::empty(),
            frozen_flag: AtomicBool::new(false),
            freeze_latch: Once::new(),
            pool,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Registers a handler for an explicit method string. The method-named
    /// helpers below are the usual entry points; `route` exists for
    /// nonstandard methods.
    pub fn route<F>(&self, method: &str, pattern: &str, handler: F) -> Result<RouteHandle<'_>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.register(method, None, "", &[], pattern, Arc::new(handler))
    }

    pub fn get<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'_>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("GET", pattern, handler)
    }

    pub fn post<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'_>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("POST", pattern, handler)
    }

    pub fn put<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'_>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("PUT", pattern, handler)
    }

    pub fn delete<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'_>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("DELETE", pattern, handler)
    }

    pub fn patch<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'_>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("PATCH", pattern, handler)
    }

    pub fn head<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'_>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("HEAD", pattern, handler)
    }

    pub fn options<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'_>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("OPTIONS", pattern, handler)
    }

    /// Registers a handler serving every method not covered by a
    /// method-specific route on the same path.
    pub fn any<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'_>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("", pattern, handler)
    }

    /// Appends to the global middleware list. Only routes registered after
    /// this call carry the middleware; chains are composed at registration.
    pub fn middleware<F>(&self, middleware: F) -> Result<(), RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.ensure_mutable()?;
        self.core.write().global_middleware.push(Arc::new(middleware));
        Ok(())
    }

    /// Replaces the default 404 handler. The not-found chain still runs
    /// behind the global middleware registered so far.
    pub fn not_found<F>(&self, handler: F) -> Result<(), RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.ensure_mutable()?;
        self.core.write().not_found = Some(Arc::new(handler));
        Ok(())
    }

    /// A registration scope under `prefix`. Scopes nest; prefixes compose
    /// left to right and scope middleware applies to every route registered
    /// through the scope.
    pub fn group(&self, prefix: &str) -> Scope<'_> {
        Scope {
            router: self,
            prefix: prefix.to_string(),
            version: None,
            middleware: Vec::new(),
        }
    }

    /// A registration scope whose routes live in the trees of `version`.
    /// Requests reach them when the configured versioning engine detects
    /// that version id.
    pub fn version(&self, id: &str) -> Scope<'_> {
        Scope {
            router: self,
            prefix: String::new(),
            version: Some(id.to_string()),
            middleware: Vec::new(),
        }
    }

    /// Transitions the router to the frozen phase: builds the compiled
    /// tables for every `(version, method)` tree and publishes the snapshot.
    /// Idempotent; concurrent callers block until the one builder finishes.
    pub fn freeze(&self) {
        self.freeze_latch.call_once(|| {
            let core = self.core.read();
            let frozen = Frozen::build(&core, &self.config);
            let routes = core.registry.len();
            drop(core);
            self.frozen.store(Some(Arc::new(frozen)));
            self.frozen_flag.store(true, Ordering::Release);
            tracing::info!(routes, "router frozen, compiled tables published");
        });
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_flag.load(Ordering::Acquire)
    }

    pub(crate) fn ensure_mutable(&self) -> Result<(), RouterError> {
        if self.is_frozen() {
            return Err(RouterError::RouterFrozen);
        }
        Ok(())
    }

    pub(crate) fn register(
        &self,
        method: &str,
        version: Option<&str>,
        prefix: &str,
        scope_middleware: &[Handler],
        pattern: &str,
        handler: Handler,
    ) -> Result<RouteHandle<'_>, RouterError> {
        self.ensure_mutable()?;

        let full = compose_pattern(prefix, pattern);
        let parsed = RoutePattern::parse(&full)?;

        let mut core = self.core.write();
        // A freeze may have completed while this thread waited on the lock.
        self.ensure_mutable()?;

        let mut chain: Vec<Handler> =
            Vec::with_capacity(core.global_middleware.len() + scope_middleware.len() + 1);
        chain.extend(core.global_middleware.iter().cloned());
        chain.extend(scope_middleware.iter().cloned());
        chain.push(handler);

        let id: RouteId = core.registry.len();
        let version_key = version.map(str::to_string);
        let tree = core
            .versions
            .entry(version_key.clone())
            .or_default()
            .entry(method.to_string())
            .or_default();
        insert_route(tree, &parsed, method, id)?;

        core.registry.push(RouteEntry {
            template: Arc::from(full.as_str()),
            pattern: parsed,
            method: method.to_string(),
            version: version_key,
            chain: Arc::from(chain.into_boxed_slice()),
            constraints: Default::default(),
            name: None,
            description: None,
            tags: Vec::new(),
        });
        tracing::debug!(method, pattern = %full, version = ?version, "route registered");

        Ok(RouteHandle { router: self, id })
    }
}

fn compose_pattern(prefix: &str, pattern: &str) -> String {
    if prefix.is_empty() {
        pattern.to_string()
    } else if pattern == "/" {
        prefix.to_string()
    } else {
        format!("{prefix}{pattern}")
    }
}

/// A nested registration scope created by [`Router::group`] or
/// [`Router::version`].
pub struct Scope<'r> {
    router: &'r Router,
    prefix: String,
    version: Option<String>,
    middleware: Vec<Handler>,
}

impl<'r> Scope<'r> {
    /// A child scope. The prefix composes onto this scope's prefix and the
    /// middleware list is inherited.
    pub fn group(&self, prefix: &str) -> Scope<'r> {
        Scope {
            router: self.router,
            prefix: format!("{}{}", self.prefix, prefix),
            version: self.version.clone(),
            middleware: self.middleware.clone(),
        }
    }

    /// Appends scope middleware, applied to routes registered through this
    /// scope (and scopes derived from it) after the call.
    pub fn middleware<F>(mut self, middleware: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn route<F>(&self, method: &str, pattern: &str, handler: F) -> Result<RouteHandle<'r>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.router.register(
            method,
            self.version.as_deref(),
            &self.prefix,
            &self.middleware,
            pattern,
            Arc::new(handler),
        )
    }

    pub fn get<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'r>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("GET", pattern, handler)
    }

    pub fn post<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'r>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("POST", pattern, handler)
    }

    pub fn put<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'r>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("PUT", pattern, handler)
    }

    pub fn delete<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'r>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("DELETE", pattern, handler)
    }

    pub fn patch<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'r>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("PATCH", pattern, handler)
    }

    pub fn head<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'r>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("HEAD", pattern, handler)
    }

    pub fn options<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'r>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("OPTIONS", pattern, handler)
    }

    pub fn any<F>(&self, pattern: &str, handler: F) -> Result<RouteHandle<'r>, RouterError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route("", pattern, handler)
    }
}

/// Fluent handle returned by registration, for attaching constraints and
/// metadata to the route just registered.
pub struct RouteHandle<'r> {
    router: &'r Router,
    id: RouteId,
}

impl std::fmt::Debug for RouteHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteHandle").field("id", &self.id).finish()
    }
}

impl RouteHandle<'_> {
    /// Attaches an anchored regex constraint to `param`. The regex compiles
    /// here, at registration; a compile failure never reaches matching.
    pub fn constrain(self, param: &str, regex: &str) -> Result<Self, RouterError> {
        let validator = Validator::regex(param, regex)?;
        self.attach(param, validator)
    }

    /// Attaches a typed predicate constraint to `param`.
    pub fn constrain_typed(self, param: &str, kind: TypedKind) -> Result<Self, RouterError> {
        self.attach(param, Validator::typed(kind))
    }

    /// Names the route; the name is observable through
    /// [`Context::matched_route_name`].
    pub fn set_name(self, name: &str) -> Result<Self, RouterError> {
        self.router.ensure_mutable()?;
        self.router.core.write().registry[self.id].name = Some(Arc::from(name));
        Ok(self)
    }

    pub fn set_description(self, description: &str) -> Result<Self, RouterError> {
        self.router.ensure_mutable()?;
        self.router.core.write().registry[self.id].description = Some(description.to_string());
        Ok(self)
    }

    pub fn set_tags<I, S>(self, tags: I) -> Result<Self, RouterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.router.ensure_mutable()?;
        self.router.core.write().registry[self.id].tags =
            tags.into_iter().map(Into::into).collect();
        Ok(self)
    }

    fn attach(self, param: &str, validator: Validator) -> Result<Self, RouterError> {
        self.router.ensure_mutable()?;
        let mut core = self.router.core.write();
        let entry = &mut core.registry[self.id];
        if !entry.pattern.binds(param) {
            return Err(RouterError::UnknownParam {
                param: param.to_string(),
                pattern: entry.pattern.raw().to_string(),
            });
        }
        entry.constraints.insert(param, validator);
        Ok(self)
    }
}
