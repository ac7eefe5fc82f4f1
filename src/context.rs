//! The per-request context.
//!
//! A context is obtained from the pool for exactly one dispatch. It carries
//! the request and response handles, the bound path parameters, and the
//! middleware cursor that `next`/`abort` drive. Handlers share one mutable
//! context; the chain itself is an immutable `Arc` slice, so a handler
//! invoking `next` re-enters the loop without aliasing the handler storage.

use crate::http::{Request, Response};
use crate::pool::PoolClass;
use ahash::AHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// A handler or middleware step. Middleware calls [`Context::next`] to run
/// the rest of the chain and [`Context::abort`] to short-circuit it; a plain
/// handler just writes the response and returns.
pub type Handler = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Inline parameter capacity. Patterns binding more spill to a map.
pub(crate) const INLINE_PARAMS: usize = 8;

/// Path parameter storage: an inline array scanned linearly for the common
/// few-parameter case, and a map that takes over entirely for the rare
/// pattern with more than eight bindings.
#[derive(Debug, Default)]
pub(crate) struct ParamStore {
    inline: SmallVec<[(String, String); INLINE_PARAMS]>,
    spill: AHashMap<String, String>,
    spilled: bool,
}

impl ParamStore {
    pub(crate) fn bind(&mut self, captures: &[(&str, &str)]) {
        if captures.len() > INLINE_PARAMS {
            self.spilled = true;
            for (name, value) in captures {
                self.spill.insert((*name).to_string(), (*value).to_string());
            }
        } else {
            for (name, value) in captures {
                self.inline.push(((*name).to_string(), (*value).to_string()));
            }
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        if self.spilled {
            self.spill.get(name).map(String::as_str)
        } else {
            self.inline
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
        }
    }

    pub(crate) fn len(&self) -> usize {
        if self.spilled {
            self.spill.len()
        } else {
            self.inline.len()
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let inline = self.inline.iter().map(|(n, v)| (n.as_str(), v.as_str()));
        let spill = self.spill.iter().map(|(n, v)| (n.as_str(), v.as_str()));
        inline.chain(spill)
    }

    /// Clears values but keeps allocations for the next request.
    pub(crate) fn clear(&mut self) {
        self.inline.clear();
        self.spill.clear();
        self.spilled = false;
    }
}

pub struct Context {
    request: Request,
    response: Response,
    chain: Option<Arc<[Handler]>>,
    index: isize,
    aborted: bool,
    cancellation_check: bool,
    cancelled: bool,
    params: ParamStore,
    template: Option<Arc<str>>,
    route_name: Option<Arc<str>>,
    class: PoolClass,
}

impl Context {
    pub(crate) fn new(cancellation_check: bool, class: PoolClass) -> Self {
        Self {
            request: Request::default(),
            response: Response::new(),
            chain: None,
            index: -1,
            aborted: false,
            cancellation_check,
            cancelled: false,
            params: ParamStore::default(),
            template: None,
            route_name: None,
            class,
        }
    }

    /// The bound value of a path parameter or wildcard.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// All bound parameters, unordered.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter()
    }

    /// The original pattern string of the matched route, `None` on the
    /// not-found chain.
    pub fn route_template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// The configured route name, if one was set at registration.
    pub fn matched_route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Runs the remainder of the chain. Returns once every deeper handler
    /// has returned, so code after `next` observes their effects.
    pub fn next(&mut self) {
        let Some(chain) = self.chain.clone() else {
            return;
        };
        self.index += 1;
        while !self.aborted && (self.index as usize) < chain.len() {
            if self.cancellation_check && self.request.is_cancelled() {
                self.cancelled = true;
                break;
            }
            let handler = Arc::clone(&chain[self.index as usize]);
            handler(self);
            self.index += 1;
        }
    }

    /// Prevents any not-yet-entered handler from running. Handlers already
    /// on the stack still return normally; nothing is unwound.
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    // -- dispatch plumbing --

    pub(crate) fn class(&self) -> PoolClass {
        self.class
    }

    pub(crate) fn bind_params(&mut self, captures: &[(&str, &str)]) {
        self.params.bind(captures);
    }

    pub(crate) fn begin(
        &mut self,
        request: Request,
        chain: Arc<[Handler]>,
        template: Option<Arc<str>>,
        route_name: Option<Arc<str>>,
    ) {
        self.request = request;
        self.chain = Some(chain);
        self.template = template;
        self.route_name = route_name;
        self.index = -1;
    }

    pub(crate) fn run(&mut self) {
        self.index = -1;
        self.next();
    }

    pub(crate) fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub(crate) fn take_response(&mut self) -> Response {
        std::mem::take(&mut self.response)
    }

    /// Release-time reset: no state may leak into the next request.
    pub(crate) fn reset(&mut self) {
        self.request = Request::default();
        self.response.reset();
        self.chain = None;
        self.index = -1;
        self.aborted = false;
        self.cancelled = false;
        self.params.clear();
        self.template = None;
        self.route_name = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    fn chain_of(handlers: Vec<Handler>) -> Arc<[Handler]> {
        Arc::from(handlers.into_boxed_slice())
    }

    fn run_chain(handlers: Vec<Handler>) -> Context {
        let mut ctx = Context::new(true, PoolClass::Small);
        ctx.begin(Request::new("GET", "/x"), chain_of(handlers), None, None);
        ctx.run();
        ctx
    }

    #[test]
    fn test_chain_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handlers: Vec<Handler> = (0..3)
            .map(|i| {
                let log = log.clone();
                Arc::new(move |_: &mut Context| log.lock().unwrap().push(i)) as Handler
            })
            .collect();
        run_chain(handlers);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_next_brackets_inner_handlers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let outer_log = log.clone();
        let outer: Handler = Arc::new(move |ctx: &mut Context| {
            outer_log.lock().unwrap().push("pre");
            ctx.next();
            outer_log.lock().unwrap().push("post");
        });
        let inner_log = log.clone();
        let inner: Handler = Arc::new(move |_: &mut Context| {
            inner_log.lock().unwrap().push("inner");
        });
        run_chain(vec![outer, inner]);
        assert_eq!(*log.lock().unwrap(), vec!["pre", "inner", "post"]);
    }

    #[test]
    fn test_abort_skips_rest_but_epilogue_runs() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let l1 = log.clone();
        let first: Handler = Arc::new(move |ctx: &mut Context| {
            l1.lock().unwrap().push("first-pre");
            ctx.next();
            l1.lock().unwrap().push("first-post");
        });
        let l2 = log.clone();
        let second: Handler = Arc::new(move |ctx: &mut Context| {
            l2.lock().unwrap().push("second");
            ctx.abort();
        });
        let l3 = log.clone();
        let third: Handler = Arc::new(move |_: &mut Context| {
            l3.lock().unwrap().push("third");
        });
        let ctx = run_chain(vec![first, second, third]);
        assert!(ctx.is_aborted());
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first-pre", "second", "first-post"]
        );
    }

    #[test]
    fn test_cancellation_stops_chain_between_handlers() {
        let flag = Arc::new(AtomicBool::new(false));
        let ran_second = Arc::new(AtomicBool::new(false));

        let cancel = flag.clone();
        let first: Handler = Arc::new(move |_: &mut Context| {
            cancel.store(true, Ordering::Relaxed);
        });
        let witness = ran_second.clone();
        let second: Handler = Arc::new(move |_: &mut Context| {
            witness.store(true, Ordering::Relaxed);
        });

        let mut ctx = Context::new(true, PoolClass::Small);
        ctx.begin(
            Request::new("GET", "/x").with_cancellation(flag),
            chain_of(vec![first, second]),
            None,
            None,
        );
        ctx.run();
        assert!(ctx.was_cancelled());
        assert!(!ran_second.load(Ordering::Relaxed));
    }

    #[test]
    fn test_param_store_inline_and_spill() {
        let mut store = ParamStore::default();
        store.bind(&[("a", "1"), ("b", "2")]);
        assert_eq!(store.get("a"), Some("1"));
        assert_eq!(store.get("b"), Some("2"));
        assert_eq!(store.get("c"), None);
        assert_eq!(store.len(), 2);

        store.clear();
        let names: Vec<String> = (0..9).map(|i| format!("p{i}")).collect();
        let captures: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "v")).collect();
        store.bind(&captures);
        assert_eq!(store.len(), 9);
        assert_eq!(store.get("p8"), Some("v"));

        store.clear();
        assert_eq!(store.len(), 0);
        assert_eq!(store.get("p8"), None);
    }
}
