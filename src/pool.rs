//! Size-classed context pool.
//!
//! Contexts are reused across requests to keep the dispatch path free of
//! allocation. Classes are keyed by the matched route's parameter count so a
//! route with many parameters does not bloat the contexts serving the
//! parameterless majority. Each class is an independent mutex-guarded stack;
//! a context always returns to the class it was taken from.

use crate::context::Context;
use parking_lot::Mutex;

/// Idle contexts retained per class; anything beyond is dropped on release.
const MAX_IDLE_PER_CLASS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PoolClass {
    Small,
    Medium,
    Large,
}

impl PoolClass {
    /// Classifies by the expected parameter count of the route being served.
    pub(crate) fn for_param_count(count: usize) -> Self {
        match count {
            0..=2 => PoolClass::Small,
            3..=6 => PoolClass::Medium,
            _ => PoolClass::Large,
        }
    }

    fn index(self) -> usize {
        match self {
            PoolClass::Small => 0,
            PoolClass::Medium => 1,
            PoolClass::Large => 2,
        }
    }
}

pub(crate) struct ContextPool {
    classes: [Mutex<Vec<Box<Context>>>; 3],
    cancellation_check: bool,
}

impl ContextPool {
    pub(crate) fn new(cancellation_check: bool) -> Self {
        Self {
            classes: [
                Mutex::new(Vec::new()),
                Mutex::new(Vec::new()),
                Mutex::new(Vec::new()),
            ],
            cancellation_check,
        }
    }

    /// Pre-populates every class so the first requests skip allocation.
    pub(crate) fn warm(&self, per_class: usize) {
        for class in [PoolClass::Small, PoolClass::Medium, PoolClass::Large] {
            let mut stack = self.classes[class.index()].lock();
            while stack.len() < per_class.min(MAX_IDLE_PER_CLASS) {
                stack.push(Box::new(Context::new(self.cancellation_check, class)));
            }
        }
    }

    pub(crate) fn acquire(&self, class: PoolClass) -> Box<Context> {
        if let Some(ctx) = self.classes[class.index()].lock().pop() {
            return ctx;
        }
        Box::new(Context::new(self.cancellation_check, class))
    }

    /// Resets the context and returns it to its class stack.
    pub(crate) fn release(&self, mut ctx: Box<Context>) {
        ctx.reset();
        let mut stack = self.classes[ctx.class().index()].lock();
        if stack.len() < MAX_IDLE_PER_CLASS {
            stack.push(ctx);
        }
    }

    #[cfg(test)]
    fn idle(&self, class: PoolClass) -> usize {
        self.classes[class.index()].lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_boundaries() {
        assert_eq!(PoolClass::for_param_count(0), PoolClass::Small);
        assert_eq!(PoolClass::for_param_count(2), PoolClass::Small);
        assert_eq!(PoolClass::for_param_count(3), PoolClass::Medium);
        assert_eq!(PoolClass::for_param_count(6), PoolClass::Medium);
        assert_eq!(PoolClass::for_param_count(7), PoolClass::Large);
    }

    #[test]
    fn test_warm_and_reuse() {
        let pool = ContextPool::new(true);
        pool.warm(4);
        assert_eq!(pool.idle(PoolClass::Small), 4);
        assert_eq!(pool.idle(PoolClass::Large), 4);

        let ctx = pool.acquire(PoolClass::Small);
        assert_eq!(pool.idle(PoolClass::Small), 3);
        pool.release(ctx);
        assert_eq!(pool.idle(PoolClass::Small), 4);
    }

    #[test]
    fn test_released_context_is_clean() {
        let pool = ContextPool::new(true);
        let mut ctx = pool.acquire(PoolClass::Small);
        ctx.bind_params(&[("id", "42")]);
        ctx.response_mut().set_status(500).write_str("boom");
        pool.release(ctx);

        let ctx = pool.acquire(PoolClass::Small);
        assert_eq!(ctx.param("id"), None);
        assert_eq!(ctx.param_count(), 0);
        assert_eq!(ctx.response().status(), 200);
        assert!(ctx.response().body().is_empty());
    }

    #[test]
    fn test_acquire_beyond_idle_allocates() {
        let pool = ContextPool::new(false);
        let a = pool.acquire(PoolClass::Medium);
        let b = pool.acquire(PoolClass::Medium);
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.idle(PoolClass::Medium), 2);
    }
}
