//! Concurrency-safe pool of reusable contexts.
//!
//! # Responsibilities
//! - Lend out idle contexts, allocating new ones on demand
//! - Reset every returned context to a detached state
//! - Bound the number of idle contexts kept around
//!
//! # Design Decisions
//! - Acquisition is scoped: [`PooledContext`] returns its context on drop,
//!   so release happens on every exit path, panics included
//! - No ordering or fairness between acquirers

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::Span;

use crate::context::{Context, ServerHandle};
use crate::observability::metrics;

/// Pool of contexts belonging to one server.
pub struct ContextPool {
    idle: Mutex<Vec<Context>>,
    logger: Span,
    server: Arc<ServerHandle>,
    /// Upper bound on idle contexts retained after release.
    max_idle: usize,
    /// Total contexts ever allocated by this pool.
    created: AtomicUsize,
}

impl ContextPool {
    pub fn new(logger: Span, server: Arc<ServerHandle>, max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            logger,
            server,
            max_idle,
            created: AtomicUsize::new(0),
        }
    }

    /// Borrow a detached context. It goes back to the pool when the guard drops.
    pub fn acquire(self: &Arc<Self>) -> PooledContext {
        let recycled = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();

        let ctx = match recycled {
            Some(ctx) => ctx,
            None => {
                self.created.fetch_add(1, Ordering::Relaxed);
                metrics::record_context_created();
                Context::new(self.logger.clone(), Arc::clone(&self.server))
            }
        };

        PooledContext {
            ctx: Some(ctx),
            pool: Arc::clone(self),
        }
    }

    /// Reset `ctx` and make it available to the next acquirer.
    pub fn release(&self, mut ctx: Context) {
        ctx.reset();

        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(ctx);
        }
    }

    /// Contexts currently waiting in the pool.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ContextPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextPool")
            .field("idle", &self.idle_count())
            .field("created", &self.created_count())
            .field("max_idle", &self.max_idle)
            .finish()
    }
}

/// A context on loan from a [`ContextPool`].
pub struct PooledContext {
    ctx: Option<Context>,
    pool: Arc<ContextPool>,
}

impl Deref for PooledContext {
    type Target = Context;

    fn deref(&self) -> &Context {
        // Only `drop` takes the context out.
        match self.ctx.as_ref() {
            Some(ctx) => ctx,
            None => unreachable!("pooled context used after release"),
        }
    }
}

impl DerefMut for PooledContext {
    fn deref_mut(&mut self) -> &mut Context {
        match self.ctx.as_mut() {
            Some(ctx) => ctx,
            None => unreachable!("pooled context used after release"),
        }
    }
}

impl Drop for PooledContext {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.pool.release(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Exchange;
    use axum::http::Request;
    use bytes::Bytes;
    use std::thread;

    fn pool(max_idle: usize) -> Arc<ContextPool> {
        Arc::new(ContextPool::new(
            Span::none(),
            Arc::new(ServerHandle::default()),
            max_idle,
        ))
    }

    fn exchange(marker: &str) -> Exchange {
        Exchange::new(
            Request::builder()
                .uri(format!("/{marker}"))
                .body(Bytes::new())
                .unwrap(),
        )
    }

    #[test]
    fn released_context_is_reused_detached() {
        let pool = pool(8);

        {
            let mut ctx = pool.acquire();
            ctx.attach(exchange("first"));
            ctx.insert(String::from("secret"));
        }
        assert_eq!(pool.idle_count(), 1);

        let ctx = pool.acquire();
        assert_eq!(pool.created_count(), 1);
        assert!(!ctx.is_attached());
        assert!(ctx.get::<String>().is_none());
    }

    #[test]
    fn repeated_cycles_never_leak_the_previous_exchange() {
        let pool = pool(2);

        for i in 0..50 {
            let mut ctx = pool.acquire();
            assert!(!ctx.is_attached(), "iteration {i} started attached");
            ctx.attach(exchange(&i.to_string()));
            assert_eq!(ctx.path().unwrap(), format!("/{i}"));
        }
        assert_eq!(pool.created_count(), 1);
    }

    #[test]
    fn release_on_panic() {
        let pool = pool(4);
        let p = Arc::clone(&pool);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let mut ctx = p.acquire();
            ctx.attach(exchange("boom"));
            panic!("handler blew up");
        }));

        assert!(result.is_err());
        assert_eq!(pool.idle_count(), 1);
        assert!(!pool.acquire().is_attached());
    }

    #[test]
    fn idle_contexts_are_bounded() {
        let pool = pool(1);
        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);
        assert_eq!(pool.idle_count(), 1);
        assert_eq!(pool.created_count(), 2);
    }

    #[test]
    fn concurrent_acquirers_see_only_their_own_exchange() {
        let pool = pool(16);
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for i in 0..200 {
                        let marker = format!("{t}-{i}");
                        let mut ctx = pool.acquire();
                        assert!(!ctx.is_attached());
                        ctx.attach(exchange(&marker));
                        thread::yield_now();
                        assert_eq!(ctx.path().unwrap(), format!("/{marker}"));
                    }
                })
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }

        assert!(pool.created_count() <= 8);
        assert_eq!(pool.idle_count(), pool.created_count());
    }
}
