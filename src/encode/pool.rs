use std::sync::LazyLock;

use crossbeam::queue::ArrayQueue;
use tracing::warn;

use super::EncodeContext;
use crate::constants::{CONTEXT_POOL_SIZE, MAX_POOLED_BUFFER};

/// Bounded pool of reusable encode contexts.
///
/// A miss allocates a fresh context; a release into a full pool drops it.
pub struct ContextPool {
    contexts: ArrayQueue<EncodeContext>,
}

impl ContextPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            contexts: ArrayQueue::new(capacity),
        }
    }

    pub fn acquire(&self) -> EncodeContext {
        self.contexts.pop().unwrap_or_default()
    }

    /// Returns a context for reuse. Contexts whose buffer grew past
    /// [`MAX_POOLED_BUFFER`] are dropped instead of pinning that memory.
    pub fn release(&self, mut ctx: EncodeContext) {
        if ctx.capacity() > MAX_POOLED_BUFFER {
            warn!(
                "dropping encode buffer of {} bytes instead of pooling it",
                ctx.capacity()
            );
            return;
        }
        ctx.reset();
        let _ = self.contexts.push(ctx);
    }

    pub fn available(&self) -> usize {
        self.contexts.len()
    }
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new(CONTEXT_POOL_SIZE)
    }
}

static POOL: LazyLock<ContextPool> = LazyLock::new(ContextPool::default);

/// A pooled context that goes back to its pool when dropped, whether the
/// encode succeeded or not.
pub(crate) struct Pooled<'p> {
    pool: &'p ContextPool,
    ctx: Option<EncodeContext>,
}

impl Pooled<'static> {
    pub(crate) fn acquire() -> Self {
        Pooled::from_pool(&POOL)
    }
}

impl<'p> Pooled<'p> {
    pub(crate) fn from_pool(pool: &'p ContextPool) -> Self {
        Self {
            pool,
            ctx: Some(pool.acquire()),
        }
    }

    pub(crate) fn ctx(&mut self) -> &mut EncodeContext {
        self.ctx.get_or_insert_with(EncodeContext::default)
    }
}

impl Drop for Pooled<'_> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.pool.release(ctx);
        }
    }
}
