//! Operation trait.
//!
//! The executor calls `apply(...)` once per input item. A worker never has
//! two calls in flight, but separate workers share one operation and call it
//! concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use opflow_core::context::Context;

/// Trait that all operations must implement.
///
/// Invariants:
/// - `Some(v)` forwards `v` downstream; `None` drops the item silently.
/// - Long-running implementations should watch `ctx` and return early once
///   it is cancelled. The executor never preempts a call.
#[async_trait]
pub trait Operation<I, O>: Send + Sync + 'static
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Human-readable name, used in logs.
    fn name(&self) -> &str {
        "operation"
    }

    async fn apply(&self, ctx: &Context, item: I) -> Option<O>;
}

#[async_trait]
impl<I, O, T> Operation<I, O> for Arc<T>
where
    I: Send + 'static,
    O: Send + 'static,
    T: Operation<I, O> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn apply(&self, ctx: &Context, item: I) -> Option<O> {
        (**self).apply(ctx, item).await
    }
}
