//! Closure adapters.

use std::future::Future;

use async_trait::async_trait;
use opflow_core::context::Context;

use crate::traits::Operation;

/// Wraps a synchronous closure `Fn(&Context, I) -> Option<O>`.
///
/// The closure runs directly on a worker task, so it should not block for
/// long; use `AsyncOpFunc` for work that awaits.
pub struct OpFunc<F> {
    name: &'static str,
    f: F,
}

impl<F> OpFunc<F> {
    pub fn new<I, O>(f: F) -> Self
    where
        F: Fn(&Context, I) -> Option<O>,
    {
        Self { name: "op_func", f }
    }

    pub fn named<I, O>(name: &'static str, f: F) -> Self
    where
        F: Fn(&Context, I) -> Option<O>,
    {
        Self { name, f }
    }
}

#[async_trait]
impl<I, O, F> Operation<I, O> for OpFunc<F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(&Context, I) -> Option<O> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    async fn apply(&self, ctx: &Context, item: I) -> Option<O> {
        (self.f)(ctx, item)
    }
}

/// Wraps an async closure `Fn(Context, I) -> impl Future<Output = Option<O>>`.
///
/// The context is passed by value so the returned future can own it.
pub struct AsyncOpFunc<F> {
    name: &'static str,
    f: F,
}

impl<F> AsyncOpFunc<F> {
    pub fn new<I, O, Fut>(f: F) -> Self
    where
        F: Fn(Context, I) -> Fut,
        Fut: Future<Output = Option<O>>,
    {
        Self {
            name: "async_op_func",
            f,
        }
    }

    pub fn named<I, O, Fut>(name: &'static str, f: F) -> Self
    where
        F: Fn(Context, I) -> Fut,
        Fut: Future<Output = Option<O>>,
    {
        Self { name, f }
    }
}

#[async_trait]
impl<I, O, F, Fut> Operation<I, O> for AsyncOpFunc<F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(Context, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<O>> + Send + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    async fn apply(&self, ctx: &Context, item: I) -> Option<O> {
        (self.f)(ctx.clone(), item).await
    }
}
