//! Map operation: every item produces exactly one output.

use async_trait::async_trait;
use opflow_core::context::Context;

use crate::traits::Operation;

pub struct Map<F> {
    f: F,
}

impl<F> Map<F> {
    pub fn new<I, O>(f: F) -> Self
    where
        F: Fn(I) -> O,
    {
        Self { f }
    }
}

#[async_trait]
impl<I, O, F> Operation<I, O> for Map<F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "map"
    }

    async fn apply(&self, _ctx: &Context, item: I) -> Option<O> {
        Some((self.f)(item))
    }
}
