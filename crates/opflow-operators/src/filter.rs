//! Filter operation: forwards the item unchanged or drops it.

use async_trait::async_trait;
use opflow_core::context::Context;

use crate::traits::Operation;

pub struct Filter<P> {
    predicate: P,
}

impl<P> Filter<P> {
    pub fn new<T>(predicate: P) -> Self
    where
        P: Fn(&T) -> bool,
    {
        Self { predicate }
    }
}

#[async_trait]
impl<T, P> Operation<T, T> for Filter<P>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "filter"
    }

    async fn apply(&self, _ctx: &Context, item: T) -> Option<T> {
        if (self.predicate)(&item) {
            Some(item)
        } else {
            None
        }
    }
}
