#![forbid(unsafe_code)]
//! opflow-operators: the per-item transformation capability.
//!
//! Design intent:
//! - An `Operation` maps one input to zero or one output (`None` drops the item).
//! - Operations hold no executor state; the executor may call the same
//!   operation from several workers at once, so any interior mutability is
//!   the implementor's to synchronize.
//! - Closures are first-class via `OpFunc` (sync) and `AsyncOpFunc` (async).

pub mod filter;
pub mod func;
pub mod map;
pub mod traits;

pub use filter::Filter;
pub use func::{AsyncOpFunc, OpFunc};
pub use map::Map;
pub use traits::Operation;
