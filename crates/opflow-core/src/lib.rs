#![forbid(unsafe_code)]
//! opflow-core: cancellation contexts, operator configuration, and errors.
//!
//! Everything here is shared by the operation and executor crates. The only
//! runtime dependency is tokio's timer/sync layer, needed so a `Context` can
//! be awaited.

pub mod config;
pub mod context;
pub mod error;
pub mod prelude;

pub use config::OperatorConfig;
pub use context::{CancelHandle, Context};
pub use error::{Error, Result};
