//! Convenient re-exports for downstream crates.

pub use crate::config::OperatorConfig;
pub use crate::context::{CancelHandle, Context};
pub use crate::error::{Error, Result};
