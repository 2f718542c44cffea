#![forbid(unsafe_code)]
//! opflow-exec: operator state, the worker-pool executor, and run metrics.
//!
//! An `Operator` is configured while idle, launched with `exec`, and runs
//! its workers as tokio tasks on the caller's runtime. The output channel is
//! closed exactly once, after every worker has been joined.

pub mod metrics;
pub mod operator;
pub mod scheduler;

pub use metrics::{ExecStats, StatsSnapshot};
pub use operator::{ExecError, Operator, OperatorState};

pub use async_channel::{Receiver, Sender};
