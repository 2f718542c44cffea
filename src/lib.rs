#![forbid(unsafe_code)]
//! opflow: a concurrent, cancellable stream operator.
//!
//! An [`Operator`] reads values from a multi-consumer input channel, applies
//! an [`Operation`] to each one on a pool of tokio workers, and forwards
//! every non-dropped result to its output channel. The output closes exactly
//! once, after the last worker has finished.
//!
//! ```no_run
//! use opflow::{Context, Operator};
//!
//! # async fn demo() -> Result<(), opflow::ExecError> {
//! let (tx, rx) = async_channel::unbounded();
//! let mut op: Operator<Vec<&str>, usize> = Operator::new(Context::background());
//! op.set_operation_fn(|_ctx, group| Some(group.len()));
//! op.set_concurrency(4)?;
//! op.set_input(rx);
//!
//! let output = op.output();
//! op.exec(&Context::background())?;
//!
//! tx.send(vec!["a", "b"]).await.ok();
//! tx.close();
//! while let Ok(n) = output.recv().await {
//!     println!("{n}");
//! }
//! # Ok(())
//! # }
//! ```

pub use opflow_core::{CancelHandle, Context, OperatorConfig};
pub use opflow_exec::{ExecError, ExecStats, Operator, OperatorState, StatsSnapshot};
pub use opflow_operators::{AsyncOpFunc, Filter, Map, OpFunc, Operation};

pub use async_channel::{Receiver, Sender};
