//! Operator: configuration surface and the `exec` entry point.
//!
//! Behavior:
//! - Configured while `Idle`; `exec` snapshots the configuration, so setter
//!   calls made after launch do not reach the running pool.
//! - The output channel exists from construction and is never replaced;
//!   consumers may subscribe before `exec`.
//! - `exec` validates, spawns the pool, and returns without waiting.
//! - A second `exec` is rejected with `ExecError::AlreadyStarted`.
//! - `set_concurrency(0)` is rejected; the previous value stays.
//! - A panic inside the operation ends only the worker that hit it.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use opflow_core::prelude::{Context, OperatorConfig};
use opflow_operators::{OpFunc, Operation};

use crate::metrics::{emit_span, ExecStats, StatsSnapshot};
use crate::scheduler::{self, Pool};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("no operation installed")]
    MissingOperation,
    #[error("no input stream installed")]
    MissingInput,
    #[error("operator already started")]
    AlreadyStarted,
    #[error("operator not started")]
    NotStarted,
    #[error("no tokio runtime: {0}")]
    NoRuntime(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("internal invariant failed: {0}")]
    Invariant(String),
    #[error("join: {0}")]
    Join(String),
}

impl From<opflow_core::Error> for ExecError {
    fn from(e: opflow_core::Error) -> Self {
        match e {
            opflow_core::Error::Config(msg) => ExecError::Config(msg),
            opflow_core::Error::Invariant(msg) => ExecError::Invariant(msg),
        }
    }
}

/// Lifecycle: `Idle` -> `Running` -> `Done`, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OperatorState {
    Idle = 0,
    Running = 1,
    /// Output closed and every worker joined.
    Done = 2,
}

impl OperatorState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => OperatorState::Idle,
            1 => OperatorState::Running,
            _ => OperatorState::Done,
        }
    }
}

/// A single pipeline stage applying an `Operation` to every input item with
/// a pool of concurrent workers.
pub struct Operator<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    ctx: Context,
    operation: Option<Arc<dyn Operation<I, O>>>,
    concurrency: usize,
    input: Option<Receiver<I>>,
    /// Taken by `exec`; `None` afterwards.
    output_tx: Option<Sender<O>>,
    output_rx: Receiver<O>,
    state: Arc<AtomicU8>,
    stats: Arc<ExecStats>,
    closer: Option<JoinHandle<()>>,
}

impl<I, O> Operator<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new(ctx: Context) -> Self {
        let cfg = OperatorConfig::default();
        Self::build(ctx, &cfg)
    }

    pub fn with_config(ctx: Context, cfg: &OperatorConfig) -> Result<Self, ExecError> {
        cfg.validate()?;
        Ok(Self::build(ctx, cfg))
    }

    fn build(ctx: Context, cfg: &OperatorConfig) -> Self {
        let (output_tx, output_rx) = match cfg.output_capacity {
            Some(cap) => async_channel::bounded(cap),
            None => async_channel::unbounded(),
        };
        Self {
            ctx,
            operation: None,
            concurrency: cfg.concurrency,
            input: None,
            output_tx: Some(output_tx),
            output_rx,
            state: Arc::new(AtomicU8::new(OperatorState::Idle as u8)),
            stats: Arc::new(ExecStats::new()),
            closer: None,
        }
    }

    pub fn set_operation<Op>(&mut self, op: Op)
    where
        Op: Operation<I, O>,
    {
        self.operation = Some(Arc::new(op));
    }

    /// Install a synchronous closure as the operation.
    pub fn set_operation_fn<F>(&mut self, f: F)
    where
        F: Fn(&Context, I) -> Option<O> + Send + Sync + 'static,
    {
        self.set_operation(OpFunc::new(f));
    }

    pub fn set_concurrency(&mut self, n: usize) -> Result<(), ExecError> {
        if n == 0 {
            return Err(ExecError::Config("concurrency must be at least 1".into()));
        }
        self.concurrency = n;
        Ok(())
    }

    pub fn set_input(&mut self, input: Receiver<I>) {
        self.input = Some(input);
    }

    /// The output stream. Always the same channel; it closes once the run is done.
    pub fn output(&self) -> Receiver<O> {
        self.output_rx.clone()
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn has_operation(&self) -> bool {
        self.operation.is_some()
    }

    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn state(&self) -> OperatorState {
        OperatorState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Validate the configuration and launch the worker pool.
    ///
    /// Returns as soon as the workers are spawned. Cancelling either `ctx`
    /// or the context given at construction stops the run. Must be called
    /// from within a tokio runtime.
    pub fn exec(&mut self, ctx: &Context) -> Result<(), ExecError> {
        if self.state() != OperatorState::Idle {
            return Err(ExecError::AlreadyStarted);
        }
        let operation = self
            .operation
            .as_ref()
            .map(Arc::clone)
            .ok_or(ExecError::MissingOperation)?;
        let input = self.input.clone().ok_or(ExecError::MissingInput)?;
        let runtime = Handle::try_current().map_err(|e| ExecError::NoRuntime(e.to_string()))?;
        let output = self.output_tx.take().ok_or_else(|| {
            ExecError::Invariant("output sender missing on an idle operator".into())
        })?;

        let workers = self.concurrency;
        let (run_ctx, run_cancel) = Context::merge(&self.ctx, ctx);

        #[cfg(feature = "tracing")]
        tracing::debug!(workers, op = operation.name(), "launching operator");

        self.state
            .store(OperatorState::Running as u8, Ordering::Release);
        emit_span("operator launched", &self.stats.snapshot());

        let pool = Pool {
            ctx: run_ctx,
            operation,
            input,
            output,
            stats: Arc::clone(&self.stats),
        };
        self.closer = Some(scheduler::launch(
            &runtime,
            pool,
            workers,
            run_cancel,
            Arc::clone(&self.state),
        ));
        Ok(())
    }

    /// Wait until the output is closed and every worker has been joined.
    pub async fn join(&mut self) -> Result<StatsSnapshot, ExecError> {
        match self.closer.take() {
            Some(handle) => handle
                .await
                .map_err(|e| ExecError::Join(e.to_string()))?,
            None if self.state() == OperatorState::Idle => return Err(ExecError::NotStarted),
            None => {}
        }
        Ok(self.stats.snapshot())
    }
}
