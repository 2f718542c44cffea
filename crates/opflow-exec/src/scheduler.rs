//! Worker pool: N tasks competing for one input, one closer joining them.
//!
//! Every worker owns clones of the input receiver and the output sender.
//! `async_channel` hands each input value to exactly one receiver, so the pool
//! needs no locks of its own. The closer awaits every worker handle before it
//! closes the output, which makes the close happen once and only after the
//! last send.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use opflow_core::context::{CancelHandle, Context};
use opflow_operators::Operation;

use crate::metrics::{emit_span, ExecStats};
use crate::operator::OperatorState;

/// Everything a worker needs, captured once at launch.
pub(crate) struct Pool<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub ctx: Context,
    pub operation: Arc<dyn Operation<I, O>>,
    pub input: Receiver<I>,
    pub output: Sender<O>,
    pub stats: Arc<ExecStats>,
}

/// Spawn `workers` tasks plus the closer; returns the closer's handle.
///
/// `run_cancel` belongs to the execution-scoped context and is fired by the
/// closer so any context linker tasks exit with the run.
pub(crate) fn launch<I, O>(
    runtime: &Handle,
    pool: Pool<I, O>,
    workers: usize,
    run_cancel: CancelHandle,
    state: Arc<AtomicU8>,
) -> JoinHandle<()>
where
    I: Send + 'static,
    O: Send + 'static,
{
    let mut handles = Vec::with_capacity(workers);
    for id in 0..workers {
        handles.push(runtime.spawn(run_worker(
            id,
            pool.ctx.clone(),
            Arc::clone(&pool.operation),
            pool.input.clone(),
            pool.output.clone(),
            Arc::clone(&pool.stats),
        )));
    }

    let Pool { output, stats, .. } = pool;

    runtime.spawn(async move {
        for (id, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    stats.record_worker_panicked();
                    #[cfg(feature = "tracing")]
                    tracing::warn!(worker = id, "worker panicked; its in-flight item is lost");
                } else {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(worker = id, error = %e, "worker did not complete");
                }
            }
            #[cfg(not(feature = "tracing"))]
            let _ = id;
        }

        // false only if a consumer closed the channel from its side first
        let _closed_here = output.close();
        run_cancel.cancel();
        state.store(OperatorState::Done as u8, Ordering::Release);

        emit_span("output closed", &stats.snapshot());
    })
}

async fn run_worker<I, O>(
    id: usize,
    ctx: Context,
    operation: Arc<dyn Operation<I, O>>,
    input: Receiver<I>,
    output: Sender<O>,
    stats: Arc<ExecStats>,
) where
    I: Send + 'static,
    O: Send + 'static,
{
    #[cfg(feature = "tracing")]
    tracing::trace!(worker = id, op = operation.name(), "worker started");

    loop {
        let item = tokio::select! {
            biased;
            _ = ctx.cancelled() => break,
            next = input.recv() => match next {
                Ok(item) => item,
                // closed and drained
                Err(_) => break,
            },
        };
        stats.record_received();

        let Some(out) = operation.apply(&ctx, item).await else {
            stats.record_dropped();
            continue;
        };

        // A finished result is delivered whenever the output has room; only a
        // send that would block is raced against cancellation.
        let sent = match output.try_send(out) {
            Ok(()) => true,
            Err(TrySendError::Closed(_)) => false,
            Err(TrySendError::Full(out)) => tokio::select! {
                biased;
                _ = ctx.cancelled() => false,
                res = output.send(out) => res.is_ok(),
            },
        };
        if !sent {
            break;
        }
        stats.record_forwarded();
    }

    stats.record_worker_finished();

    #[cfg(feature = "tracing")]
    tracing::trace!(worker = id, cancelled = ctx.is_cancelled(), "worker stopped");
    #[cfg(not(feature = "tracing"))]
    let _ = id;
}
