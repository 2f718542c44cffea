//! Run counters and tracing hooks.
//!
//! Counters are plain atomics updated by workers; `snapshot()` is advisory
//! while the operator is running and exact once it is `Done`.
//! Wire these up to OpenTelemetry/Prometheus in the binary layer.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct ExecStats {
    received: AtomicU64,
    forwarded: AtomicU64,
    dropped: AtomicU64,
    workers_finished: AtomicUsize,
    panicked_workers: AtomicUsize,
}

/// Point-in-time copy of `ExecStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Items pulled from the input.
    pub received: u64,
    /// Items the operation produced and the output accepted.
    pub forwarded: u64,
    /// Items the operation dropped.
    pub dropped: u64,
    /// Workers that returned normally.
    pub workers_finished: usize,
    /// Workers terminated by a panic in the operation.
    pub panicked_workers: usize,
}

impl ExecStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_worker_finished(&self) {
        self.workers_finished.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_worker_panicked(&self) {
        self.panicked_workers.fetch_add(1, Ordering::AcqRel);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            workers_finished: self.workers_finished.load(Ordering::Acquire),
            panicked_workers: self.panicked_workers.load(Ordering::Acquire),
        }
    }
}

impl StatsSnapshot {
    /// Items lost between input and output: panicked in-flight items, or
    /// results discarded because cancellation fired while the output was full.
    pub fn unaccounted(&self) -> u64 {
        self.received
            .saturating_sub(self.forwarded)
            .saturating_sub(self.dropped)
    }
}

#[cfg(feature = "tracing")]
pub fn emit_span(event: &str, stats: &StatsSnapshot) {
    let span = tracing::span!(tracing::Level::DEBUG, "opflow", event);
    let _enter = span.enter();
    tracing::debug!(
        received = stats.received,
        forwarded = stats.forwarded,
        dropped = stats.dropped,
        workers_finished = stats.workers_finished,
        panicked_workers = stats.panicked_workers,
        "{event}"
    );
}

#[cfg(not(feature = "tracing"))]
pub fn emit_span(_event: &str, _stats: &StatsSnapshot) { /* no-op */
}
