//! Cancellation/deadline carrier threaded through operators and operations.
//!
//! A `Context` is cheap to clone; every clone observes the same signal.
//! Cancellation is one-shot and idempotent, and flows from parent to child
//! only. Deadlines are measured on tokio's clock so paused-time tests can
//! drive them.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

/// Fires the cancellation of the context it was created with.
///
/// Reports the same state as that context, deadline included.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelHandle {
    /// Idempotent; a second call is a no-op.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        expired(&self.token, self.deadline)
    }
}

fn expired(token: &CancellationToken, deadline: Option<Instant>) -> bool {
    token.is_cancelled() || deadline.is_some_and(|at| Instant::now() >= at)
}

impl Context {
    /// Root context: never cancelled, no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Child context cancelled by the returned handle or by `self`.
    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        let token = self.token.child_token();
        let ctx = Context {
            token: token.clone(),
            deadline: self.deadline,
        };
        let handle = CancelHandle {
            token,
            deadline: self.deadline,
        };
        (ctx, handle)
    }

    /// Child context that expires at `at`, or earlier if `self` does.
    pub fn with_deadline(&self, at: Instant) -> (Context, CancelHandle) {
        let (mut ctx, mut handle) = self.with_cancel();
        let deadline = Some(match self.deadline {
            Some(parent) => parent.min(at),
            None => at,
        });
        ctx.deadline = deadline;
        handle.deadline = deadline;
        (ctx, handle)
    }

    pub fn with_timeout(&self, timeout: Duration) -> (Context, CancelHandle) {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Context cancelled as soon as either `a` or `b` is.
    ///
    /// The earlier deadline wins. `b`'s cancellation is forwarded by a small
    /// linker task, so this must be called from within a tokio runtime. The
    /// linker exits once the merged context is cancelled; callers release it
    /// by cancelling the returned handle when the merged context is no longer
    /// needed.
    pub fn merge(a: &Context, b: &Context) -> (Context, CancelHandle) {
        let token = a.token.child_token();
        let deadline = match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => Some(x.min(y)),
            (x, y) => x.or(y),
        };

        if b.token.is_cancelled() {
            token.cancel();
        } else {
            let link = token.clone();
            let other = b.token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = other.cancelled() => link.cancel(),
                    _ = link.cancelled() => {}
                }
            });
        }

        let ctx = Context {
            token: token.clone(),
            deadline,
        };
        (ctx, CancelHandle { token, deadline })
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once cancelled or past the deadline.
    pub fn is_cancelled(&self) -> bool {
        expired(&self.token, self.deadline)
    }

    /// Resolves when the context is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(at) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(at) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}
