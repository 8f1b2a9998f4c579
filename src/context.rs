// ABOUTME: Per-run context carrying correlation id, run deadline, and cancellation signal
// ABOUTME: Races every network and persistence await against cancellation and the deadline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use healthmetrics_core::errors::SyncError;
use std::future::{pending, Future};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{timeout_at, Instant};
use uuid::Uuid;

/// Sender side of a cancellation signal
#[derive(Debug)]
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
}

impl CancellationHandle {
    /// Signal cancellation to every linked [`CancellationSignal`]
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiver side of a cancellation signal
///
/// A signal whose handle was dropped without cancelling never fires.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    rx: watch::Receiver<bool>,
}

impl CancellationSignal {
    /// Linked handle and signal
    #[must_use]
    pub fn pair() -> (CancellationHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancellationHandle { tx }, Self { rx })
    }

    /// A signal that never fires
    #[must_use]
    pub fn never() -> Self {
        Self::pair().1
    }

    /// Whether cancellation was already signalled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is signalled
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                pending::<()>().await;
            }
        }
    }
}

/// Context for one sync invocation
#[derive(Debug, Clone)]
pub struct SyncContext {
    correlation_id: String,
    deadline: Instant,
    cancel: CancellationSignal,
}

impl SyncContext {
    /// Context with a caller supplied correlation id
    #[must_use]
    pub fn new(correlation_id: impl Into<String>, run_deadline: Duration) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            deadline: Instant::now() + run_deadline,
            cancel: CancellationSignal::never(),
        }
    }

    /// Context with a freshly generated correlation id
    #[must_use]
    pub fn generate(run_deadline: Duration) -> Self {
        Self::new(Uuid::new_v4().to_string(), run_deadline)
    }

    /// Attach a cancellation signal
    #[must_use]
    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancel = signal;
        self
    }

    /// Context for one integration within a batch
    ///
    /// Shares the cancellation signal, gets its own deadline, and suffixes
    /// the correlation id.
    #[must_use]
    pub fn child(&self, suffix: &str, run_deadline: Duration) -> Self {
        Self {
            correlation_id: format!("{}/{suffix}", self.correlation_id),
            deadline: Instant::now() + run_deadline,
            cancel: self.cancel.clone(),
        }
    }

    /// Correlation id threaded into logs and errors
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Absolute deadline for the run
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether cancellation was already signalled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run `fut` unless cancellation or the run deadline comes first
    ///
    /// Errors are tagged with `step` via [`SyncError::context`].
    ///
    /// # Errors
    ///
    /// `SyncError::Cancelled` on cancellation, `SyncError::UpstreamTimeout`
    /// when the deadline passes, otherwise whatever `fut` returned
    pub async fn guard<F, T, E>(&self, step: &str, fut: F) -> Result<T, SyncError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<SyncError>,
    {
        if self.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(SyncError::Cancelled),
            outcome = timeout_at(self.deadline, fut) => match outcome {
                Ok(result) => result.map_err(|e| e.into().context(step)),
                Err(_) => Err(SyncError::UpstreamTimeout("run deadline exceeded".to_owned()).context(step)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthmetrics_core::errors::ErrorCode;
    use tokio::time::{advance, sleep};

    #[tokio::test]
    async fn test_guard_passes_through_result() {
        let ctx = SyncContext::new("corr-1", Duration::from_secs(5));
        let value = ctx
            .guard("step", async { Ok::<_, SyncError>(42) })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_guard_tags_errors_with_step() {
        let ctx = SyncContext::new("corr-4", Duration::from_secs(5));
        let err = ctx
            .guard("profile fetch", async {
                Err::<(), _>(SyncError::UpstreamError("status 500".to_owned()))
            })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SyncError::UpstreamError("profile fetch: status 500".to_owned())
        );
    }

    #[tokio::test]
    async fn test_guard_reports_cancellation() {
        let (handle, signal) = CancellationSignal::pair();
        let ctx = SyncContext::new("corr-2", Duration::from_secs(5)).with_cancellation(signal);
        handle.cancel();

        let err = ctx
            .guard("step", pending::<Result<(), SyncError>>())
            .await
            .unwrap_err();
        assert_eq!(err, SyncError::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_reports_deadline_as_timeout() {
        let ctx = SyncContext::new("corr-3", Duration::from_secs(3600));
        let started = Instant::now();
        let err = ctx
            .guard("sleep fetch", pending::<Result<(), SyncError>>())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SyncError::UpstreamTimeout("sleep fetch: run deadline exceeded".to_owned())
        );
        assert!(started.elapsed() >= Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_lets_work_finish_before_deadline() {
        let ctx = SyncContext::new("corr-5", Duration::from_secs(60));
        let value = ctx
            .guard("body fetch", async {
                sleep(Duration::from_secs(59)).await;
                Ok::<_, SyncError>("done")
            })
            .await
            .unwrap();
        assert_eq!(value, "done");

        advance(Duration::from_secs(2)).await;
        let after_deadline = Instant::now();
        let err = ctx
            .guard("sleep fetch", pending::<Result<(), SyncError>>())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UpstreamTimeout);
        assert_eq!(after_deadline.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_dropped_handle_never_cancels() {
        let signal = CancellationSignal::never();
        assert!(!signal.is_cancelled());
    }
}
