//! Per-call context carrying the request deadline down to storage calls

use std::future::IntoFuture;
use std::time::Duration;

use tokio::time::Instant;

use super::error::StorageError;

/// Deadline carrier threaded from the transport layer into every adapter call
#[derive(Debug, Clone, Copy, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context without a deadline
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Runs an engine call under this context.
    ///
    /// Returns `Canceled` without polling the call when the deadline has already
    /// passed, and drops the call if the deadline elapses while it is in flight.
    pub async fn run<F>(&self, call: F) -> Result<F::Output, StorageError>
    where
        F: IntoFuture,
    {
        let Some(deadline) = self.deadline else {
            return Ok(call.await);
        };

        if Instant::now() >= deadline {
            return Err(StorageError::canceled("request deadline exceeded"));
        }

        tokio::time::timeout_at(deadline, call.into_future())
            .await
            .map_err(|_| StorageError::canceled("request deadline exceeded"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_context_runs_call() {
        let ctx = CallContext::background();
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_expired());

        let result = ctx.run(async { 7 }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_expired_context_cancels_before_call() {
        let ctx = CallContext::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(ctx.is_expired());

        let result = ctx.run(async { 7 }).await;
        assert!(matches!(result, Err(StorageError::Canceled { .. })));
    }

    #[tokio::test]
    async fn test_deadline_elapses_mid_call() {
        let ctx = CallContext::with_timeout(Duration::from_millis(50));

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                7
            })
            .await;

        assert!(matches!(result, Err(StorageError::Canceled { .. })));
    }

    #[tokio::test]
    async fn test_call_within_deadline() {
        let ctx = CallContext::with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.run(async { "done" }).await, Ok("done"));
    }
}
