//! Deadline and cancellation plumbing (spec §5).
//!
//! Every I/O call accepts a `CancellationToken` derived from the caller's
//! deadline. Racing a future against the token (rather than polling a flag)
//! is what lets an in-flight embedding or DB call abort as soon as the
//! deadline fires instead of running to completion in the background.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{CoreError, Result};

/// A deadline paired with the token it cancels when it elapses.
#[derive(Clone)]
pub struct Deadline {
    token: CancellationToken,
    _guard: Option<std::sync::Arc<tokio::task::JoinHandle<()>>>,
}

impl Deadline {
    /// No deadline: the token never fires on its own.
    pub fn none() -> Self {
        Self {
            token: CancellationToken::new(),
            _guard: None,
        }
    }

    /// Fire the token after `timeout` unless cancelled first.
    pub fn after(timeout: Duration) -> Self {
        let token = CancellationToken::new();
        let child = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => child.cancel(),
                _ = child.cancelled() => {}
            }
        });
        Self {
            token,
            _guard: Some(std::sync::Arc::new(handle)),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Race `fut` against this deadline; returns `DeadlineExceeded` if the
    /// token fires first.
    pub async fn race<T>(&self, fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            res = fut => res,
            _ = self.token.cancelled() => Err(CoreError::DeadlineExceeded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn short_deadline_aborts_a_slow_future() {
        let deadline = Deadline::after(Duration::from_millis(20));
        let slow = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok::<_, CoreError>(42)
        };
        let start = std::time::Instant::now();
        let res = deadline.race(slow).await;
        assert!(matches!(res, Err(CoreError::DeadlineExceeded)));
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn no_deadline_lets_the_future_finish() {
        let deadline = Deadline::none();
        let fast = async { Ok::<_, CoreError>(7) };
        assert_eq!(deadline.race(fast).await.unwrap(), 7);
    }
}
