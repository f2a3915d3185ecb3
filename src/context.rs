use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::store::StoreError;

// ============================================================================
// Call Context - caller-owned cancellation and deadline
// ============================================================================
//
// `run` drops a whole operation the moment the token fires or the deadline
// passes. Code that holds a connection races its awaits one at a time with
// `race` instead, so it knows when a connection was left mid-protocol and
// must not go back to the pool.
//
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context with no deadline that is only cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Fails fast if the context is already done.
    pub fn check(&self) -> Result<(), StoreError> {
        if self.token.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(StoreError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drive `operation` to completion unless the context ends first.
    pub async fn run<F, T>(&self, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        self.check()?;
        self.race(operation).await?
    }

    /// Race a single await against cancellation and the deadline.
    ///
    /// `Err` means `operation` was dropped before it finished. Anything it
    /// was doing on a connection is left half done.
    pub async fn race<F>(&self, operation: F) -> Result<F::Output, StoreError>
    where
        F: Future,
    {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                tracing::debug!("Call cancelled, abandoning in-flight store operation");
                Err(StoreError::Cancelled)
            }
            _ = deadline => {
                tracing::debug!("Call deadline exceeded, abandoning in-flight store operation");
                Err(StoreError::DeadlineExceeded)
            }
            output = operation => Ok(output),
        }
    }
}
