use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{Result, ScanError};

/// Cooperative cancellation polled at row boundaries of the long-running scans.
///
/// Cloning shares the underlying token, so a caller can keep one clone and
/// trip it from another thread (or a Ctrl-C handler) while a scan runs.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A handle that never trips unless [`Cancellation::cancel`] is called
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing token
    pub fn from_token(token: CancellationToken) -> Self {
        Self { token, deadline: None }
    }

    /// Also trip once `timeout` has elapsed from now
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// `Err(ScanError::Cancelled)` once tripped
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            tracing::debug!("scan cancelled at row boundary");
            return Err(ScanError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_handle_passes() {
        assert!(Cancellation::new().check().is_ok());
    }

    #[test]
    fn test_clones_share_the_token() {
        let cancel = Cancellation::new();
        let observer = cancel.clone();
        cancel.cancel();
        assert!(matches!(observer.check(), Err(ScanError::Cancelled)));
    }

    #[test]
    fn test_elapsed_deadline_trips() {
        let cancel = Cancellation::new().with_timeout(Duration::ZERO);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_external_token_cancels() {
        let token = CancellationToken::new();
        let cancel = Cancellation::from_token(token.child_token());
        token.cancel();
        assert!(cancel.check().is_err());
    }
}
