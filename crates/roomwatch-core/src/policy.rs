//! Timeout and retry policy applied to every [`ReadingStore`] call.
//!
//! [`ReadingStore`]: crate::store::ReadingStore

use std::{future::Future, time::Duration};

use tracing::warn;

use crate::{Error, Result};

/// How long a single store call may take and how often it is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorePolicy {
  /// Upper bound on a single attempt.
  pub timeout: Duration,
  /// Additional attempts after the first one fails.
  pub retries: u32,
  /// Base delay before a retry; attempt `n` waits `n * backoff`.
  pub backoff: Duration,
}

impl Default for StorePolicy {
  fn default() -> Self {
    Self {
      timeout: Duration::from_secs(5),
      retries: 1,
      backoff: Duration::from_millis(200),
    }
  }
}

impl StorePolicy {
  /// Run `call` under this policy. Each attempt gets a fresh future from
  /// `call`; the last failure is returned once attempts are exhausted.
  pub async fn run<T, E, F, Fut>(&self, op: &'static str, mut call: F) -> Result<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
  {
    let mut attempt = 0;
    loop {
      let err = match tokio::time::timeout(self.timeout, call()).await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(source)) => Error::Storage {
          op,
          source: Box::new(source),
        },
        Err(_) => Error::Timeout {
          op,
          after: self.timeout,
        },
      };

      if attempt >= self.retries {
        return Err(err);
      }
      attempt += 1;
      warn!(op, attempt, error = %err, "store call failed, retrying");
      tokio::time::sleep(self.backoff * attempt).await;
    }
  }
}
