//! Error types for `roomwatch-core`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The reading came from a location that is not part of the device pair.
  #[error("unknown device location: {0:?}")]
  UnknownDevice(String),

  #[error("invalid reading: {0}")]
  InvalidReading(String),

  #[error("invalid sync window: {0}")]
  InvalidWindow(u32),

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  /// A store call failed on every attempt allowed by the
  /// [`StorePolicy`](crate::policy::StorePolicy).
  #[error("store operation `{op}` failed: {source}")]
  Storage {
    op:     &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("store operation `{op}` timed out after {after:?}")]
  Timeout { op: &'static str, after: Duration },
}

impl Error {
  /// `true` for failures worth retrying later (store I/O), `false` for
  /// rejections of the input itself.
  pub fn is_transient(&self) -> bool {
    matches!(self, Self::Storage { .. } | Self::Timeout { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
