//! The `ReadingStore` trait: the narrow read/write contract the engine needs
//! from durable storage.
//!
//! The trait is implemented by storage backends (e.g.
//! `roomwatch-store-sqlite`). The store owns its own locking and transaction
//! discipline; the engine treats every call as atomic, holds no cross-call
//! locks, and applies timeouts and retries itself (see
//! [`StorePolicy`](crate::policy::StorePolicy)). Implementations must not
//! retry internally.

use std::future::Future;

use crate::reading::{AggregatedMotion, MotionReading, TemperatureReading};

/// Abstraction over a roomwatch reading store backend.
///
/// Both reading tables are append-only apart from the window purge. Inserts
/// are idempotent on `(location, timestamp)`: inserting an already-stored key
/// again is a no-op that reports `false`, which makes a retried insert safe.
pub trait ReadingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Temperature ───────────────────────────────────────────────────────

  /// Persist a temperature reading. Returns `false` if a reading with the
  /// same location and timestamp was already stored.
  fn insert_temperature(
    &self,
    reading: TemperatureReading,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The most recent reading (by timestamp) for `location`, if any.
  fn latest_temperature_for<'a>(
    &'a self,
    location: &'a str,
  ) -> impl Future<Output = Result<Option<TemperatureReading>, Self::Error>>
  + Send
  + 'a;

  /// The most recent reading of every location that has reported, ordered
  /// by location.
  fn latest_temperatures(
    &self,
  ) -> impl Future<Output = Result<Vec<TemperatureReading>, Self::Error>> + Send + '_;

  // ── Motion ────────────────────────────────────────────────────────────

  /// Persist a motion reading. Returns `false` on a duplicate key.
  fn insert_motion(
    &self,
    reading: MotionReading,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Sum of `movement_count` and max `timestamp` over all readings tagged
  /// with `window`. An empty window yields `AggregatedMotion::default()`.
  fn sum_motion(
    &self,
    window: u32,
  ) -> impl Future<Output = Result<AggregatedMotion, Self::Error>> + Send + '_;

  /// Every reading tagged with `window`, ordered by location then timestamp.
  fn motion_in_window(
    &self,
    window: u32,
  ) -> impl Future<Output = Result<Vec<MotionReading>, Self::Error>> + Send + '_;

  /// Delete motion readings whose window lies in `[min_window, max_window]`.
  /// Returns the number of rows removed.
  fn delete_motion_in_range(
    &self,
    min_window: u32,
    max_window: u32,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
