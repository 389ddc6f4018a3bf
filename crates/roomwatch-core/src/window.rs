//! The sync window clock.
//!
//! Motion sensors report into rotating integer buckets ("sync windows"). The
//! clock owns the only copy of the current id. It advances once per period
//! and, when the id would run past `max`, purges every motion reading of the
//! completed cycle and restarts at [`RESTART_WINDOW`].
//!
//! Readers take a shared lock; [`SyncWindowClock::advance`] takes the
//! exclusive lock for the whole purge-then-reset sequence, so nobody observes
//! a reset id whose old readings are still counted.

use std::{sync::Arc, time::Duration};

use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{info, warn};

use crate::{
  Error, Result,
  policy::StorePolicy,
  reading::NO_WINDOW,
  store::ReadingStore,
};

/// The id the clock starts at and wraps back to. Never [`NO_WINDOW`].
pub const RESTART_WINDOW: u32 = 1;
pub const DEFAULT_SYNC_WINDOW_MAX: u32 = 48;
pub const DEFAULT_SYNC_WINDOW_PERIOD: Duration = Duration::from_secs(1500);

#[derive(Debug)]
struct ClockState {
  current:       u32,
  /// A purge failed; retry it on every advance until one succeeds.
  purge_pending: bool,
}

/// Process-wide owner of the current sync window id.
pub struct SyncWindowClock<S> {
  store:  Arc<S>,
  policy: StorePolicy,
  max:    u32,
  state:  RwLock<ClockState>,
}

/// Pins the current window id. While any guard is alive the clock cannot
/// advance, so a reading tagged with [`WindowGuard::id`] is never written
/// into a window that has already been purged.
pub struct WindowGuard<'a> {
  state: RwLockReadGuard<'a, ClockState>,
}

impl WindowGuard<'_> {
  pub fn id(&self) -> u32 { self.state.current }
}

impl<S: ReadingStore> SyncWindowClock<S> {
  pub fn new(store: Arc<S>, max: u32, policy: StorePolicy) -> Result<Self> {
    if max < RESTART_WINDOW {
      return Err(Error::InvalidConfig(format!(
        "sync_window_max must be at least {RESTART_WINDOW}, got {max}"
      )));
    }
    Ok(Self {
      store,
      policy,
      max,
      state: RwLock::new(ClockState {
        current:       RESTART_WINDOW,
        purge_pending: false,
      }),
    })
  }

  /// The id new motion readings are tagged with right now.
  pub async fn current(&self) -> u32 { self.state.read().await.current }

  /// Hold the current id for the duration of a tagged write.
  pub async fn hold(&self) -> WindowGuard<'_> {
    WindowGuard {
      state: self.state.read().await,
    }
  }

  #[cfg(test)]
  async fn purge_pending(&self) -> bool { self.state.read().await.purge_pending }

  /// Whether `window` is an id this clock can ever hand out.
  pub fn contains(&self, window: u32) -> bool {
    window != NO_WINDOW && window <= self.max
  }

  /// Move to the next window and return its id.
  ///
  /// At the wrap boundary the completed cycle's readings are deleted before
  /// the id resets. A failed purge does not stop the id from moving: it is
  /// logged and retried on the next advance over the windows of the old
  /// cycle that have not been reused yet.
  pub async fn advance(&self) -> u32 {
    let mut state = self.state.write().await;

    let wrapped = state.current >= self.max;
    let next = if wrapped { RESTART_WINDOW } else { state.current + 1 };

    if wrapped || state.purge_pending {
      // `next` is not current yet and we hold the write lock, so nothing in
      // [next, max] belongs to the new cycle.
      let (store, max) = (&*self.store, self.max);
      let outcome = self
        .policy
        .run("delete_motion_in_range", move || {
          store.delete_motion_in_range(next, max)
        })
        .await;

      match outcome {
        Ok(deleted) => {
          info!(from = next, to = self.max, deleted, "purged expired sync windows");
          state.purge_pending = false;
        }
        Err(err) => {
          warn!(from = next, to = self.max, error = %err, "sync window purge failed, retrying next tick");
          state.purge_pending = true;
        }
      }
    }

    state.current = next;
    info!(window = next, "sync window advanced");
    next
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::Ordering;

  use super::*;
  use crate::{fake::MemoryStore, reading::MotionReading};

  fn policy() -> StorePolicy {
    StorePolicy {
      timeout: Duration::from_millis(100),
      retries: 0,
      backoff: Duration::from_millis(1),
    }
  }

  fn motion(location: &str, timestamp: i64, window: u32) -> MotionReading {
    MotionReading {
      location: location.into(),
      timestamp,
      movement_count: 1,
      sync_window: window,
    }
  }

  #[tokio::test]
  async fn starts_at_restart_value() {
    let clock = SyncWindowClock::new(Arc::new(MemoryStore::default()), 48, policy()).unwrap();
    assert_eq!(clock.current().await, RESTART_WINDOW);
  }

  #[tokio::test]
  async fn advance_increments_by_one() {
    let clock = SyncWindowClock::new(Arc::new(MemoryStore::default()), 48, policy()).unwrap();
    assert_eq!(clock.advance().await, 2);
    assert_eq!(clock.advance().await, 3);
    assert_eq!(clock.current().await, 3);
  }

  #[tokio::test]
  async fn wrap_purges_completed_cycle_and_restarts_at_one() {
    let store = Arc::new(MemoryStore::default());
    let clock = SyncWindowClock::new(store.clone(), 3, policy()).unwrap();

    store.insert_motion(motion("sensor1", 10, 1)).await.unwrap();
    clock.advance().await;
    store.insert_motion(motion("sensor1", 20, 2)).await.unwrap();
    clock.advance().await;
    store.insert_motion(motion("sensor2", 30, 3)).await.unwrap();

    let next = clock.advance().await;
    assert_eq!(next, RESTART_WINDOW);
    assert_ne!(next, NO_WINDOW);
    assert!(store.motion_windows().is_empty());
    assert!(!clock.purge_pending().await);
  }

  #[tokio::test]
  async fn failed_purge_still_advances_and_retries_next_tick() {
    let store = Arc::new(MemoryStore::default());
    let clock = SyncWindowClock::new(store.clone(), 3, policy()).unwrap();
    clock.advance().await;
    clock.advance().await;
    store.insert_motion(motion("sensor1", 10, 2)).await.unwrap();
    store.insert_motion(motion("sensor1", 20, 3)).await.unwrap();

    store.fail_deletes.store(true, Ordering::SeqCst);
    assert_eq!(clock.advance().await, 1);
    assert!(clock.purge_pending().await);
    assert_eq!(store.motion_windows().len(), 2);

    store.fail_deletes.store(false, Ordering::SeqCst);
    assert_eq!(clock.advance().await, 2);
    assert!(!clock.purge_pending().await);
    assert!(store.motion_windows().is_empty());
  }

  #[tokio::test]
  async fn concurrent_readers_see_old_or_new_value() {
    let store = Arc::new(MemoryStore::default());
    let clock = Arc::new(SyncWindowClock::new(store, 2, policy()).unwrap());
    clock.advance().await;
    assert_eq!(clock.current().await, 2);

    let readers: Vec<_> = (0..32)
      .map(|_| {
        let clock = clock.clone();
        tokio::spawn(async move { clock.current().await })
      })
      .collect();
    let advanced = clock.advance().await;
    assert_eq!(advanced, 1);

    for reader in readers {
      let seen = reader.await.unwrap();
      assert!(seen == 2 || seen == 1, "observed torn window {seen}");
    }
  }

  #[tokio::test]
  async fn held_window_blocks_advance() {
    let store = Arc::new(MemoryStore::default());
    let clock = Arc::new(SyncWindowClock::new(store, 48, policy()).unwrap());

    let guard = clock.hold().await;
    let advancing = {
      let clock = clock.clone();
      tokio::spawn(async move { clock.advance().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!advancing.is_finished());
    assert_eq!(guard.id(), 1);
    drop(guard);

    assert_eq!(advancing.await.unwrap(), 2);
  }

  #[test]
  fn zero_max_is_rejected() {
    let store = Arc::new(MemoryStore::default());
    assert!(SyncWindowClock::new(store, 0, policy()).is_err());
  }
}
