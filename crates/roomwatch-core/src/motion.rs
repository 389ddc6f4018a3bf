//! Read-side aggregation of motion readings per sync window.
//!
//! Nothing is cached: both the ingestion hot path and the periodic sweep
//! recompute from the store on every call.

use std::sync::Arc;

use crate::{
  Result,
  policy::StorePolicy,
  reading::{AggregatedMotion, LocationMotion},
  store::ReadingStore,
};

pub struct MotionAggregator<S> {
  store:  Arc<S>,
  policy: StorePolicy,
}

impl<S: ReadingStore> MotionAggregator<S> {
  pub fn new(store: Arc<S>, policy: StorePolicy) -> Self { Self { store, policy } }

  /// Total movements and latest timestamp over every sensor reporting into
  /// `window`. An empty window is `{ total_movements: 0, last_timestamp:
  /// None }`.
  pub async fn aggregate(&self, window: u32) -> Result<AggregatedMotion> {
    let store = &*self.store;
    self
      .policy
      .run("sum_motion", move || store.sum_motion(window))
      .await
  }

  /// The readings of `window` grouped by location, groups ordered by
  /// location and readings within a group by timestamp.
  pub async fn detail(&self, window: u32) -> Result<Vec<LocationMotion>> {
    let store = &*self.store;
    let mut readings = self
      .policy
      .run("motion_in_window", move || store.motion_in_window(window))
      .await?;
    readings.sort_by(|a, b| {
      a.location
        .cmp(&b.location)
        .then(a.timestamp.cmp(&b.timestamp))
    });

    let mut groups: Vec<LocationMotion> = Vec::new();
    for reading in readings {
      match groups.last_mut() {
        Some(group) if group.location == reading.location => {
          group.total_movements += u64::from(reading.movement_count);
          group.readings.push(reading);
        }
        _ => groups.push(LocationMotion {
          location:        reading.location.clone(),
          total_movements: u64::from(reading.movement_count),
          readings:        vec![reading],
        }),
      }
    }
    Ok(groups)
  }
}
