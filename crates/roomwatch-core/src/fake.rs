//! In-memory doubles for the store and the alert sink, used by the unit
//! tests in this crate.

use std::{
  collections::BTreeMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use tokio::sync::Notify;

use crate::{
  alert::{AlertSink, PresenceAlert},
  reading::{AggregatedMotion, MotionReading, TemperatureReading},
  store::ReadingStore,
};

#[derive(Debug, thiserror::Error)]
#[error("injected store failure")]
pub struct Injected;

#[derive(Default)]
pub struct MemoryStore {
  temperatures:     Mutex<BTreeMap<(String, i64), f64>>,
  motion:           Mutex<BTreeMap<(String, i64), MotionReading>>,
  pub fail_reads:   AtomicBool,
  pub fail_writes:  AtomicBool,
  pub fail_deletes: AtomicBool,
  /// Park the next `sum_motion` call: it signals `sum_entered`, then waits
  /// for `sum_release` before reading.
  pub gate_sums:    AtomicBool,
  pub sum_entered:  Notify,
  pub sum_release:  Notify,
}

impl MemoryStore {
  pub fn temperature_count(&self) -> usize {
    self.temperatures.lock().unwrap().len()
  }

  pub fn motion_windows(&self) -> Vec<u32> {
    self
      .motion
      .lock()
      .unwrap()
      .values()
      .map(|m| m.sync_window)
      .collect()
  }

  fn check(flag: &AtomicBool) -> Result<(), Injected> {
    if flag.load(Ordering::SeqCst) { Err(Injected) } else { Ok(()) }
  }
}

impl ReadingStore for MemoryStore {
  type Error = Injected;

  async fn insert_temperature(
    &self,
    reading: TemperatureReading,
  ) -> Result<bool, Injected> {
    Self::check(&self.fail_writes)?;
    let mut temps = self.temperatures.lock().unwrap();
    let key = (reading.location, reading.timestamp);
    if temps.contains_key(&key) {
      return Ok(false);
    }
    temps.insert(key, reading.temperature);
    Ok(true)
  }

  async fn latest_temperature_for(
    &self,
    location: &str,
  ) -> Result<Option<TemperatureReading>, Injected> {
    Self::check(&self.fail_reads)?;
    let temps = self.temperatures.lock().unwrap();
    Ok(
      temps
        .iter()
        .filter(|((loc, _), _)| loc == location)
        .max_by_key(|((_, ts), _)| *ts)
        .map(|((loc, ts), t)| TemperatureReading::new(loc.clone(), *ts, *t)),
    )
  }

  async fn latest_temperatures(&self) -> Result<Vec<TemperatureReading>, Injected> {
    Self::check(&self.fail_reads)?;
    let temps = self.temperatures.lock().unwrap();
    let mut latest: BTreeMap<&str, (i64, f64)> = BTreeMap::new();
    for ((loc, ts), t) in temps.iter() {
      latest.insert(loc, (*ts, *t));
    }
    Ok(
      latest
        .into_iter()
        .map(|(loc, (ts, t))| TemperatureReading::new(loc, ts, t))
        .collect(),
    )
  }

  async fn insert_motion(&self, reading: MotionReading) -> Result<bool, Injected> {
    Self::check(&self.fail_writes)?;
    let mut motion = self.motion.lock().unwrap();
    let key = (reading.location.clone(), reading.timestamp);
    if motion.contains_key(&key) {
      return Ok(false);
    }
    motion.insert(key, reading);
    Ok(true)
  }

  async fn sum_motion(&self, window: u32) -> Result<AggregatedMotion, Injected> {
    Self::check(&self.fail_reads)?;
    if self.gate_sums.swap(false, Ordering::SeqCst) {
      self.sum_entered.notify_one();
      self.sum_release.notified().await;
    }
    let motion = self.motion.lock().unwrap();
    Ok(
      motion
        .values()
        .filter(|m| m.sync_window == window)
        .fold(AggregatedMotion::default(), |acc, m| AggregatedMotion {
          total_movements: acc.total_movements + u64::from(m.movement_count),
          last_timestamp:  acc.last_timestamp.max(Some(m.timestamp)),
        }),
    )
  }

  async fn motion_in_window(&self, window: u32) -> Result<Vec<MotionReading>, Injected> {
    Self::check(&self.fail_reads)?;
    let motion = self.motion.lock().unwrap();
    Ok(
      motion
        .values()
        .filter(|m| m.sync_window == window)
        .cloned()
        .collect(),
    )
  }

  async fn delete_motion_in_range(
    &self,
    min_window: u32,
    max_window: u32,
  ) -> Result<u64, Injected> {
    Self::check(&self.fail_deletes)?;
    let mut motion = self.motion.lock().unwrap();
    let before = motion.len();
    motion.retain(|_, m| !(min_window..=max_window).contains(&m.sync_window));
    Ok((before - motion.len()) as u64)
  }
}

#[derive(Default)]
pub struct RecordingSink {
  alerts: Mutex<Vec<PresenceAlert>>,
}

impl RecordingSink {
  pub fn alerts(&self) -> Vec<PresenceAlert> { self.alerts.lock().unwrap().clone() }
}

impl AlertSink for RecordingSink {
  fn notify(&self, alert: PresenceAlert) { self.alerts.lock().unwrap().push(alert); }
}
