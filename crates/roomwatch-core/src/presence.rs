//! The presence evaluator: decides, for each incoming temperature reading,
//! whether the evidence says the room is empty.
//!
//! Two paired sensors (say inside and outside) reporting temperatures far
//! apart, close together in time, while no motion was recorded in the
//! current sync window, means climate control is most likely running for
//! nobody. Zero motion *supports* the alert.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
  Result,
  alert::{AlertKind, AlertSink, PresenceAlert},
  motion::MotionAggregator,
  pair::{DevicePair, PresenceThresholds},
  policy::StorePolicy,
  reading::{AggregatedMotion, TemperatureReading},
  store::ReadingStore,
  window::SyncWindowClock,
};

// ─── Decision ────────────────────────────────────────────────────────────────

/// Why the predicate did or did not fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
  Fired {
    temp_delta: f64,
    time_delta: i64,
    window:     u32,
  },
  /// The partner device has never reported; nothing to compare against.
  NoPairedHistory,
  BelowThreshold { temp_delta: f64 },
  OutsideTimeWindow { time_delta: i64 },
  MotionPresent { total_movements: u64 },
  /// The same location and timestamp was already stored; it was evaluated
  /// when it first arrived.
  Duplicate,
}

/// What [`PresenceEvaluator::on_temperature_reading`] decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDecision {
  pub alert_fired: bool,
  pub outcome:     Outcome,
}

// ─── Predicate ───────────────────────────────────────────────────────────────

/// The reading-only half of the predicate. `None` means the two readings
/// diverge enough, close enough in time, for motion to decide.
///
/// Both deltas are absolute, so clock skew or out-of-order delivery cannot
/// sneak a pair past the time window.
pub fn divergence(
  reading: &TemperatureReading,
  paired: &TemperatureReading,
  thresholds: &PresenceThresholds,
) -> Option<Outcome> {
  let temp_delta = (paired.temperature - reading.temperature).abs();
  let time_delta = paired.timestamp.abs_diff(reading.timestamp);

  if temp_delta < thresholds.temp_threshold {
    return Some(Outcome::BelowThreshold { temp_delta });
  }
  // A negative configured window can never be met.
  match u64::try_from(thresholds.time_window_seconds) {
    Ok(limit) if time_delta <= limit => None,
    _ => Some(Outcome::OutsideTimeWindow {
      time_delta: i64::try_from(time_delta).unwrap_or(i64::MAX),
    }),
  }
}

/// The full predicate over two readings and the current window's motion.
pub fn evaluate(
  reading: &TemperatureReading,
  paired: &TemperatureReading,
  motion: &AggregatedMotion,
  window: u32,
  thresholds: &PresenceThresholds,
) -> Outcome {
  if let Some(rejected) = divergence(reading, paired, thresholds) {
    return rejected;
  }
  if !motion.is_idle() {
    return Outcome::MotionPresent {
      total_movements: motion.total_movements,
    };
  }
  Outcome::Fired {
    temp_delta: (paired.temperature - reading.temperature).abs(),
    time_delta: i64::try_from(paired.timestamp.abs_diff(reading.timestamp))
      .unwrap_or(i64::MAX),
    window,
  }
}

// ─── Evaluator ───────────────────────────────────────────────────────────────

pub struct PresenceEvaluator<S, A> {
  store:      Arc<S>,
  clock:      Arc<SyncWindowClock<S>>,
  motion:     Arc<MotionAggregator<S>>,
  sink:       Arc<A>,
  pair:       DevicePair,
  thresholds: PresenceThresholds,
  policy:     StorePolicy,
}

impl<S, A> PresenceEvaluator<S, A>
where
  S: ReadingStore,
  A: AlertSink,
{
  pub fn new(
    store: Arc<S>,
    clock: Arc<SyncWindowClock<S>>,
    motion: Arc<MotionAggregator<S>>,
    sink: Arc<A>,
    pair: DevicePair,
    thresholds: PresenceThresholds,
    policy: StorePolicy,
  ) -> Self {
    Self {
      store,
      clock,
      motion,
      sink,
      pair,
      thresholds,
      policy,
    }
  }

  pub fn pair(&self) -> &DevicePair { &self.pair }

  /// Evaluate `reading` against its partner, persist it, and raise an
  /// [`AlertKind::Unoccupied`] alert if the predicate fires.
  ///
  /// A reading from an unconfigured location is rejected before anything is
  /// stored. Otherwise the reading is persisted whatever the outcome, and
  /// the alert is only sent once the reading is safely stored.
  #[tracing::instrument(
    skip(self, reading),
    fields(location = %reading.location, timestamp = reading.timestamp)
  )]
  pub async fn on_temperature_reading(
    &self,
    reading: TemperatureReading,
  ) -> Result<AlertDecision> {
    reading.validate()?;
    let partner = self.pair.partner_of(&reading.location)?;

    let store = &*self.store;
    let paired = self
      .policy
      .run("latest_temperature_for", move || {
        store.latest_temperature_for(partner)
      })
      .await?;

    let mut outcome = match &paired {
      None => Outcome::NoPairedHistory,
      Some(paired) => match divergence(&reading, paired, &self.thresholds) {
        Some(rejected) => rejected,
        None => {
          // The window must not wrap (and purge) between reading its id and
          // summing its motion.
          let held = self.clock.hold().await;
          let window = held.id();
          let motion = self.motion.aggregate(window).await?;
          drop(held);
          evaluate(&reading, paired, &motion, window, &self.thresholds)
        }
      },
    };

    let to_insert = &reading;
    let inserted = self
      .policy
      .run("insert_temperature", move || {
        store.insert_temperature(to_insert.clone())
      })
      .await?;
    if !inserted {
      debug!("temperature reading already stored");
      outcome = Outcome::Duplicate;
    }

    let alert_fired = matches!(outcome, Outcome::Fired { .. });
    if let (Outcome::Fired { temp_delta, window, .. }, Some(paired)) = (&outcome, &paired) {
      let message = format!(
        "No one is here: {} reads {:.1}° and {} reads {:.1}° ({temp_delta:.1}° apart) \
         with no motion in sync window {window}",
        reading.location, reading.temperature, paired.location, paired.temperature,
      );
      info!(%message, "presence alert fired");
      self.sink.notify(PresenceAlert::new(AlertKind::Unoccupied, message));
    } else {
      debug!(?outcome, "no presence alert");
    }

    Ok(AlertDecision { alert_fired, outcome })
  }
}
