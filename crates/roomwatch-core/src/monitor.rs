//! [`Monitor`], the ingestion boundary. Wires the clock, the motion
//! aggregator, and the presence evaluator to one store and one alert sink,
//! and runs the periodic sweep.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  alert::{AlertKind, AlertSink, PresenceAlert},
  motion::MotionAggregator,
  pair::{DevicePair, PresenceThresholds},
  policy::StorePolicy,
  presence::{AlertDecision, PresenceEvaluator},
  reading::{AggregatedMotion, LocationMotion, MotionReading, TemperatureReading},
  store::ReadingStore,
  window::SyncWindowClock,
};

/// Everything needed to assemble a [`Monitor`].
#[derive(Debug, Clone)]
pub struct MonitorConfig {
  pub pair:            DevicePair,
  pub thresholds:      PresenceThresholds,
  pub sync_window_max: u32,
  pub store_policy:    StorePolicy,
}

/// What one sweep of the clock did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
  /// The window that just closed.
  pub closed: u32,
  /// `None` if its motion could not be read.
  pub motion: Option<AggregatedMotion>,
  /// The window that is now current.
  pub current: u32,
}

pub struct Monitor<S, A> {
  store:    Arc<S>,
  sink:     Arc<A>,
  clock:    Arc<SyncWindowClock<S>>,
  motion:   Arc<MotionAggregator<S>>,
  presence: PresenceEvaluator<S, A>,
  policy:   StorePolicy,
}

impl<S, A> Monitor<S, A>
where
  S: ReadingStore,
  A: AlertSink,
{
  pub fn new(store: Arc<S>, sink: Arc<A>, config: MonitorConfig) -> Result<Self> {
    config.thresholds.validate()?;
    let policy = config.store_policy;
    let clock = Arc::new(SyncWindowClock::new(
      store.clone(),
      config.sync_window_max,
      policy,
    )?);
    let motion = Arc::new(MotionAggregator::new(store.clone(), policy));
    let presence = PresenceEvaluator::new(
      store.clone(),
      clock.clone(),
      motion.clone(),
      sink.clone(),
      config.pair,
      config.thresholds,
      policy,
    );
    Ok(Self {
      store,
      sink,
      clock,
      motion,
      presence,
      policy,
    })
  }

  pub fn pair(&self) -> &DevicePair { self.presence.pair() }

  // ── Ingestion ─────────────────────────────────────────────────────────

  /// Evaluate and persist a temperature reading from one of the paired
  /// devices.
  pub async fn submit_temperature(
    &self,
    location: impl Into<String>,
    timestamp: i64,
    temperature: f64,
  ) -> Result<AlertDecision> {
    let reading = TemperatureReading::new(location, timestamp, temperature);
    self.presence.on_temperature_reading(reading).await
  }

  /// Persist a motion reading tagged with the current sync window, and
  /// return that window.
  ///
  /// Devices report the window they last fetched from the server; it may
  /// be stale by the time the reading lands, so the server's own current
  /// window always wins.
  #[tracing::instrument(skip(self, location), fields(location = tracing::field::Empty))]
  pub async fn submit_motion(
    &self,
    location: impl Into<String>,
    timestamp: i64,
    count: u32,
    reported_window: Option<u32>,
  ) -> Result<u32> {
    let location = location.into();
    tracing::Span::current().record("location", location.as_str());
    if location.trim().is_empty() {
      return Err(Error::InvalidReading("location is empty".into()));
    }

    let held = self.clock.hold().await;
    let window = held.id();
    if let Some(reported) = reported_window
      && reported != window
    {
      debug!(reported, window, "device reported a stale sync window");
    }

    let reading = MotionReading {
      location,
      timestamp,
      movement_count: count,
      sync_window: window,
    };
    let store = &*self.store;
    let reading = &reading;
    let inserted = self
      .policy
      .run("insert_motion", move || store.insert_motion(reading.clone()))
      .await?;
    drop(held);

    if !inserted {
      debug!(window, "motion reading already stored");
    }
    Ok(window)
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub async fn aggregated_motion(&self, window: u32) -> Result<AggregatedMotion> {
    self.check_window(window)?;
    self.motion.aggregate(window).await
  }

  pub async fn motion_detail(&self, window: u32) -> Result<Vec<LocationMotion>> {
    self.check_window(window)?;
    self.motion.detail(window).await
  }

  pub async fn current_sync_window(&self) -> u32 { self.clock.current().await }

  /// Latest reading of every location that has reported a temperature.
  pub async fn latest_temperatures(&self) -> Result<Vec<TemperatureReading>> {
    let store = &*self.store;
    self
      .policy
      .run("latest_temperatures", move || store.latest_temperatures())
      .await
  }

  fn check_window(&self, window: u32) -> Result<()> {
    if self.clock.contains(window) {
      Ok(())
    } else {
      Err(Error::InvalidWindow(window))
    }
  }

  // ── Sweep ─────────────────────────────────────────────────────────────

  /// Close the current window and advance the clock.
  ///
  /// A window that closes without any recorded motion raises an
  /// [`AlertKind::IdleWindow`] alert. Failing to read the window's motion is
  /// logged and does not hold the clock back.
  pub async fn tick(&self) -> Tick {
    let closed = self.clock.current().await;
    let motion = match self.motion.aggregate(closed).await {
      Ok(motion) => Some(motion),
      Err(err) => {
        warn!(window = closed, error = %err, "could not read motion for closing window");
        None
      }
    };

    if let Some(m) = motion
      && m.is_idle()
    {
      let message = format!("No one is here: no motion recorded in sync window {closed}");
      info!(window = closed, "sync window closed idle");
      self.sink.notify(PresenceAlert::new(AlertKind::IdleWindow, message));
    }

    let current = self.clock.advance().await;
    Tick {
      closed,
      motion,
      current,
    }
  }
}
