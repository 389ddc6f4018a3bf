//! Server wiring for roomwatch: configuration, state assembly, and the sync
//! window ticker.

pub mod ticker;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::Router;
use roomwatch_api::AppState;
use roomwatch_core::{
  alert::BroadcastSink,
  monitor::{Monitor, MonitorConfig},
  pair::{DEFAULT_TEMP_THRESHOLD, DEFAULT_TIME_WINDOW_SECONDS, DevicePair, PresenceThresholds},
  policy::StorePolicy,
  store::ReadingStore,
  window::{DEFAULT_SYNC_WINDOW_MAX, DEFAULT_SYNC_WINDOW_PERIOD},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ROOMWATCH_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                       String,
  pub port:                       u16,
  pub store_path:                 PathBuf,
  /// First paired temperature sensor.
  pub device_a:                   String,
  /// Second paired temperature sensor.
  pub device_b:                   String,
  pub temp_threshold:             f64,
  pub time_window_seconds:        i64,
  pub sync_window_period_seconds: u64,
  pub sync_window_max:            u32,
  pub store_timeout_ms:           u64,
  pub store_retries:              u32,
  pub store_backoff_ms:           u64,
  /// How many alerts a slow WebSocket subscriber may lag behind.
  pub alert_capacity:             usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let policy = StorePolicy::default();
    Self {
      host:                       "0.0.0.0".to_string(),
      port:                       8000,
      store_path:                 PathBuf::from("roomwatch.db"),
      device_a:                   "Inside".to_string(),
      device_b:                   "Outside".to_string(),
      temp_threshold:             DEFAULT_TEMP_THRESHOLD,
      time_window_seconds:        DEFAULT_TIME_WINDOW_SECONDS,
      sync_window_period_seconds: DEFAULT_SYNC_WINDOW_PERIOD.as_secs(),
      sync_window_max:            DEFAULT_SYNC_WINDOW_MAX,
      store_timeout_ms:           policy.timeout.as_millis() as u64,
      store_retries:              policy.retries,
      store_backoff_ms:           policy.backoff.as_millis() as u64,
      alert_capacity:             64,
    }
  }
}

impl ServerConfig {
  pub fn sync_window_period(&self) -> Duration {
    Duration::from_secs(self.sync_window_period_seconds)
  }

  /// Validate and convert into the engine's configuration.
  pub fn monitor_config(&self) -> roomwatch_core::Result<MonitorConfig> {
    if self.sync_window_period_seconds == 0 {
      return Err(roomwatch_core::Error::InvalidConfig(
        "sync_window_period_seconds must be at least 1".into(),
      ));
    }
    let thresholds = PresenceThresholds {
      temp_threshold:      self.temp_threshold,
      time_window_seconds: self.time_window_seconds,
    };
    thresholds.validate()?;

    Ok(MonitorConfig {
      pair: DevicePair::new(&self.device_a, &self.device_b)?,
      thresholds,
      sync_window_max: self.sync_window_max,
      store_policy: StorePolicy {
        timeout: Duration::from_millis(self.store_timeout_ms.max(1)),
        retries: self.store_retries,
        backoff: Duration::from_millis(self.store_backoff_ms),
      },
    })
  }
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

/// Build the monitor and API state over `store`.
pub fn build_state<S>(store: Arc<S>, cfg: &ServerConfig) -> roomwatch_core::Result<AppState<S>>
where
  S: ReadingStore,
{
  let alerts = BroadcastSink::new(cfg.alert_capacity);
  let monitor = Monitor::new(store, Arc::new(alerts.clone()), cfg.monitor_config()?)?;
  Ok(AppState {
    monitor: Arc::new(monitor),
    alerts,
  })
}

/// The API router with request tracing.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ReadingStore + 'static,
{
  roomwatch_api::api_router(state).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_documented_values() {
    let cfg = ServerConfig::default();
    assert_eq!(cfg.temp_threshold, 5.0);
    assert_eq!(cfg.time_window_seconds, 180);
    assert_eq!(cfg.sync_window_period_seconds, 1500);
    assert_eq!(cfg.sync_window_max, 48);

    let monitor = cfg.monitor_config().unwrap();
    assert_eq!(monitor.store_policy.retries, 1);
    assert_eq!(monitor.pair.partner_of("Inside").unwrap(), "Outside");
  }

  #[test]
  fn same_device_twice_is_rejected() {
    let cfg = ServerConfig {
      device_b: "Inside".into(),
      ..ServerConfig::default()
    };
    assert!(cfg.monitor_config().is_err());
  }

  #[test]
  fn zero_period_is_rejected() {
    let cfg = ServerConfig {
      sync_window_period_seconds: 0,
      ..ServerConfig::default()
    };
    assert!(cfg.monitor_config().is_err());
  }

  #[test]
  fn overrides_deserialise_over_defaults() {
    let settings = config::Config::builder()
      .set_override("temp_threshold", 10.0)
      .unwrap()
      .set_override("time_window_seconds", 25_i64)
      .unwrap()
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(cfg.temp_threshold, 10.0);
    assert_eq!(cfg.time_window_seconds, 25);
    assert_eq!(cfg.device_a, "Inside");
  }
}
