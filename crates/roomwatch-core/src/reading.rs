//! Observations reported by the sensors, and the read models derived from
//! them.
//!
//! Readings are immutable once stored. Timestamps are whole seconds since the
//! Unix epoch, exactly as the firmware reports them.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The reserved "no window yet" value. Never current, never stored.
pub const NO_WINDOW: u32 = 0;

/// One temperature sample from a paired device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
  pub location:    String,
  pub timestamp:   i64,
  pub temperature: f64,
}

impl TemperatureReading {
  pub fn new(
    location: impl Into<String>,
    timestamp: i64,
    temperature: f64,
  ) -> Self {
    Self {
      location: location.into(),
      timestamp,
      temperature,
    }
  }

  /// Reject samples the store should never see: the DHT22 firmware reports a
  /// failed read as a missing value, which can surface here as NaN.
  pub fn validate(&self) -> Result<()> {
    if self.location.trim().is_empty() {
      return Err(Error::InvalidReading("location is empty".into()));
    }
    if !self.temperature.is_finite() {
      return Err(Error::InvalidReading(format!(
        "temperature {} is not a finite number",
        self.temperature
      )));
    }
    Ok(())
  }
}

/// The number of movements one PIR sensor counted during its reporting
/// period, tagged with the sync window that was current when it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionReading {
  pub location:       String,
  pub timestamp:      i64,
  pub movement_count: u32,
  pub sync_window:    u32,
}

/// Sum of movements and latest observation for one sync window.
///
/// Derived on demand; never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedMotion {
  pub total_movements: u64,
  pub last_timestamp:  Option<i64>,
}

impl AggregatedMotion {
  pub fn is_idle(&self) -> bool { self.total_movements == 0 }
}

/// All readings one motion sensor reported into a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationMotion {
  pub location:        String,
  pub total_movements: u64,
  /// Ordered by timestamp, oldest first.
  pub readings:        Vec<MotionReading>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn nan_temperature_is_rejected() {
    let r = TemperatureReading::new("Inside", 1000, f64::NAN);
    assert!(matches!(r.validate(), Err(Error::InvalidReading(_))));
  }

  #[test]
  fn blank_location_is_rejected() {
    let r = TemperatureReading::new("  ", 1000, 21.5);
    assert!(matches!(r.validate(), Err(Error::InvalidReading(_))));
  }

  #[test]
  fn ordinary_reading_is_valid() {
    let r = TemperatureReading::new("Inside", 1000, -4.0);
    assert!(r.validate().is_ok());
  }
}
