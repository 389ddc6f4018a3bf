//! Static configuration of the two paired temperature sensors and the
//! thresholds applied to their divergence.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Device pair ─────────────────────────────────────────────────────────────

/// Two temperature sensors whose readings are compared against each other,
/// typically one inside the room and one outside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPair")]
pub struct DevicePair {
  a: String,
  b: String,
}

#[derive(Deserialize)]
struct RawPair {
  a: String,
  b: String,
}

impl TryFrom<RawPair> for DevicePair {
  type Error = Error;

  fn try_from(raw: RawPair) -> Result<Self> { Self::new(raw.a, raw.b) }
}

impl DevicePair {
  /// Build a pair from two location identifiers. They must be non-empty and
  /// distinct, otherwise every reading would be its own partner.
  pub fn new(a: impl Into<String>, b: impl Into<String>) -> Result<Self> {
    let (a, b) = (a.into(), b.into());
    if a.trim().is_empty() || b.trim().is_empty() {
      return Err(Error::InvalidConfig(
        "device pair identifiers must not be empty".into(),
      ));
    }
    if a == b {
      return Err(Error::InvalidConfig(format!(
        "device pair identifiers must differ, both are {a:?}"
      )));
    }
    Ok(Self { a, b })
  }

  /// The location paired with `location`, or [`Error::UnknownDevice`] if it
  /// is neither configured device.
  pub fn partner_of(&self, location: &str) -> Result<&str> {
    if location == self.a {
      Ok(&self.b)
    } else if location == self.b {
      Ok(&self.a)
    } else {
      Err(Error::UnknownDevice(location.to_owned()))
    }
  }

  pub fn devices(&self) -> (&str, &str) { (&self.a, &self.b) }
}

// ─── Thresholds ──────────────────────────────────────────────────────────────

pub const DEFAULT_TEMP_THRESHOLD: f64 = 5.0;
pub const DEFAULT_TIME_WINDOW_SECONDS: i64 = 180;

/// Tunables of the unoccupied-space predicate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresenceThresholds {
  /// Minimum absolute temperature difference, in degrees, between the two
  /// paired readings.
  pub temp_threshold:      f64,
  /// Maximum absolute distance, in seconds, between the two paired readings.
  pub time_window_seconds: i64,
}

impl Default for PresenceThresholds {
  fn default() -> Self {
    Self {
      temp_threshold:      DEFAULT_TEMP_THRESHOLD,
      time_window_seconds: DEFAULT_TIME_WINDOW_SECONDS,
    }
  }
}

impl PresenceThresholds {
  pub fn validate(&self) -> Result<()> {
    if !self.temp_threshold.is_finite() || self.temp_threshold < 0.0 {
      return Err(Error::InvalidConfig(format!(
        "temp_threshold must be a non-negative number, got {}",
        self.temp_threshold
      )));
    }
    if self.time_window_seconds < 0 {
      return Err(Error::InvalidConfig(format!(
        "time_window_seconds must not be negative, got {}",
        self.time_window_seconds
      )));
    }
    Ok(())
  }
}
