//! Conversions between domain types and the integer columns SQLite stores.
//!
//! SQLite only has signed 64-bit integers, so unsigned domain values are
//! widened on the way in and range-checked on the way out.

use roomwatch_core::reading::{MotionReading, TemperatureReading};

use crate::{Error, Result};

// ─── Integers ────────────────────────────────────────────────────────────────

pub fn encode_window(window: u32) -> i64 { i64::from(window) }

pub fn decode_window(raw: i64) -> Result<u32> {
  u32::try_from(raw).map_err(|_| Error::Corrupt(format!("sync_window {raw} out of range")))
}

pub fn decode_count(raw: i64) -> Result<u32> {
  u32::try_from(raw)
    .map_err(|_| Error::Corrupt(format!("movement_count {raw} out of range")))
}

/// Sums come back from `SUM()`, which is never negative for our data.
pub fn decode_total(raw: i64) -> Result<u64> {
  u64::try_from(raw)
    .map_err(|_| Error::Corrupt(format!("movement total {raw} is negative")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `temperature_readings` row.
pub struct RawTemperature {
  pub location:    String,
  pub timestamp:   i64,
  pub temperature: f64,
}

impl RawTemperature {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      location:    row.get(0)?,
      timestamp:   row.get(1)?,
      temperature: row.get(2)?,
    })
  }

  pub fn into_reading(self) -> TemperatureReading {
    TemperatureReading::new(self.location, self.timestamp, self.temperature)
  }
}

/// Raw values read directly from a `motion_readings` row.
pub struct RawMotion {
  pub location:       String,
  pub timestamp:      i64,
  pub movement_count: i64,
  pub sync_window:    i64,
}

impl RawMotion {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      location:       row.get(0)?,
      timestamp:      row.get(1)?,
      movement_count: row.get(2)?,
      sync_window:    row.get(3)?,
    })
  }

  pub fn into_reading(self) -> Result<MotionReading> {
    Ok(MotionReading {
      location:       self.location,
      timestamp:      self.timestamp,
      movement_count: decode_count(self.movement_count)?,
      sync_window:    decode_window(self.sync_window)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn negative_window_is_corrupt() {
    assert!(matches!(decode_window(-1), Err(Error::Corrupt(_))));
    assert_eq!(decode_window(48).unwrap(), 48);
  }

  #[test]
  fn negative_total_is_corrupt() {
    assert!(decode_total(-3).is_err());
    assert_eq!(decode_total(0).unwrap(), 0);
  }
}
