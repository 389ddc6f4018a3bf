//! [`SqliteStore`]: the SQLite implementation of [`ReadingStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tracing::debug;

use roomwatch_core::{
  reading::{AggregatedMotion, MotionReading, TemperatureReading},
  store::ReadingStore,
};

use crate::{
  Result,
  encode::{RawMotion, RawTemperature, decode_total, encode_window},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A roomwatch reading store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every
/// method runs as one `call` on the connection thread, so the connection is
/// released on every exit path, early errors included.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ReadingStore impl ───────────────────────────────────────────────────────

impl ReadingStore for SqliteStore {
  type Error = crate::Error;

  // ── Temperature ───────────────────────────────────────────────────────────

  async fn insert_temperature(&self, reading: TemperatureReading) -> Result<bool> {
    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT OR IGNORE INTO temperature_readings (location, timestamp, temperature)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![reading.location, reading.timestamp, reading.temperature],
        )?;
        Ok(n == 1)
      })
      .await?;
    Ok(inserted)
  }

  async fn latest_temperature_for(
    &self,
    location: &str,
  ) -> Result<Option<TemperatureReading>> {
    let location = location.to_owned();

    let raw: Option<RawTemperature> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT location, timestamp, temperature
               FROM temperature_readings
               WHERE location = ?1
               ORDER BY timestamp DESC
               LIMIT 1",
              rusqlite::params![location],
              RawTemperature::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawTemperature::into_reading))
  }

  async fn latest_temperatures(&self) -> Result<Vec<TemperatureReading>> {
    let raws: Vec<RawTemperature> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT t.location, t.timestamp, t.temperature
           FROM temperature_readings t
           WHERE t.timestamp = (
             SELECT MAX(timestamp) FROM temperature_readings
             WHERE location = t.location
           )
           ORDER BY t.location",
        )?;
        let rows = stmt
          .query_map([], RawTemperature::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawTemperature::into_reading).collect())
  }

  // ── Motion ────────────────────────────────────────────────────────────────

  async fn insert_motion(&self, reading: MotionReading) -> Result<bool> {
    let window = encode_window(reading.sync_window);

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT OR IGNORE INTO motion_readings
             (location, timestamp, movement_count, sync_window)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            reading.location,
            reading.timestamp,
            reading.movement_count,
            window,
          ],
        )?;
        Ok(n == 1)
      })
      .await?;
    Ok(inserted)
  }

  async fn sum_motion(&self, window: u32) -> Result<AggregatedMotion> {
    let window = encode_window(window);

    let (total, last): (i64, Option<i64>) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COALESCE(SUM(movement_count), 0), MAX(timestamp)
           FROM motion_readings
           WHERE sync_window = ?1",
          rusqlite::params![window],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
      })
      .await?;

    Ok(AggregatedMotion {
      total_movements: decode_total(total)?,
      last_timestamp:  last,
    })
  }

  async fn motion_in_window(&self, window: u32) -> Result<Vec<MotionReading>> {
    let window = encode_window(window);

    let raws: Vec<RawMotion> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT location, timestamp, movement_count, sync_window
           FROM motion_readings
           WHERE sync_window = ?1
           ORDER BY location, timestamp",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![window], RawMotion::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMotion::into_reading).collect()
  }

  async fn delete_motion_in_range(&self, min_window: u32, max_window: u32) -> Result<u64> {
    let (lo, hi) = (encode_window(min_window), encode_window(max_window));

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM motion_readings WHERE sync_window BETWEEN ?1 AND ?2",
          rusqlite::params![lo, hi],
        )?)
      })
      .await?;

    debug!(min_window, max_window, deleted, "deleted motion readings");
    Ok(deleted as u64)
  }
}
