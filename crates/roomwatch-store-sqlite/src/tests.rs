//! Integration tests for `SqliteStore` against an in-memory database.

use roomwatch_core::{
  reading::{AggregatedMotion, MotionReading, TemperatureReading},
  store::ReadingStore,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn motion(location: &str, timestamp: i64, count: u32, window: u32) -> MotionReading {
  MotionReading {
    location: location.into(),
    timestamp,
    movement_count: count,
    sync_window: window,
  }
}

// ─── Temperature ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn latest_temperature_for_missing_location_is_none() {
  let s = store().await;
  assert!(s.latest_temperature_for("Inside").await.unwrap().is_none());
}

#[tokio::test]
async fn latest_temperature_picks_newest_timestamp() {
  let s = store().await;
  s.insert_temperature(TemperatureReading::new("Inside", 2000, 23.5))
    .await
    .unwrap();
  s.insert_temperature(TemperatureReading::new("Inside", 1000, 21.0))
    .await
    .unwrap();
  s.insert_temperature(TemperatureReading::new("Outside", 3000, 31.0))
    .await
    .unwrap();

  let latest = s.latest_temperature_for("Inside").await.unwrap().unwrap();
  assert_eq!(latest, TemperatureReading::new("Inside", 2000, 23.5));
}

#[tokio::test]
async fn duplicate_temperature_is_ignored() {
  let s = store().await;
  let reading = TemperatureReading::new("Inside", 1000, 21.0);
  assert!(s.insert_temperature(reading.clone()).await.unwrap());
  assert!(!s.insert_temperature(reading).await.unwrap());

  // The first value wins.
  assert!(
    !s.insert_temperature(TemperatureReading::new("Inside", 1000, 99.0))
      .await
      .unwrap()
  );
  let latest = s.latest_temperature_for("Inside").await.unwrap().unwrap();
  assert_eq!(latest.temperature, 21.0);
}

#[tokio::test]
async fn latest_temperatures_one_per_location() {
  let s = store().await;
  for (loc, ts, t) in [
    ("Outside", 1000, 30.0),
    ("Inside", 1000, 22.0),
    ("Inside", 1800, 22.5),
    ("Outside", 1800, 29.0),
  ] {
    s.insert_temperature(TemperatureReading::new(loc, ts, t))
      .await
      .unwrap();
  }

  let latest = s.latest_temperatures().await.unwrap();
  assert_eq!(
    latest,
    vec![
      TemperatureReading::new("Inside", 1800, 22.5),
      TemperatureReading::new("Outside", 1800, 29.0),
    ]
  );
}

// ─── Motion ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_window_sums_to_zero() {
  let s = store().await;
  assert_eq!(s.sum_motion(1).await.unwrap(), AggregatedMotion::default());
}

#[tokio::test]
async fn sum_motion_totals_and_max_timestamp() {
  let s = store().await;
  s.insert_motion(motion("sensor1", 100, 2, 5)).await.unwrap();
  s.insert_motion(motion("sensor2", 300, 0, 5)).await.unwrap();
  s.insert_motion(motion("sensor3", 200, 4, 5)).await.unwrap();
  s.insert_motion(motion("sensor1", 900, 9, 6)).await.unwrap();

  let agg = s.sum_motion(5).await.unwrap();
  assert_eq!(agg.total_movements, 6);
  assert_eq!(agg.last_timestamp, Some(300));
}

#[tokio::test]
async fn zero_count_readings_still_set_last_timestamp() {
  let s = store().await;
  s.insert_motion(motion("sensor1", 450, 0, 2)).await.unwrap();
  let agg = s.sum_motion(2).await.unwrap();
  assert_eq!(agg.total_movements, 0);
  assert_eq!(agg.last_timestamp, Some(450));
}

#[tokio::test]
async fn motion_in_window_is_ordered() {
  let s = store().await;
  s.insert_motion(motion("sensor2", 100, 1, 3)).await.unwrap();
  s.insert_motion(motion("sensor1", 200, 1, 3)).await.unwrap();
  s.insert_motion(motion("sensor1", 150, 1, 3)).await.unwrap();
  s.insert_motion(motion("sensor1", 50, 1, 4)).await.unwrap();

  let rows = s.motion_in_window(3).await.unwrap();
  let keys: Vec<(&str, i64)> = rows
    .iter()
    .map(|m| (m.location.as_str(), m.timestamp))
    .collect();
  assert_eq!(keys, vec![("sensor1", 150), ("sensor1", 200), ("sensor2", 100)]);
}

#[tokio::test]
async fn delete_motion_in_range_is_inclusive() {
  let s = store().await;
  for w in 1..=5 {
    s.insert_motion(motion("sensor1", i64::from(w) * 10, 1, w))
      .await
      .unwrap();
  }

  let deleted = s.delete_motion_in_range(2, 4).await.unwrap();
  assert_eq!(deleted, 3);
  assert_eq!(s.sum_motion(1).await.unwrap().total_movements, 1);
  assert_eq!(s.sum_motion(3).await.unwrap().total_movements, 0);
  assert_eq!(s.sum_motion(5).await.unwrap().total_movements, 1);
}

#[tokio::test]
async fn duplicate_motion_is_ignored() {
  let s = store().await;
  assert!(s.insert_motion(motion("sensor1", 100, 3, 1)).await.unwrap());
  assert!(!s.insert_motion(motion("sensor1", 100, 3, 1)).await.unwrap());
  assert_eq!(s.sum_motion(1).await.unwrap().total_movements, 3);
}
