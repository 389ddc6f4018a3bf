//! Handlers exposing the current sync window.
//!
//! `/count` keeps the shape the motion firmware polls (`{"SyncNumber": n}`);
//! `/sync-window` is the same value under a readable name.

use axum::{Json, extract::State};
use roomwatch_core::store::ReadingStore;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FirmwareCount {
  #[serde(rename = "SyncNumber")]
  pub sync_number: u32,
}

#[derive(Debug, Serialize)]
pub struct CurrentWindow {
  pub sync_window: u32,
}

/// `GET /count`
pub async fn count<S>(State(state): State<AppState<S>>) -> Json<FirmwareCount>
where
  S: ReadingStore,
{
  Json(FirmwareCount {
    sync_number: state.monitor.current_sync_window().await,
  })
}

/// `GET /sync-window`
pub async fn current<S>(State(state): State<AppState<S>>) -> Json<CurrentWindow>
where
  S: ReadingStore,
{
  Json(CurrentWindow {
    sync_window: state.monitor.current_sync_window().await,
  })
}
