//! Handlers for `/motion` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/motion` | Body: [`MotionBody`]; tagged with the server's current window |
//! | `GET`  | `/motion/{window}` | `{total_movements, last_timestamp}` |
//! | `GET`  | `/motion/{window}/detail` | Readings grouped by location |

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::{DateTime, Utc};
use roomwatch_core::{
  reading::{AggregatedMotion, LocationMotion},
  store::ReadingStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

// ─── Submit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MotionBody {
  #[serde(alias = "Location")]
  pub location:       String,
  #[serde(alias = "Timestamp")]
  pub timestamp:      i64,
  #[serde(alias = "NumberMotion")]
  pub movement_count: u32,
  /// The window the device last fetched from `/count`. Informational only.
  #[serde(default, alias = "SyncNumber")]
  pub sync_window:    Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct MotionAccepted {
  pub accepted:    bool,
  /// The window the reading was actually tagged with.
  pub sync_window: u32,
  pub received_at: DateTime<Utc>,
}

/// `POST /motion`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<MotionBody>,
) -> Result<Json<MotionAccepted>, ApiError>
where
  S: ReadingStore,
{
  let sync_window = state
    .monitor
    .submit_motion(
      body.location,
      body.timestamp,
      body.movement_count,
      body.sync_window,
    )
    .await?;

  Ok(Json(MotionAccepted {
    accepted: true,
    sync_window,
    received_at: Utc::now(),
  }))
}

// ─── Reads ────────────────────────────────────────────────────────────────────

/// `GET /motion/{window}`
pub async fn aggregate<S>(
  State(state): State<AppState<S>>,
  Path(window): Path<u32>,
) -> Result<Json<AggregatedMotion>, ApiError>
where
  S: ReadingStore,
{
  Ok(Json(state.monitor.aggregated_motion(window).await?))
}

/// `GET /motion/{window}/detail`
pub async fn detail<S>(
  State(state): State<AppState<S>>,
  Path(window): Path<u32>,
) -> Result<Json<Vec<LocationMotion>>, ApiError>
where
  S: ReadingStore,
{
  Ok(Json(state.monitor.motion_detail(window).await?))
}
