//! Handlers for `/temp`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/temp` | Body: [`TemperatureBody`]; evaluates presence, returns [`TemperatureAccepted`] |
//! | `GET`  | `/temp` | Latest reading per location, as [`LatestTemperature`] rows |

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use roomwatch_core::{
  presence::Outcome,
  reading::TemperatureReading,
  store::ReadingStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

// ─── Submit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TemperatureBody {
  #[serde(alias = "Location")]
  pub location:    String,
  /// Seconds since the Unix epoch, as measured by the device.
  #[serde(alias = "Timestamp")]
  pub timestamp:   i64,
  /// `null` when the sensor read failed on the device.
  #[serde(alias = "Temperature")]
  pub temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct TemperatureAccepted {
  pub accepted:    bool,
  pub alert_fired: bool,
  pub outcome:     Outcome,
  pub received_at: DateTime<Utc>,
}

/// `POST /temp`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<TemperatureBody>,
) -> Result<Json<TemperatureAccepted>, ApiError>
where
  S: ReadingStore,
{
  let temperature = body.temperature.ok_or_else(|| {
    ApiError::BadRequest(format!("no temperature in reading from {:?}", body.location))
  })?;

  let decision = state
    .monitor
    .submit_temperature(body.location, body.timestamp, temperature)
    .await?;

  Ok(Json(TemperatureAccepted {
    accepted:    true,
    alert_fired: decision.alert_fired,
    outcome:     decision.outcome,
    received_at: Utc::now(),
  }))
}

// ─── Latest ───────────────────────────────────────────────────────────────────

/// One row of `GET /temp`, in the field names the dashboard reads.
#[derive(Debug, Serialize)]
pub struct LatestTemperature {
  #[serde(rename = "Location")]
  pub location:    String,
  #[serde(rename = "Timestamps")]
  pub timestamp:   i64,
  #[serde(rename = "Temperature")]
  pub temperature: f64,
}

impl From<TemperatureReading> for LatestTemperature {
  fn from(r: TemperatureReading) -> Self {
    Self {
      location:    r.location,
      timestamp:   r.timestamp,
      temperature: r.temperature,
    }
  }
}

/// `GET /temp`
pub async fn latest<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<LatestTemperature>>, ApiError>
where
  S: ReadingStore,
{
  let readings = state.monitor.latest_temperatures().await?;
  Ok(Json(readings.into_iter().map(LatestTemperature::from).collect()))
}
