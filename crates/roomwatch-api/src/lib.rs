//! JSON + WebSocket HTTP API for roomwatch.
//!
//! Exposes an axum [`Router`] over a [`Monitor`] backed by any
//! [`ReadingStore`], with alerts fanned out through a [`BroadcastSink`].
//! Request bodies accept both the firmware's field names (`Location`,
//! `NumberMotion`, ...) and snake_case. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/` | Health check |
//! | `GET`/`POST` | `/temp` | See [`temperature`] |
//! | `POST` | `/motion` | See [`motion`] |
//! | `GET`  | `/motion/{window}` | Aggregated motion |
//! | `GET`  | `/motion/{window}/detail` | Per-location motion |
//! | `GET`  | `/count`, `/sync-window` | See [`sync_window`] |
//! | `GET`  | `/ws` | See [`alerts`] |

pub mod alerts;
pub mod error;
pub mod motion;
pub mod sync_window;
pub mod temperature;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use roomwatch_core::{alert::BroadcastSink, monitor::Monitor, store::ReadingStore};
use serde_json::{Value, json};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub monitor: Arc<Monitor<S, BroadcastSink>>,
  /// The same channel the monitor notifies; WebSocket clients subscribe here.
  pub alerts:  BroadcastSink,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      monitor: self.monitor.clone(),
      alerts:  self.alerts.clone(),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: ReadingStore + 'static,
{
  Router::new()
    .route("/", get(health))
    // Temperature
    .route("/temp", get(temperature::latest::<S>).post(temperature::submit::<S>))
    // Motion
    .route("/motion", post(motion::submit::<S>))
    .route("/motion/{window}", get(motion::aggregate::<S>))
    .route("/motion/{window}/detail", get(motion::detail::<S>))
    // Sync window
    .route("/count", get(sync_window::count::<S>))
    .route("/sync-window", get(sync_window::current::<S>))
    // Alerts
    .route("/ws", get(alerts::stream::<S>))
    .with_state(state)
}

/// `GET /`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
