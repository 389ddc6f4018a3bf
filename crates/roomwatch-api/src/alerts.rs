//! `GET /ws`: WebSocket stream of presence alerts.
//!
//! Each connection gets its own broadcast receiver and one text frame per
//! alert: the bare alert message by default, or the whole [`PresenceAlert`]
//! as JSON with `?format=json`. Anything the client sends is ignored apart
//! from close frames. A connection whose send fails is dropped on the spot;
//! its receiver goes with it, so the sink stops counting it as a subscriber.

use axum::{
  extract::{
    Query, State,
    ws::{Message, WebSocket, WebSocketUpgrade},
  },
  response::Response,
};
use futures_util::{SinkExt as _, StreamExt as _};
use roomwatch_core::{alert::PresenceAlert, store::ReadingStore};
use serde::Deserialize;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::{debug, info, warn};

use crate::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFormat {
  /// Just [`PresenceAlert::message`].
  #[default]
  Text,
  Json,
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamParams {
  #[serde(default)]
  pub format: AlertFormat,
}

/// `GET /ws`
pub async fn stream<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<StreamParams>,
  ws: WebSocketUpgrade,
) -> Response
where
  S: ReadingStore,
{
  // Subscribe before the upgrade so no alert between handshake and task
  // start is missed.
  let alerts = state.alerts.subscribe();
  ws.on_upgrade(move |socket| forward(socket, alerts, params.format))
}

fn encode(alert: &PresenceAlert, format: AlertFormat) -> Option<String> {
  match format {
    AlertFormat::Text => Some(alert.message.clone()),
    AlertFormat::Json => serde_json::to_string(alert)
      .inspect_err(|e| warn!(error = %e, "could not encode alert"))
      .ok(),
  }
}

async fn forward(
  socket: WebSocket,
  mut alerts: Receiver<PresenceAlert>,
  format: AlertFormat,
) {
  let (mut sender, mut receiver) = socket.split();
  info!("alert subscriber connected");

  loop {
    tokio::select! {
      next = alerts.recv() => match next {
        Ok(alert) => {
          let Some(frame) = encode(&alert, format) else { continue };
          if let Err(e) = sender.send(Message::Text(frame.into())).await {
            debug!(error = %e, "alert subscriber unreachable, dropping");
            break;
          }
        }
        Err(RecvError::Lagged(skipped)) => {
          warn!(skipped, "alert subscriber fell behind");
        }
        Err(RecvError::Closed) => break,
      },
      incoming = receiver.next() => match incoming {
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
        Some(Ok(_)) => {}
      },
    }
  }

  info!("alert subscriber disconnected");
}
