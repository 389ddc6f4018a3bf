//! Presence alerts and the sink they are delivered to.
//!
//! Delivery is best-effort. [`AlertSink::notify`] never blocks and never
//! fails; a subscriber that cannot keep up or has gone away is the sink's
//! problem, not the ingestion path's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

// ─── Alerts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
  /// Paired sensors diverged with no motion in the current window.
  Unoccupied,
  /// A sync window closed without any recorded motion.
  IdleWindow,
}

/// An ephemeral event indicating inferred unoccupancy. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceAlert {
  pub alert_id:     Uuid,
  pub kind:         AlertKind,
  pub message:      String,
  pub triggered_at: DateTime<Utc>,
}

impl PresenceAlert {
  pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
    Self {
      alert_id: Uuid::new_v4(),
      kind,
      message: message.into(),
      triggered_at: Utc::now(),
    }
  }
}

// ─── Sink ────────────────────────────────────────────────────────────────────

/// Where fired alerts go.
pub trait AlertSink: Send + Sync {
  /// Hand `alert` to every live subscriber. Must return promptly.
  fn notify(&self, alert: PresenceAlert);
}

/// Fan-out to any number of subscribers over a bounded broadcast channel.
///
/// Each subscriber owns its own receiver, so a slow or dead subscriber never
/// affects the others. Dropping a receiver removes it from the active set.
/// Cloning is cheap; clones share the channel.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
  tx: broadcast::Sender<PresenceAlert>,
}

impl BroadcastSink {
  /// `capacity` is the number of alerts a subscriber may fall behind by
  /// before it starts missing them.
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<PresenceAlert> {
    self.tx.subscribe()
  }

  pub fn subscriber_count(&self) -> usize { self.tx.receiver_count() }
}

impl AlertSink for BroadcastSink {
  fn notify(&self, alert: PresenceAlert) {
    match self.tx.send(alert) {
      Ok(n) => debug!(subscribers = n, "alert dispatched"),
      // No live subscribers; the alert is dropped.
      Err(broadcast::error::SendError(alert)) => {
        debug!(alert_id = %alert.alert_id, "alert dropped, no subscribers");
      }
    }
  }
}
