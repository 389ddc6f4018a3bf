//! Background task driving the sync window clock.

use std::{sync::Arc, time::Duration};

use roomwatch_core::{alert::AlertSink, monitor::Monitor, store::ReadingStore};
use tokio::{
  sync::watch,
  task::JoinHandle,
  time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info};

/// Spawn the ticker: every `period`, sweep the closing window and advance
/// the clock. The task exits once `shutdown` flips to `true` or its sender
/// is dropped.
pub fn spawn<S, A>(
  monitor: Arc<Monitor<S, A>>,
  period: Duration,
  mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
  S: ReadingStore + 'static,
  A: AlertSink + 'static,
{
  tokio::spawn(async move {
    // The first window starts now; it closes one full period later.
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(period_secs = period.as_secs(), "sync window ticker started");

    loop {
      tokio::select! {
        _ = ticks.tick() => {
          let tick = monitor.tick().await;
          debug!(closed = tick.closed, current = tick.current, "sync window tick");
        }
        changed = shutdown.changed() => {
          if changed.is_err() || *shutdown.borrow() {
            break;
          }
        }
      }
    }

    info!("sync window ticker stopped");
  })
}
