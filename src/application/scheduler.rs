use crate::application::dispatcher::Dispatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Reference period between two periodic flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(500);

/// Periodic flush trigger.
///
/// Calls [`Dispatcher::flush`] on a fixed delay whether or not the buffer holds
/// anything. Overlap with eager flushes from the ingest path is resolved by the
/// dispatcher's permit, not here.
pub struct FlushScheduler;

impl FlushScheduler {
    /// Spawns the ticker task on the current tokio runtime.
    ///
    /// Once `shutdown` is cancelled the task stops ticking, runs a final
    /// [`Dispatcher::drain_all`] and returns.
    pub fn spawn(
        dispatcher: Arc<Dispatcher>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // A slow flush pushes the next tick back instead of bursting.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_ms = interval.as_millis() as u64, "flush scheduler started");

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let outcome = dispatcher.flush().await;
                        debug!(?outcome, "periodic flush");
                    }
                }
            }

            let drained = dispatcher.drain_all().await;
            info!(drained, "flush scheduler stopped after final flush");
        })
    }
}
