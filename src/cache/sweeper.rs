//! Active Expiry Sweep
//!
//! Background task that periodically purges expired entries from every level.
//! Lookups already drop expired entries lazily; the sweep reclaims entries
//! nobody asks for again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::manager::CacheCore;

/// Handle to a running sweep task
pub(crate) struct SweepHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl SweepHandle {
    /// Spawn the sweep loop on the current tokio runtime
    pub(crate) fn spawn(core: Arc<CacheCore>, period: Duration) -> Self {
        let token = CancellationToken::new();
        let handle = tokio::spawn(run(core, period, token.clone()));
        Self { token, handle }
    }

    /// Signal the loop to stop
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the task has exited
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(core: Arc<CacheCore>, period: Duration, token: CancellationToken) {
    info!("Starting expiry sweep every {:?}", period);

    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; nothing has expired yet.
    tick.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                info!("Expiry sweep shutting down");
                break;
            }

            _ = tick.tick() => {
                let removed = core.sweep_expired();
                if removed > 0 {
                    debug!(removed, "Expiry sweep removed entries");
                }
            }
        }
    }
}
