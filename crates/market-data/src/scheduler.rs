//! Periodic refresh task
//!
//! One cycle on startup (optional), then one per interval until the
//! cancellation token fires. Cancellation is only observed between cycles,
//! so a cycle in flight always runs to completion and publishes.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::MarketDataError;
use crate::refresh::Refresher;
use crate::Result;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to the spawned refresh task
pub struct RefreshHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Spawn the refresh loop on the current tokio runtime.
    pub fn spawn(
        refresher: Arc<Refresher>,
        interval: Duration,
        run_on_startup: bool,
        token: CancellationToken,
    ) -> Self {
        let task = tokio::spawn(run_loop(refresher, interval, run_on_startup, token.clone()));
        Self { token, task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the loop and wait for it, including any cycle in flight.
    pub async fn shutdown(self) -> Result<()> {
        self.token.cancel();
        self.task
            .await
            .map_err(|e| MarketDataError::Task(e.to_string()))
    }
}

async fn run_loop(
    refresher: Arc<Refresher>,
    interval: Duration,
    run_on_startup: bool,
    token: CancellationToken,
) {
    let period = if interval < MIN_INTERVAL {
        warn!(?interval, "Refresh interval too short, using {:?}", MIN_INTERVAL);
        MIN_INTERVAL
    } else {
        interval
    };

    info!(
        interval_secs = period.as_secs(),
        run_on_startup, "Starting market data refresh loop"
    );

    if run_on_startup && !token.is_cancelled() {
        run_once(&refresher).await;
    }

    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => {
                info!("Market data refresh loop shutting down");
                break;
            }
            _ = timer.tick() => {
                run_once(&refresher).await;
            }
        }
    }
}

async fn run_once(refresher: &Refresher) {
    if let Err(e) = refresher.run_cycle().await {
        error!(error = %e, "Refresh cycle failed");
    }
}
