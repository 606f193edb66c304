//! Background expiry sweep.
//!
//! # Responsibilities
//! - Periodically remove expired blacklist and country-block entries
//! - Evict idle per-IP state
//! - Survive a failing sweep and keep ticking until shutdown

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, Instant};

use crate::admission::engine::{AdmissionEngine, SweepReport};
use crate::admission::MAX_DURATION;
use crate::config::SweeperConfig;
use crate::observability::metrics;

pub struct ExpirySweeper {
    engine: Arc<AdmissionEngine>,
    interval: Duration,
    idle_after: Duration,
}

impl ExpirySweeper {
    pub fn new(engine: Arc<AdmissionEngine>, config: &SweeperConfig) -> Self {
        Self {
            engine,
            interval: config.interval().min(MAX_DURATION),
            idle_after: config.idle_evict(),
        }
    }

    pub async fn run(self, shutdown: broadcast::Receiver<()>) {
        self.run_with(shutdown, |sweeper| sweeper.engine.sweep(sweeper.idle_after))
            .await
    }

    async fn run_with<F>(self, mut shutdown: broadcast::Receiver<()>, mut sweep: F)
    where
        F: FnMut(&Self) -> SweepReport,
    {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            idle_evict_secs = self.idle_after.as_secs(),
            "Expiry sweeper starting"
        );

        // First sweep one interval after start.
        let start = Instant::now()
            .checked_add(self.interval)
            .unwrap_or_else(Instant::now);
        let mut ticker = time::interval_at(start, self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.guarded(|| sweep(&self));
                }
                _ = shutdown.recv() => {
                    tracing::info!("Expiry sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one sweep. A panic inside it is logged and the loop carries on.
    pub fn sweep_once(&self) -> Option<SweepReport> {
        self.guarded(|| self.engine.sweep(self.idle_after))
    }

    fn guarded(&self, sweep: impl FnOnce() -> SweepReport) -> Option<SweepReport> {
        match panic::catch_unwind(AssertUnwindSafe(sweep)) {
            Ok(report) => {
                if report.expired() > 0 {
                    tracing::info!(
                        ips = report.expired_ips,
                        countries = report.expired_countries,
                        "Expired blocks removed"
                    );
                }
                if report.idle_ips > 0 {
                    tracing::debug!(ips = report.idle_ips, "Idle per-IP state evicted");
                }
                metrics::record_sweep(&report);
                Some(report)
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(error = %message, "Expiry sweep failed");
                None
            }
        }
    }
}
