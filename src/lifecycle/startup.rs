//! Startup orchestration.
//!
//! Order: geo database → engine → metrics exporter → admin API → sweeper.
//! Any startup error is fatal; once running, only a signal stops the gate.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::admin::{self, AdminState, ServerError};
use crate::admission::{AdmissionEngine, ExpirySweeper};
use crate::config::GateConfig;
use crate::geo::GeoDatabase;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Admin(#[from] ServerError),
}

/// Build the engine from `config` and run until SIGINT/SIGTERM.
pub async fn run(config: GateConfig) -> Result<(), StartupError> {
    let geo = GeoDatabase::open_or_degraded(config.geo.database_path.as_deref());
    let engine = Arc::new(AdmissionEngine::from_config(
        &config.admission,
        &config.geo,
        Arc::new(geo),
    ));

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();

    let admin_task = if config.admin.enabled {
        let listener = admin::bind(&config.admin).await?;
        let state = AdminState {
            engine: Arc::clone(&engine),
            api_key: Arc::from(config.admin.api_key.as_str()),
        };
        Some(tokio::spawn(admin::serve(listener, state, shutdown.subscribe())))
    } else {
        None
    };

    let sweeper = ExpirySweeper::new(Arc::clone(&engine), &config.sweeper);
    let sweeper_task = tokio::spawn(sweeper.run(shutdown.subscribe()));

    tracing::info!("Admission gate running");
    signals::shutdown_signal().await;
    shutdown.trigger();

    if let Err(e) = sweeper_task.await {
        tracing::error!(error = %e, "Expiry sweeper task failed");
    }
    if let Some(task) = admin_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Admin API exited with error"),
            Err(e) => tracing::error!(error = %e, "Admin API task failed"),
        }
    }

    let snapshot = engine.metrics_snapshot();
    tracing::info!(
        total = snapshot.total,
        allowed = snapshot.allowed,
        blocked = snapshot.blocked,
        blocked_by_geo = snapshot.blocked_by_geo,
        "Shutdown complete"
    );
    Ok(())
}
