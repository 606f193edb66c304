//! Admin API: counters, block listings and whitelist management.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::admission::AdmissionEngine;
use crate::config::AdminConfig;

#[derive(Clone)]
pub struct AdminState {
    pub engine: Arc<AdmissionEngine>,
    pub api_key: Arc<str>,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind admin API on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("admin API failed: {0}")]
    Serve(#[from] std::io::Error),
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/metrics", get(get_metrics))
        .route("/admin/blacklist", get(get_blacklist))
        .route("/admin/blacklist/{ip}", delete(delete_blacklist))
        .route("/admin/countries", get(get_countries))
        .route("/admin/whitelist/{ip}", post(post_whitelist).delete(delete_whitelist))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the admin API.
pub async fn bind(config: &AdminConfig) -> Result<TcpListener, ServerError> {
    TcpListener::bind(&config.bind_address)
        .await
        .map_err(|source| ServerError::Bind {
            address: config.bind_address.clone(),
            source,
        })
}

/// Serve the admin API until shutdown is signalled.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), ServerError> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}
