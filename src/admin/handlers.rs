use std::net::IpAddr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::admission::{BlockEntry, MetricsSnapshot};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub tracked_ips: usize,
}

#[derive(Debug, Serialize)]
pub struct ListChange {
    pub ip: IpAddr,
    pub changed: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        tracked_ips: state.engine.tracked_ips(),
    })
}

pub async fn get_metrics(State(state): State<AdminState>) -> Json<MetricsSnapshot> {
    Json(state.engine.metrics_snapshot())
}

pub async fn get_blacklist(State(state): State<AdminState>) -> Json<Vec<BlockEntry<IpAddr>>> {
    Json(state.engine.blacklisted())
}

pub async fn delete_blacklist(
    State(state): State<AdminState>,
    Path(ip): Path<IpAddr>,
) -> (StatusCode, Json<ListChange>) {
    let changed = state.engine.unblock(ip);
    let status = if changed { StatusCode::OK } else { StatusCode::NOT_FOUND };
    (status, Json(ListChange { ip, changed }))
}

pub async fn get_countries(State(state): State<AdminState>) -> Json<Vec<BlockEntry<String>>> {
    Json(state.engine.blocked_countries())
}

pub async fn post_whitelist(
    State(state): State<AdminState>,
    Path(ip): Path<IpAddr>,
) -> Json<ListChange> {
    let changed = state.engine.whitelist(ip);
    if changed {
        tracing::info!(ip = %ip, "IP whitelisted");
    }
    Json(ListChange { ip, changed })
}

pub async fn delete_whitelist(
    State(state): State<AdminState>,
    Path(ip): Path<IpAddr>,
) -> (StatusCode, Json<ListChange>) {
    let changed = state.engine.remove_whitelist(ip);
    if changed {
        tracing::info!(ip = %ip, "IP removed from whitelist");
    }
    let status = if changed { StatusCode::OK } else { StatusCode::NOT_FOUND };
    (status, Json(ListChange { ip, changed }))
}
