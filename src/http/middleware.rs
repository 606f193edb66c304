//! Admission middleware for Axum routers.
//!
//! An HTTP dispatcher layers this onto its router with
//! `axum::middleware::from_fn_with_state(engine, admission_middleware)` and
//! serves with `into_make_service_with_connect_info::<SocketAddr>()`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::admission::{AdmissionEngine, Decision};

/// Status code a denial is answered with.
pub fn status_for(decision: Decision) -> StatusCode {
    match decision {
        Decision::Allowed => StatusCode::OK,
        Decision::Blacklisted | Decision::RegionLimited => StatusCode::FORBIDDEN,
        Decision::RateLimited => StatusCode::TOO_MANY_REQUESTS,
    }
}

/// Decide on the peer address before the request reaches the inner service.
pub async fn admission_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(engine): State<Arc<AdmissionEngine>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let decision = engine.decide(addr.ip());

    if decision.is_allowed() {
        next.run(request).await
    } else {
        tracing::warn!(client = %addr.ip(), reason = %decision, "Request denied");
        (status_for(decision), decision.reason()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denials_map_to_client_errors() {
        assert_eq!(status_for(Decision::Blacklisted), StatusCode::FORBIDDEN);
        assert_eq!(status_for(Decision::RegionLimited), StatusCode::FORBIDDEN);
        assert_eq!(status_for(Decision::RateLimited), StatusCode::TOO_MANY_REQUESTS);
    }
}
