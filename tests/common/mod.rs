//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use admission_gate::admission::{AdmissionEngine, Limits};
use admission_gate::geo::StaticResolver;

/// The documented default limits.
pub fn default_limits() -> Limits {
    Limits {
        rate: 15.0,
        burst_capacity: 40,
        connection_limit: 100,
        block_ttl: Duration::from_secs(300),
        trusted_countries: HashSet::from(["TR".to_string()]),
        country_rate_limit: 100,
        country_block_ttl: Duration::from_secs(900),
    }
}

pub fn engine(limits: Limits, resolver: StaticResolver) -> Arc<AdmissionEngine> {
    Arc::new(AdmissionEngine::new(limits, Arc::new(resolver)))
}

pub fn default_engine() -> Arc<AdmissionEngine> {
    engine(default_limits(), StaticResolver::new())
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

/// `count` distinct addresses in 10.`block`.0.0/16.
pub fn addresses(block: u8, count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| IpAddr::V4(Ipv4Addr::new(10, block, (i / 256) as u8, (i % 256) as u8)))
        .collect()
}

/// Map every address to `country`.
pub fn resolver_for(addresses: &[IpAddr], country: &str) -> StaticResolver {
    let mut resolver = StaticResolver::new();
    for ip in addresses {
        resolver.insert(*ip, country);
    }
    resolver
}

/// Serve a single `/` route behind the admission middleware on an
/// ephemeral port.
pub async fn spawn_gated_app(engine: Arc<AdmissionEngine>) -> std::net::SocketAddr {
    use axum::{middleware, routing::get, Router};
    use admission_gate::http::middleware::admission_middleware;

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .layer(middleware::from_fn_with_state(engine, admission_middleware))
        .into_make_service_with_connect_info::<std::net::SocketAddr>();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
