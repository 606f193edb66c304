//! Engine behaviour under the documented default limits.

use std::time::Duration;

use admission_gate::admission::{AdmissionEngine, Decision};
use admission_gate::geo::StaticResolver;
use tokio::time::advance;

mod common;

use common::{addresses, default_engine, default_limits, engine, ip, resolver_for};

fn assert_consistent(engine: &AdmissionEngine) {
    let m = engine.metrics_snapshot();
    assert_eq!(m.total, m.allowed + m.blocked + m.blocked_by_geo, "{:?}", m);
}

#[tokio::test(start_paused = true)]
async fn burst_blacklists_until_expiry() {
    let engine = default_engine();
    let client = ip("198.51.100.10");

    for i in 0..40 {
        assert_eq!(engine.decide(client), Decision::Allowed, "request {}", i + 1);
    }
    assert_eq!(engine.decide(client), Decision::RateLimited);
    assert!(engine.is_blocked(client));
    assert_eq!(engine.metrics_snapshot().blacklisted, 1);

    assert_eq!(engine.decide(client), Decision::Blacklisted);
    advance(Duration::from_secs(299)).await;
    assert_eq!(engine.decide(client), Decision::Blacklisted);

    // Exactly at expiry the IP is evaluated normally again.
    advance(Duration::from_secs(1)).await;
    assert!(!engine.is_blocked(client));
    assert_eq!(engine.decide(client), Decision::Allowed);
    assert_consistent(&engine);
}

#[tokio::test(start_paused = true)]
async fn refill_admits_one_more_after_a_token_interval() {
    let engine = default_engine();
    let client = ip("198.51.100.11");

    for _ in 0..40 {
        assert_eq!(engine.decide(client), Decision::Allowed);
    }
    advance(Duration::from_millis(67)).await;
    assert_eq!(engine.decide(client), Decision::Allowed);

    // Bucket empty again and 42 requests inside the burst window.
    assert_eq!(engine.decide(client), Decision::RateLimited);
    assert_eq!(engine.decide(client), Decision::Blacklisted);
}

#[tokio::test(start_paused = true)]
async fn other_ips_are_unaffected_by_a_blacklisted_neighbour() {
    let engine = default_engine();
    let noisy = ip("198.51.100.12");
    let quiet = ip("198.51.100.13");

    for _ in 0..41 {
        engine.decide(noisy);
    }
    assert!(engine.is_blocked(noisy));
    assert_eq!(engine.decide(quiet), Decision::Allowed);
}

#[tokio::test(start_paused = true)]
async fn whitelist_overrides_blacklist() {
    let engine = default_engine();
    let client = ip("198.51.100.14");

    engine.blacklist(client, Duration::from_secs(600));
    assert_eq!(engine.decide(client), Decision::Blacklisted);

    engine.whitelist(client);
    assert!(!engine.is_blocked(client));
    assert_eq!(engine.decide(client), Decision::Allowed);
}

#[tokio::test(start_paused = true)]
async fn country_over_limit_is_blocked_for_its_ttl() {
    let hosts = addresses(1, 102);
    let engine = engine(default_limits(), resolver_for(&hosts, "CN"));

    for host in &hosts[..100] {
        assert_eq!(engine.decide(*host), Decision::Allowed);
    }
    assert_eq!(engine.decide(hosts[100]), Decision::RegionLimited);
    assert_eq!(engine.decide(hosts[101]), Decision::RegionLimited);
    assert_eq!(engine.decide(hosts[0]), Decision::RegionLimited);
    assert_eq!(engine.blocked_countries().len(), 1);

    advance(Duration::from_secs(899)).await;
    assert_eq!(engine.decide(hosts[5]), Decision::RegionLimited);

    advance(Duration::from_secs(1)).await;
    assert_eq!(engine.decide(hosts[5]), Decision::Allowed);
    assert_consistent(&engine);
}

#[tokio::test(start_paused = true)]
async fn country_window_resets_after_one_second() {
    let hosts = addresses(2, 120);
    let engine = engine(default_limits(), resolver_for(&hosts, "BR"));

    for host in &hosts[..60] {
        assert_eq!(engine.decide(*host), Decision::Allowed);
    }
    advance(Duration::from_millis(1500)).await;
    for host in &hosts[60..] {
        assert_eq!(engine.decide(*host), Decision::Allowed);
    }
    assert!(engine.blocked_countries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn trusted_and_unknown_countries_are_never_geo_blocked() {
    let trusted = addresses(3, 500);
    let unknown = addresses(4, 500);
    let engine = engine(default_limits(), resolver_for(&trusted, "tr"));

    for host in trusted.iter().chain(unknown.iter()) {
        assert_eq!(engine.decide(*host), Decision::Allowed);
    }
    assert_eq!(engine.metrics_snapshot().blocked_by_geo, 0);
}

#[tokio::test(start_paused = true)]
async fn geo_pass_runs_before_rate_limiting() {
    let hosts = addresses(5, 101);
    let engine = engine(default_limits(), resolver_for(&hosts, "RU"));

    for host in &hosts {
        engine.decide(*host);
    }
    // A geo denial never touches the IP's bucket.
    let tracked = engine.tracked_ips();
    assert_eq!(engine.decide(hosts[100]), Decision::RegionLimited);
    assert_eq!(engine.tracked_ips(), tracked);
}

#[tokio::test(start_paused = true)]
async fn connection_limit_blacklists_and_closes_floor_at_zero() {
    let engine = default_engine();
    let client = ip("198.51.100.20");

    for _ in 0..100 {
        assert!(engine.on_connection_open(client));
    }
    assert!(!engine.on_connection_open(client));
    assert!(engine.is_blocked(client));
    assert_eq!(engine.decide(client), Decision::Blacklisted);

    for _ in 0..150 {
        engine.on_connection_close(client);
    }
    assert_eq!(engine.connections(client), 0);
    assert!(engine.on_connection_open(client));
    assert_eq!(engine.connections(client), 1);
}

#[tokio::test(start_paused = true)]
async fn sweep_is_idempotent_and_keeps_live_entries() {
    let hosts = addresses(6, 101);
    let mut limits = default_limits();
    limits.country_block_ttl = Duration::from_secs(5);
    let engine = engine(limits, resolver_for(&hosts, "KP"));

    let short = ip("198.51.100.30");
    let long = ip("198.51.100.31");
    engine.blacklist(short, Duration::from_secs(5));
    engine.blacklist(long, Duration::from_secs(60));
    for host in &hosts {
        engine.decide(*host);
    }
    assert_eq!(engine.blocked_countries().len(), 1);

    let report = engine.sweep(Duration::from_secs(60));
    assert_eq!(report.expired(), 0);

    advance(Duration::from_secs(10)).await;
    let first = engine.sweep(Duration::from_secs(60));
    assert_eq!(first.expired_ips, 1);
    assert_eq!(first.expired_countries, 1);

    let second = engine.sweep(Duration::from_secs(60));
    assert_eq!(second.expired(), 0);
    assert!(engine.is_blocked(long));
    assert_eq!(engine.metrics_snapshot().blacklisted, 1);
}

#[tokio::test(start_paused = true)]
async fn sweep_reclaims_idle_ips() {
    let engine = default_engine();
    for host in addresses(7, 50) {
        engine.decide(host);
    }
    assert_eq!(engine.tracked_ips(), 50);

    advance(Duration::from_secs(60)).await;
    let report = engine.sweep(Duration::from_secs(60));
    assert_eq!(report.idle_ips, 50);
    assert_eq!(engine.tracked_ips(), 0);
}

#[tokio::test(start_paused = true)]
async fn metrics_add_up_across_mixed_outcomes() {
    let region = addresses(8, 110);
    let engine = engine(default_limits(), resolver_for(&region, "IR"));
    let local = ip("198.51.100.40");

    for host in &region {
        engine.decide(*host);
    }
    for _ in 0..45 {
        engine.decide(local);
    }

    let m = engine.metrics_snapshot();
    assert_eq!(m.total, 155);
    assert_eq!(m.allowed, 140);
    assert_eq!(m.blocked_by_geo, 10);
    // One rate-limit denial, then four blacklist denials.
    assert_eq!(m.blocked, 5);
    assert_consistent(&engine);
}

#[test]
fn parallel_callers_share_one_bucket() {
    let mut limits = default_limits();
    limits.rate = 0.001;
    limits.burst_capacity = 50;
    let engine = engine(limits, StaticResolver::new());
    let client = ip("198.51.100.50");

    let allowed: usize = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = &engine;
                s.spawn(move || {
                    (0..100)
                        .filter(|_| engine.decide(client).is_allowed())
                        .count()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(allowed, 50);
    assert_eq!(engine.metrics_snapshot().total, 800);
    assert_consistent(&engine);
}

#[test]
fn parallel_country_counting_denies_exactly_the_overflow() {
    let hosts = addresses(9, 400);
    let mut limits = default_limits();
    limits.country_rate_limit = 399;
    let engine = engine(limits, resolver_for(&hosts, "FR"));

    let denied: usize = std::thread::scope(|s| {
        let handles: Vec<_> = hosts
            .chunks(50)
            .map(|chunk| {
                let engine = &engine;
                s.spawn(move || {
                    chunk
                        .iter()
                        .filter(|host| engine.decide(**host) == Decision::RegionLimited)
                        .count()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(denied, 1);
}
