//! End-to-end retry + circuit breaker scenario against a live upstream.

use std::time::Duration;

use resilient_fetch::resilience::BreakerState;

mod common;
use common::{SwitchableUpstream, FALLBACK, SERVER_BODY};

#[tokio::test]
async fn test_circuit_breaker_with_retry_scenario() {
    let (upstream, upstream_addr) = SwitchableUpstream::start().await;
    let (addr, service, shutdown) = common::start_service(common::test_config(upstream_addr)).await;
    let client = common::client();
    let url = format!("http://{}/", addr);

    let mut server_hits = 0;
    for i in 1..=7 {
        if i == 5 {
            upstream.fail();
        }

        let body = client.get(&url).send().await.unwrap().text().await.unwrap();

        if i >= 5 {
            // Failing upstream is contacted once per retry attempt.
            assert_eq!(body, FALLBACK, "call {}", i);
            server_hits += 3;
        } else {
            assert_eq!(body, SERVER_BODY, "call {}", i);
            server_hits += 1;
        }
        assert_eq!(upstream.hits(), server_hits, "call {}", i);
    }

    // 3 failures out of the last 5 calls reach the 60% threshold.
    assert_eq!(service.breaker().state(), BreakerState::Open);

    let body = client.get(&url).send().await.unwrap().text().await.unwrap();
    assert_eq!(body, FALLBACK);
    assert_eq!(upstream.hits(), server_hits, "open circuit must not reach the upstream");

    tokio::time::sleep(Duration::from_millis(1100)).await;

    // Half-open: three probes decide the next state.
    for i in 1..=5 {
        if i == 3 {
            upstream.recover();
        }

        let body = client.get(&url).send().await.unwrap().text().await.unwrap();

        match i {
            1 | 2 => {
                server_hits += 3;
                assert_eq!(body, FALLBACK, "probe {}", i);
            }
            3 => {
                server_hits += 1;
                assert_eq!(body, SERVER_BODY, "probe {}", i);
            }
            _ => {
                // Two of three probes failed, so the circuit is open again.
                assert_eq!(body, FALLBACK, "call {}", i);
            }
        }
        assert_eq!(upstream.hits(), server_hits, "probe {}", i);
    }
    assert_eq!(service.breaker().state(), BreakerState::Open);

    shutdown.trigger();
}

#[tokio::test]
async fn test_half_open_recovery_closes_circuit() {
    let (upstream, upstream_addr) = SwitchableUpstream::start().await;
    let mut config = common::test_config(upstream_addr);
    config.circuit_breaker.wait_duration_in_open_state_ms = 200;
    let (addr, service, shutdown) = common::start_service(config).await;
    let client = common::client();
    let url = format!("http://{}/", addr);

    upstream.fail();
    for _ in 0..5 {
        let body = client.get(&url).send().await.unwrap().text().await.unwrap();
        assert_eq!(body, FALLBACK);
    }
    assert_eq!(service.breaker().state(), BreakerState::Open);

    upstream.recover();
    tokio::time::sleep(Duration::from_millis(300)).await;

    for _ in 0..3 {
        let body = client.get(&url).send().await.unwrap().text().await.unwrap();
        assert_eq!(body, SERVER_BODY);
    }
    assert_eq!(service.breaker().state(), BreakerState::Closed);

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_timeout_does_not_abandon_admitted_call() {
    let upstream_addr = common::start_programmable_backend(|| async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        (200, SERVER_BODY.to_string())
    })
    .await;
    let mut config = common::test_config(upstream_addr);
    config.listener.request_timeout_ms = 50;
    let (addr, service, shutdown) = common::start_service(config).await;
    let client = common::client();

    let res = client.get(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(res.status(), 408);

    // The upstream call keeps running and still reports its outcome.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let snapshot = service.breaker().snapshot();
    assert_eq!(snapshot.buffered_calls, 1);
    assert_eq!(snapshot.failed_calls, 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_served_fallback() {
    // Nothing listens on this port once the listener is dropped.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);

    let (addr, service, shutdown) = common::start_service(common::test_config(dead_addr)).await;
    let client = common::client();

    let res = client.get(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), FALLBACK);
    assert_eq!(service.breaker().snapshot().failed_calls, 1);

    shutdown.trigger();
}
