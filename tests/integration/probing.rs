//! Integration tests for the HTTP prober
//!
//! Every failure mode must come back as a DOWN verdict, never as an error.

use std::time::Duration;

use assert_matches::assert_matches;
use monitor_schedule::model::{ServiceType, Status};
use monitor_schedule::monitors::{DEFAULT_PROBE_TIMEOUT, HttpProber, ProbeFailure, Prober};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{create_http_monitor, create_test_monitor};

async fn server_returning(status: u16) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&mock_server)
        .await;
    mock_server
}

#[tokio::test]
async fn test_matching_status_is_up() {
    let mock_server = server_returning(200).await;
    let prober = HttpProber::new(DEFAULT_PROBE_TIMEOUT).unwrap();

    let outcome = prober
        .probe(&create_http_monitor(
            "ok",
            &format!("{}/health", mock_server.uri()),
        ))
        .await;

    assert_eq!(outcome.status, Status::Up);
    assert_eq!(outcome.http_status_code, Some(200));
    assert!(outcome.failure.is_none());
}

#[tokio::test]
async fn test_server_error_is_down() {
    let mock_server = server_returning(500).await;
    let prober = HttpProber::new(DEFAULT_PROBE_TIMEOUT).unwrap();

    let outcome = prober
        .probe(&create_http_monitor(
            "broken",
            &format!("{}/health", mock_server.uri()),
        ))
        .await;

    assert_eq!(outcome.status, Status::Down);
    assert_eq!(outcome.http_status_code, Some(500));
    assert_matches!(
        outcome.failure,
        Some(ProbeFailure::UnexpectedStatus { ref expected, actual: 500 }) if expected == "200"
    );
}

#[tokio::test]
async fn test_expected_non_200_response() {
    let mock_server = server_returning(204).await;
    let prober = HttpProber::new(DEFAULT_PROBE_TIMEOUT).unwrap();

    let mut monitor = create_http_monitor("no-content", &format!("{}/health", mock_server.uri()));
    monitor.response = "204".to_string();

    assert_eq!(prober.probe(&monitor).await.status, Status::Up);
}

#[tokio::test]
async fn test_slow_endpoint_times_out_as_down() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let prober = HttpProber::new(Duration::from_millis(200)).unwrap();

    let outcome = prober
        .probe(&create_http_monitor(
            "slow",
            &format!("{}/health", mock_server.uri()),
        ))
        .await;

    assert_eq!(outcome.status, Status::Down);
    assert_eq!(outcome.failure, Some(ProbeFailure::Timeout));
}

#[tokio::test]
async fn test_refused_connection_is_down() {
    // Grab a free port, then close it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let prober = HttpProber::new(DEFAULT_PROBE_TIMEOUT).unwrap();
    let outcome = prober
        .probe(&create_http_monitor(
            "refused",
            &format!("http://127.0.0.1:{port}/health"),
        ))
        .await;

    assert_eq!(outcome.status, Status::Down);
    assert_matches!(outcome.failure, Some(ProbeFailure::Connect(_)));
}

#[tokio::test]
async fn test_custom_type_uses_http_fallback() {
    let mock_server = server_returning(200).await;
    let prober = HttpProber::new(DEFAULT_PROBE_TIMEOUT).unwrap();

    let monitor = create_test_monitor(
        "grpc-gateway",
        ServiceType::Custom,
        &format!("{}/health", mock_server.uri()),
    );

    assert_eq!(prober.probe(&monitor).await.status, Status::Up);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_tcp_and_udp_do_not_touch_the_network() {
    let mock_server = server_returning(500).await;
    let prober = HttpProber::new(DEFAULT_PROBE_TIMEOUT).unwrap();

    for service_type in [ServiceType::Tcp, ServiceType::Udp] {
        let monitor = create_test_monitor("socket", service_type, &mock_server.uri());
        let outcome = prober.probe(&monitor).await;

        assert_eq!(outcome.status, Status::Up);
        assert_eq!(outcome.http_status_code, None);
    }

    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
