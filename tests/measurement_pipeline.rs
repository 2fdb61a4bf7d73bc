//! End-to-end pipeline tests over a synthetic endpoint.
//!
//! The endpoint provider is injected and the test server is a local
//! wiremock instance, so the whole latency -> download -> upload pipeline
//! runs deterministically without touching the real network.

use netspeed_tester::{
    error::AppError,
    logging::DebugLogger,
    models::{ClientInfo, Endpoint, JsonReport, RunConfig},
    progress::ProgressEvent,
    provider::StaticProvider,
    SpeedTestApp,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wiremock server behaving like a speedtest endpoint.
async fn start_endpoint() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/speedtest/latency.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("test=test"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/speedtest/random\d+x\d+\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64 * 1024]))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/speedtest/upload.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("size=262144"))
        .mount(&server)
        .await;

    server
}

fn endpoint_for(server: &MockServer) -> Endpoint {
    Endpoint::from_upload_url(
        "9001",
        "Test Sponsor",
        "Localhost",
        "Testland",
        &format!("{}/speedtest/upload.php", server.uri()),
        false,
    )
    .unwrap()
}

fn provider_for(server: &MockServer) -> Arc<StaticProvider> {
    Arc::new(StaticProvider::new(
        vec![endpoint_for(server)],
        Some(ClientInfo {
            ip: "203.0.113.7".to_string(),
            isp: "Test ISP".to_string(),
            country: "Testland".to_string(),
        }),
    ))
}

fn test_config() -> RunConfig {
    RunConfig {
        duration: Duration::from_secs(1),
        connections: 2,
        probe_timeout: Duration::from_millis(1500),
        enable_color: false,
        live_mode: false,
        ..RunConfig::default()
    }
}

fn app_with(config: RunConfig, provider: Arc<StaticProvider>) -> SpeedTestApp {
    SpeedTestApp::with_provider(config, provider, DebugLogger::new(false, false))
}

async fn drain(mut rx: mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        if matches!(event, ProgressEvent::Finished) {
            break;
        }
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_full_run_produces_complete_result() {
    let server = start_endpoint().await;
    let app = app_with(test_config(), provider_for(&server));
    let (tx, rx) = mpsc::unbounded_channel();

    let result = app.run(tx).await.unwrap();
    let events = drain(rx).await;

    let latency = result.latency.expect("latency stats");
    assert!(latency.avg_ms > 0.0);
    assert!(latency.min_ms <= latency.avg_ms);
    assert!(!latency.low_confidence);

    assert!(result.download_mbps.expect("download rate") > 0.0);
    assert!(result.upload_mbps.expect("upload rate") > 0.0);
    assert_eq!(result.client.as_ref().unwrap().isp, "Test ISP");
    assert_eq!(result.endpoint.as_ref().unwrap().id, "9001");

    // The pipeline reported its stages and live rates on the way.
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::EndpointChosen { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::RateUpdate { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::DownloadDone { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::UploadDone { .. })));
}

#[tokio::test]
async fn test_download_only_leaves_upload_unset() {
    let server = start_endpoint().await;
    let config = RunConfig {
        run_upload: false,
        ..test_config()
    };
    let app = app_with(config, provider_for(&server));
    let (tx, rx) = mpsc::unbounded_channel();

    let result = app.run(tx).await.unwrap();
    let events = drain(rx).await;

    assert!(result.download_mbps.is_some());
    assert_eq!(result.upload_mbps, None);
    assert!(!events.iter().any(|e| matches!(e, ProgressEvent::UploadDone { .. })));

    // The JSON document keeps the distinction between skipped and zero.
    let json = serde_json::to_value(JsonReport::from_result(&result)).unwrap();
    assert!(json["upload_mbps"].is_null());
}

#[tokio::test]
async fn test_upload_only_leaves_download_unset() {
    let server = start_endpoint().await;
    let config = RunConfig {
        run_download: false,
        ..test_config()
    };
    let app = app_with(config, provider_for(&server));
    let (tx, _rx) = mpsc::unbounded_channel();

    let result = app.run(tx).await.unwrap();
    assert_eq!(result.download_mbps, None);
    assert!(result.upload_mbps.is_some());
}

#[tokio::test]
async fn test_unreachable_candidates_yield_probe_unreachable() {
    // Nothing listens on these ports; every probe must fail fast and the
    // ranked list must be exhausted.
    let provider = Arc::new(StaticProvider::new(
        vec![
            Endpoint::from_upload_url("1", "Dead One", "-", "-", "http://127.0.0.1:9/speedtest/upload.php", false).unwrap(),
            Endpoint::from_upload_url("2", "Dead Two", "-", "-", "http://127.0.0.1:9/speedtest/upload.php", false).unwrap(),
        ],
        None,
    ));
    let config = RunConfig {
        probe_count: 2,
        probe_timeout: Duration::from_millis(300),
        ..test_config()
    };
    let app = app_with(config, provider);
    let (tx, _rx) = mpsc::unbounded_channel();

    let err = app.run(tx).await.unwrap_err();
    assert!(matches!(err, AppError::ProbeUnreachable(_)));
    assert_ne!(err.exit_code(), 0);
}

#[tokio::test]
async fn test_probe_walks_ranked_list_to_first_reachable() {
    let server = start_endpoint().await;
    let dead = Endpoint::from_upload_url("1", "Dead", "-", "-", "http://127.0.0.1:9/speedtest/upload.php", false).unwrap();
    let provider = Arc::new(StaticProvider::new(vec![dead, endpoint_for(&server)], None));
    let config = RunConfig {
        probe_count: 3,
        probe_timeout: Duration::from_millis(500),
        run_upload: false,
        ..test_config()
    };
    let app = app_with(config, provider);
    let (tx, _rx) = mpsc::unbounded_channel();

    let result = app.run(tx).await.unwrap();
    assert_eq!(result.endpoint.as_ref().unwrap().id, "9001");
}

#[tokio::test]
async fn test_failing_transfers_fail_the_run_with_error_report() {
    // Latency answers, but every transfer request is rejected, so every
    // connection in both phases dies.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/speedtest/latency.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("test=test"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/speedtest/random\d+x\d+\.jpg$"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/speedtest/upload.php"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = Arc::new(StaticProvider::new(vec![endpoint_for(&server)], None));
    let app = app_with(test_config(), provider);
    let (tx, _rx) = mpsc::unbounded_channel();

    let err = app.run(tx).await.unwrap_err();
    assert!(matches!(err, AppError::TransferFailed(_)));
    assert_ne!(err.exit_code(), 0);

    // JSON mode for the same failure: an error field, no fabricated rates.
    let json = serde_json::to_value(JsonReport::from_error(&err)).unwrap();
    assert!(json["error"].as_str().unwrap().contains("Transfer failed"));
    assert!(json["download_mbps"].is_null());
    assert!(json["upload_mbps"].is_null());
}

#[tokio::test]
async fn test_single_failed_phase_becomes_warning_not_crash() {
    // Downloads work, uploads are rejected: the run succeeds with a
    // download figure, an unset upload and a warning.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/speedtest/latency.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("test=test"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/speedtest/random\d+x\d+\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64 * 1024]))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/speedtest/upload.php"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = Arc::new(StaticProvider::new(vec![endpoint_for(&server)], None));
    let app = app_with(test_config(), provider);
    let (tx, _rx) = mpsc::unbounded_channel();

    let result = app.run(tx).await.unwrap();
    assert!(result.download_mbps.is_some());
    assert_eq!(result.upload_mbps, None);
    assert!(result.warnings.iter().any(|w| w.contains("upload failed")));
}
