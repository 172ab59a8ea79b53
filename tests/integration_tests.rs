//! Integration tests for the erebus scan engine
//!
//! Every test runs against throwaway HTTP servers on the loopback
//! interface; candidate addresses carry an explicit port so nothing needs
//! privileged sockets.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use erebus::{
    baseline::Baseline, config::AddressSource, Fingerprint, MatchField, Protocol, ScanConfig,
    ScanEngine, ScanError,
};

const ORIGIN_BODY: &str =
    "<html><head><title>Origin Test</title></head><body>served by origin</body></html>";

/// Connection counters shared with an instrumented test server
#[derive(Default)]
struct ServerStats {
    active: AtomicUsize,
    peak: AtomicUsize,
    hits: AtomicUsize,
}

/// Minimal HTTP/1.1 server: one canned response per connection, optional
/// per-request delay so concurrency is observable.
async fn spawn_server(
    body: String,
    status_line: &'static str,
    extra_headers: String,
    delay: Duration,
) -> (SocketAddr, Arc<ServerStats>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stats = Arc::new(ServerStats::default());

    let server_stats = stats.clone();
    tokio::spawn(async move {
        loop {
            let (mut stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let body = body.clone();
            let extra_headers = extra_headers.clone();
            let stats = server_stats.clone();

            tokio::spawn(async move {
                stats.hits.fetch_add(1, Ordering::SeqCst);
                let active = stats.active.fetch_add(1, Ordering::SeqCst) + 1;
                stats.peak.fetch_max(active, Ordering::SeqCst);

                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                tokio::time::sleep(delay).await;

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    extra_headers,
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;

                stats.active.fetch_sub(1, Ordering::SeqCst);
            });
        }
    });

    (addr, stats)
}

async fn spawn_ok_server(body: &str, delay: Duration) -> (SocketAddr, Arc<ServerStats>) {
    spawn_server(body.to_string(), "200 OK", String::new(), delay).await
}

/// An address on the loopback interface that refuses connections
async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

fn test_config(jobs: usize) -> ScanConfig {
    ScanConfig::new(
        "victim.example".to_string(),
        AddressSource::Cidr("203.0.113.0/24".to_string()),
    )
    .with_jobs(jobs)
    .with_timeout(2000)
}

fn origin_baseline() -> Baseline {
    Baseline {
        fingerprint: Fingerprint::from_bytes(ORIGIN_BODY.as_bytes()),
        protocol: Protocol::Http,
    }
}

#[tokio::test]
async fn test_baseline_capture_is_deterministic() {
    let (addr, _) = spawn_ok_server(ORIGIN_BODY, Duration::from_millis(0)).await;
    let domain = addr.to_string();

    let first = Baseline::capture(Protocol::Http, &domain, Duration::from_secs(2))
        .await
        .unwrap();
    let second = Baseline::capture(Protocol::Http, &domain, Duration::from_secs(2))
        .await
        .unwrap();

    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(first.fingerprint.title.as_deref(), Some("Origin Test"));
    assert_eq!(first.fingerprint.body_len, ORIGIN_BODY.len());
}

#[tokio::test]
async fn test_baseline_capture_rejects_non_2xx() {
    let (addr, _) = spawn_server(
        "oops".to_string(),
        "500 Internal Server Error",
        String::new(),
        Duration::from_millis(0),
    )
    .await;

    let result = Baseline::capture(Protocol::Http, &addr.to_string(), Duration::from_secs(2)).await;
    assert!(matches!(result, Err(ScanError::Baseline(_))));
}

#[tokio::test]
async fn test_baseline_capture_fails_on_dead_host() {
    let addr = dead_address().await;
    let result = Baseline::capture(Protocol::Http, &addr, Duration::from_secs(2)).await;
    assert!(matches!(result, Err(ScanError::Baseline(_))));
}

#[tokio::test]
async fn test_matching_candidate_emits_exactly_one_match() {
    let (addr, _) = spawn_ok_server(ORIGIN_BODY, Duration::from_millis(0)).await;

    let engine = ScanEngine::new(test_config(4), origin_baseline()).unwrap();
    let report = engine.scan(vec![addr.to_string()]).await.unwrap();

    assert_eq!(report.scanned, 1);
    assert_eq!(report.errors, 0);
    assert_eq!(report.matches.len(), 1);

    let m = &report.matches[0];
    assert_eq!(m.address, addr.to_string());
    assert_eq!(m.status, 200);
    assert_eq!(m.field, MatchField::Both);
    assert_eq!(m.title.as_deref(), Some("Origin Test"));
}

#[tokio::test]
async fn test_different_content_emits_no_match() {
    let other = "<html><head><title>Parked Domain</title></head><body>nothing here at all</body></html>";
    let (addr, _) = spawn_ok_server(other, Duration::from_millis(0)).await;

    let engine = ScanEngine::new(test_config(4), origin_baseline()).unwrap();
    let report = engine.scan(vec![addr.to_string()]).await.unwrap();

    assert_eq!(report.scanned, 1);
    assert!(report.matches.is_empty());
}

#[tokio::test]
async fn test_title_match_with_different_length() {
    // Same title, different body: only the title field matches.
    let candidate_body =
        "<html><head><title>Origin Test</title></head><body>different padding!</body></html>";
    assert_ne!(candidate_body.len(), ORIGIN_BODY.len());

    let (addr, _) = spawn_ok_server(candidate_body, Duration::from_millis(0)).await;

    let engine = ScanEngine::new(test_config(2), origin_baseline()).unwrap();
    let report = engine.scan(vec![addr.to_string()]).await.unwrap();

    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].field, MatchField::Title);
}

#[tokio::test]
async fn test_concurrency_never_exceeds_limit() {
    for jobs in [1usize, 4] {
        let (addr, stats) = spawn_ok_server(ORIGIN_BODY, Duration::from_millis(100)).await;
        let addresses: Vec<String> = (0..12).map(|_| addr.to_string()).collect();

        let engine = ScanEngine::new(test_config(jobs), origin_baseline()).unwrap();
        let report = engine.scan(addresses).await.unwrap();

        assert_eq!(report.scanned, 12);
        let peak = stats.peak.load(Ordering::SeqCst);
        assert!(
            peak <= jobs,
            "peak concurrency {} exceeded limit {}",
            peak,
            jobs
        );
        assert!(peak >= 1);
    }
}

#[tokio::test]
async fn test_barrier_no_probe_is_lost() {
    let (addr, stats) = spawn_ok_server(ORIGIN_BODY, Duration::from_millis(10)).await;

    // Ten live candidates and five that refuse connections.
    let mut addresses: Vec<String> = (0..10).map(|_| addr.to_string()).collect();
    for _ in 0..5 {
        addresses.push(dead_address().await);
    }
    let total = addresses.len();

    let engine = ScanEngine::new(test_config(8), origin_baseline()).unwrap();
    let report = engine.scan(addresses).await.unwrap();

    // Every dispatched probe completed; failures were counted, not dropped.
    assert_eq!(report.scanned, total);
    assert_eq!(report.errors, 5);
    assert_eq!(report.matches.len(), 10);
    assert_eq!(stats.hits.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_redirects_are_not_followed() {
    // The redirect target serves the baseline content; following it would
    // produce a false match.
    let (origin_addr, origin_stats) = spawn_ok_server(ORIGIN_BODY, Duration::from_millis(0)).await;
    let (redirect_addr, _) = spawn_server(
        String::new(),
        "301 Moved Permanently",
        format!("Location: http://{}/\r\n", origin_addr),
        Duration::from_millis(0),
    )
    .await;

    let engine = ScanEngine::new(test_config(2), origin_baseline()).unwrap();
    let report = engine.scan(vec![redirect_addr.to_string()]).await.unwrap();

    assert_eq!(report.scanned, 1);
    assert!(report.matches.is_empty());
    // The probe never chased the Location header.
    assert_eq!(origin_stats.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_address_list_completes_immediately() {
    let engine = ScanEngine::new(test_config(4), origin_baseline()).unwrap();
    let report = engine.scan(Vec::new()).await.unwrap();

    assert_eq!(report.scanned, 0);
    assert!(report.matches.is_empty());
}

#[tokio::test]
async fn test_engine_rejects_invalid_configuration() {
    assert!(ScanEngine::new(test_config(0), origin_baseline()).is_err());

    let config = ScanConfig::new(
        String::new(),
        AddressSource::Cidr("203.0.113.0/24".to_string()),
    );
    assert!(ScanEngine::new(config, origin_baseline()).is_err());
}
