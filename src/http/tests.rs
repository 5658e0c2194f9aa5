use super::*;
use crate::error::{HttpError, TransportError};
use crate::shutdown::StopSignal;
use async_trait::async_trait;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

fn config(requests: u64, workers: usize) -> LoadTestConfig {
    LoadTestConfig {
        url: "http://localhost:8080/health".to_owned(),
        method: "GET".to_owned(),
        user_agent: "load-test/test".to_owned(),
        timeout: Duration::from_secs(1),
        requests,
        workers,
    }
}

#[derive(Default)]
struct StaticTransport {
    status: u16,
    calls: AtomicU64,
}

impl StaticTransport {
    fn new(status: u16) -> Self {
        Self {
            status,
            calls: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn send(&self, _template: &RequestTemplate) -> Result<u16, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.status)
    }
}

#[derive(Default)]
struct ClosedConnectionTransport {
    calls: AtomicU64,
}

#[async_trait]
impl Transport for ClosedConnectionTransport {
    async fn send(&self, _template: &RequestTemplate) -> Result<u16, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::Io {
            source: std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection closed before message completed",
            ),
        })
    }
}

/// Raises the tester's stop signal while serving its `stop_at`-th request.
struct StopDuringRequestTransport {
    stop: OnceLock<StopSignal>,
    stop_at: u64,
    calls: AtomicU64,
}

#[async_trait]
impl Transport for StopDuringRequestTransport {
    async fn send(&self, _template: &RequestTemplate) -> Result<u16, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if call == self.stop_at {
            if let Some(stop) = self.stop.get() {
                stop.stop();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        Ok(200)
    }
}

#[test]
fn new_builds_template_from_config() -> Result<(), String> {
    let tester = LoadTester::new(config(100, 5)).map_err(|err| err.to_string())?;
    let template = tester.template();
    if template.method().as_str() != "GET" {
        return Err(format!("Unexpected method: {}", template.method()));
    }
    if template.url().as_str() != "http://localhost:8080/health" {
        return Err(format!("Unexpected url: {}", template.url()));
    }
    if template.user_agent() != Some("load-test/test") {
        return Err(format!("Unexpected user agent: {:?}", template.user_agent()));
    }
    if !tester.result().is_empty() {
        return Err("Expected empty result before start".to_owned());
    }
    if tester.config().quota() != 20 {
        return Err(format!("Unexpected quota: {}", tester.config().quota()));
    }
    Ok(())
}

#[test]
fn template_builds_independent_requests() -> Result<(), String> {
    let template = RequestTemplate::new("DELETE", "https://example.com/items/1", "ua/1.0")
        .map_err(|err| err.to_string())?;
    let first = template.to_request();
    let second = template.to_request();
    if first.method() != reqwest::Method::DELETE {
        return Err(format!("Unexpected method: {}", first.method()));
    }
    if first.url() != second.url() {
        return Err("Requests should target the same URL".to_owned());
    }
    let agent = first
        .headers()
        .get(reqwest::header::USER_AGENT)
        .and_then(|value| value.to_str().ok());
    if agent != Some("ua/1.0") {
        return Err(format!("Unexpected user agent header: {:?}", agent));
    }
    if first.body().is_some() {
        return Err("Template requests should carry no body".to_owned());
    }
    Ok(())
}

#[test]
fn construction_rejects_invalid_method() -> Result<(), String> {
    let mut cfg = config(10, 1);
    cfg.method = "GE T".to_owned();
    match LoadTester::new(cfg) {
        Err(HttpError::InvalidMethod { method, .. }) if method == "GE T" => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected invalid method error".to_owned()),
    }
}

#[test]
fn construction_rejects_invalid_url() -> Result<(), String> {
    let mut cfg = config(10, 1);
    cfg.url = "not a url".to_owned();
    match LoadTester::new(cfg) {
        Err(HttpError::InvalidUrl { url, .. }) if url == "not a url" => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected invalid URL error".to_owned()),
    }
}

#[test]
fn construction_rejects_invalid_user_agent() -> Result<(), String> {
    let mut cfg = config(10, 1);
    cfg.user_agent = "bad\nagent".to_owned();
    match LoadTester::new(cfg) {
        Err(HttpError::InvalidUserAgent { .. }) => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected invalid user agent error".to_owned()),
    }
}

#[test]
fn zero_timeout_disables_transport_timeout() -> Result<(), String> {
    let transport = HttpTransport::new(Duration::ZERO).map_err(|err| err.to_string())?;
    if transport.timeout().is_some() {
        return Err("Expected no timeout".to_owned());
    }
    let transport = HttpTransport::new(Duration::from_secs(3)).map_err(|err| err.to_string())?;
    if transport.timeout() != Some(Duration::from_secs(3)) {
        return Err(format!("Unexpected timeout: {:?}", transport.timeout()));
    }
    Ok(())
}

#[test]
fn even_split_records_every_request() -> Result<(), String> {
    run_async_test(async {
        let transport = Arc::new(StaticTransport::new(200));
        let tester = LoadTester::with_transport(config(20, 5), transport.clone())
            .map_err(|err| err.to_string())?;

        let report = tester.start().await;

        let result = tester.result();
        if result.get(200) != 20 || result.len() != 1 {
            return Err(format!("Unexpected result: {:?}", result));
        }
        if report.attempted != 20 || report.undispatched != 0 || report.stopped {
            return Err(format!("Unexpected report: {:?}", report));
        }
        if transport.calls.load(Ordering::SeqCst) != 20 {
            return Err("Transport call count mismatch".to_owned());
        }
        Ok(())
    })
}

#[test]
fn remainder_is_not_dispatched() -> Result<(), String> {
    run_async_test(async {
        let transport = Arc::new(StaticTransport::new(200));
        let tester = LoadTester::with_transport(config(100, 3), transport.clone())
            .map_err(|err| err.to_string())?;

        let report = tester.start().await;

        if tester.result().total() != 99 {
            return Err(format!("Expected 99, got {}", tester.result().total()));
        }
        if report.quota != 33 || report.attempted != 99 || report.undispatched != 1 {
            return Err(format!("Unexpected report: {:?}", report));
        }
        if transport.calls.load(Ordering::SeqCst) != 99 {
            return Err("Transport call count mismatch".to_owned());
        }
        Ok(())
    })
}

#[test]
fn attempted_requests_follow_quota_split() -> Result<(), String> {
    run_async_test(async {
        for requests in 1..=12u64 {
            for workers in 1..=5usize {
                let transport = Arc::new(StaticTransport::new(204));
                let tester = LoadTester::with_transport(config(requests, workers), transport.clone())
                    .map_err(|err| err.to_string())?;
                let report = tester.start().await;

                let workers_u64 = u64::try_from(workers).map_err(|err| err.to_string())?;
                let expected = (requests / workers_u64) * workers_u64;
                if report.attempted != expected || tester.result().total() != expected {
                    return Err(format!(
                        "T={} W={}: expected {}, got {:?}",
                        requests, workers, expected, report
                    ));
                }
            }
        }
        Ok(())
    })
}

#[test]
fn stop_before_start_sends_nothing() -> Result<(), String> {
    run_async_test(async {
        let transport = Arc::new(StaticTransport::new(200));
        let tester = LoadTester::with_transport(config(20, 5), transport.clone())
            .map_err(|err| err.to_string())?;

        tester.stop();
        let report = tokio::time::timeout(Duration::from_secs(5), tester.start())
            .await
            .map_err(|err| format!("start() hung after stop: {}", err))?;

        if !tester.result().is_empty() {
            return Err(format!("Expected empty result, got {:?}", tester.result()));
        }
        if report.attempted != 0 || !report.stopped {
            return Err(format!("Unexpected report: {:?}", report));
        }
        if transport.calls.load(Ordering::SeqCst) != 0 {
            return Err("Expected no transport calls".to_owned());
        }
        Ok(())
    })
}

#[test]
fn failing_transport_records_nothing() -> Result<(), String> {
    run_async_test(async {
        let transport = Arc::new(ClosedConnectionTransport::default());
        let tester = LoadTester::with_transport(config(20, 4), transport.clone())
            .map_err(|err| err.to_string())?;

        let report = tokio::time::timeout(Duration::from_secs(5), tester.start())
            .await
            .map_err(|err| format!("start() hung: {}", err))?;

        if !tester.result().is_empty() {
            return Err(format!("Expected empty result, got {:?}", tester.result()));
        }
        if report.attempted != 20 || report.transport_errors != 20 {
            return Err(format!("Unexpected report: {:?}", report));
        }
        if tester.transport_errors() != transport.calls.load(Ordering::SeqCst) {
            return Err("Expected one error per attempt".to_owned());
        }
        Ok(())
    })
}

#[test]
fn stop_mid_run_finishes_in_flight_request() -> Result<(), String> {
    run_async_test(async {
        let transport = Arc::new(StopDuringRequestTransport {
            stop: OnceLock::new(),
            stop_at: 2,
            calls: AtomicU64::new(0),
        });
        let tester = LoadTester::with_transport(config(20, 1), transport.clone())
            .map_err(|err| err.to_string())?;
        transport
            .stop
            .set(tester.stop_signal())
            .map_err(|_signal| "Stop signal already set".to_owned())?;

        let report = tester.start().await;

        if tester.result().total() != 2 {
            return Err(format!("Expected 2, got {:?}", tester.result()));
        }
        if report.attempted != 2 || !report.stopped {
            return Err(format!("Unexpected report: {:?}", report));
        }
        if transport.calls.load(Ordering::SeqCst) != 2 {
            return Err("Expected no request after the stop".to_owned());
        }
        Ok(())
    })
}

#[test]
fn repeated_stop_never_blocks() -> Result<(), String> {
    let tester = LoadTester::with_transport(config(10, 2), Arc::new(StaticTransport::new(200)))
        .map_err(|err| err.to_string())?;
    for _ in 0..10 {
        tester.stop();
    }
    if !tester.stop_signal().is_stopped() {
        return Err("Expected stop flag to be raised".to_owned());
    }
    Ok(())
}

async fn spawn_status_server(status_line: &'static str) -> Result<String, String> {
    spawn_raw_server(format!(
        "HTTP/1.1 {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK",
        status_line
    ))
    .await
}

/// Answers every connection with `response` verbatim and then closes it.
async fn spawn_raw_server(response: String) -> Result<String, String> {
    let response = Arc::new(response);
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("bind failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("local_addr failed: {}", err))?;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let response = Arc::clone(&response);
            tokio::spawn(async move {
                let mut buffer = [0u8; 1024];
                if stream.read(&mut buffer).await.is_err() {
                    return;
                }
                drop(stream.write_all(response.as_bytes()).await);
                drop(stream.shutdown().await);
            });
        }
    });
    Ok(format!("http://{}/", addr))
}

#[test]
fn http_transport_reports_status_code() -> Result<(), String> {
    run_async_test(async {
        let url = spawn_status_server("503 Service Unavailable").await?;
        let mut cfg = config(6, 2);
        cfg.url = url;
        let tester = LoadTester::new(cfg).map_err(|err| err.to_string())?;

        tester.start().await;

        let result = tester.result();
        if result.get(503) != 6 {
            return Err(format!("Expected 6 x 503, got {:?}", result));
        }
        Ok(())
    })
}

#[test]
fn http_transport_times_out_silent_server() -> Result<(), String> {
    run_async_test(async {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|err| format!("bind failed: {}", err))?;
        let addr = listener
            .local_addr()
            .map_err(|err| format!("local_addr failed: {}", err))?;
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let transport =
            HttpTransport::new(Duration::from_millis(100)).map_err(|err| err.to_string())?;
        let template = RequestTemplate::new("GET", &format!("http://{}/", addr), "ua")
            .map_err(|err| err.to_string())?;
        let outcome = transport.send(&template).await;
        server.abort();

        match outcome {
            Err(err) if err.is_timeout() => Ok(()),
            Err(err) => Err(format!("Expected timeout, got {}", err)),
            Ok(status) => Err(format!("Expected timeout, got status {}", status)),
        }
    })
}

#[test]
fn truncated_body_still_records_status() -> Result<(), String> {
    run_async_test(async {
        let url = spawn_raw_server(
            "HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\nOK".to_owned(),
        )
        .await?;
        let mut cfg = config(4, 2);
        cfg.url = url;
        let tester = LoadTester::new(cfg).map_err(|err| err.to_string())?;

        let report = tester.start().await;

        let result = tester.result();
        if result.get(200) != 4 || result.total() != 4 {
            return Err(format!("Expected 4 x 200, got {:?}", result));
        }
        if report.transport_errors != 0 || tester.transport_errors() != 0 {
            return Err(format!(
                "Expected no transport errors, got {}",
                tester.transport_errors()
            ));
        }
        Ok(())
    })
}

#[test]
fn io_errors_classify_timeouts_by_kind() -> Result<(), String> {
    let timed_out = TransportError::Io {
        source: std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out"),
    };
    if !timed_out.is_timeout() {
        return Err("Expected TimedOut io error to count as a timeout".to_owned());
    }
    let reset = TransportError::Io {
        source: std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"),
    };
    if reset.is_timeout() {
        return Err("Expected ConnectionReset io error not to count as a timeout".to_owned());
    }
    Ok(())
}

/// Answers the first `fast` calls at once and holds every later call until
/// `release` is called.
struct GatedTransport {
    fast: u64,
    calls: AtomicU64,
    released: AtomicBool,
    gate: Notify,
}

impl GatedTransport {
    fn new(fast: u64) -> Self {
        Self {
            fast,
            calls: AtomicU64::new(0),
            released: AtomicBool::new(false),
            gate: Notify::new(),
        }
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        self.gate.notify_waiters();
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn send(&self, _template: &RequestTemplate) -> Result<u16, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if call <= self.fast {
            return Ok(200);
        }
        // Registered before the flag check so a concurrent `release` is not missed.
        let notified = self.gate.notified();
        if !self.released.load(Ordering::SeqCst) {
            notified.await;
        }
        Ok(200)
    }
}

#[test]
fn result_reports_partial_counts_while_running() -> Result<(), String> {
    run_async_test(async {
        let transport = Arc::new(GatedTransport::new(3));
        let tester = Arc::new(
            LoadTester::with_transport(config(10, 2), transport.clone())
                .map_err(|err| err.to_string())?,
        );

        let run = tokio::spawn({
            let tester = Arc::clone(&tester);
            async move { tester.start().await }
        });

        // Three fast calls plus one held call per worker.
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while transport.calls.load(Ordering::SeqCst) < 5 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        if waited.is_err() {
            transport.release();
            return Err("Workers never reached the gate".to_owned());
        }

        let partial = tester.result();
        if run.is_finished() {
            return Err("Run finished while workers were held".to_owned());
        }
        if partial.get(200) != 3 || partial.total() != 3 {
            transport.release();
            return Err(format!("Expected partial 3 x 200, got {:?}", partial));
        }

        transport.release();
        let report = run.await.map_err(|err| format!("run task failed: {}", err))?;

        let result = tester.result();
        if result.get(200) != 10 || report.attempted != 10 {
            return Err(format!(
                "Expected 10 x 200 after release, got {:?} ({} attempted)",
                result, report.attempted
            ));
        }
        Ok(())
    })
}
