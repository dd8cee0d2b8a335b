//! End-to-end tests: a real listener on an ephemeral port, real HTTP requests,
//! real files in a temporary directory.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use alert_receiver::{AlertServer, LogRecord, LogWriter, ReceiverConfig, ServerResult};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct Running {
    addr: SocketAddr,
    writer: Arc<LogWriter>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<ServerResult<()>>,
}

impl Running {
    fn url(&self) -> String {
        format!("http://{}/alerts", self.addr)
    }

    async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server should stop")
            .expect("join");
        assert!(result.is_ok());
    }
}

fn test_config(log_dir: &Path) -> ReceiverConfig {
    ReceiverConfig::new()
        .with_bind_addr(SocketAddr::from(([127, 0, 0, 1], 0)))
        .with_log_dir(log_dir)
        .with_shutdown_grace(Duration::from_secs(1))
}

async fn start(config: ReceiverConfig) -> Running {
    let server = AlertServer::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let writer = server.writer();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(server.serve(shutdown_rx));
    Running {
        addr,
        writer,
        shutdown_tx,
        handle,
    }
}

async fn post(url: &str, body: &str) -> u16 {
    reqwest::Client::new()
        .post(url)
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap()
        .status()
        .as_u16()
}

/// Every line of every log file in `dir`.
fn written_lines(dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("app_hivemq_"), "unexpected file {name}");
        assert!(name.ends_with("0001.log"), "unexpected file {name}");
        lines.extend(fs::read_to_string(&path).unwrap().lines().map(str::to_string));
    }
    lines
}

const HIGH_CPU: &str = r#"{"alerts":[{
    "status":"firing",
    "startsAt":"2024-03-05T10:15:00Z",
    "endsAt":"0001-01-01T00:00:00Z",
    "labels":{"alertname":"HighCPU","instance":"host1:9100"},
    "annotations":{"current_value":"87","summary":"CPU high"}
}]}"#;

#[tokio::test]
async fn alert_is_appended_as_one_line() {
    let dir = TempDir::new().unwrap();
    let server = start(test_config(dir.path())).await;

    assert_eq!(post(&server.url(), HIGH_CPU).await, 200);

    let lines = written_lines(dir.path());
    assert_eq!(lines.len(), 1);

    let record: LogRecord = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(record.kpi, "HighCPU");
    assert_eq!(record.ip, "host1");
    assert_eq!(record.hostname, "unknown");
    assert_eq!(record.count, "87");
    assert_eq!(record.summary, "CPU high");
    assert_eq!(record.value, "1");
    assert_eq!(record.timestamp.len(), "YYYY-MM-DD HH:MM".len());

    server.stop().await;
}

#[tokio::test]
async fn empty_alert_list_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let server = start(test_config(dir.path())).await;

    assert_eq!(post(&server.url(), r#"{"alerts":[]}"#).await, 200);
    assert!(written_lines(dir.path()).is_empty());

    server.stop().await;
}

#[tokio::test]
async fn unparsable_body_is_rejected() {
    let dir = TempDir::new().unwrap();
    let server = start(test_config(dir.path())).await;

    assert_eq!(post(&server.url(), "not json").await, 400);
    assert!(written_lines(dir.path()).is_empty());

    server.stop().await;
}

#[tokio::test]
async fn concurrent_requests_each_append_one_line() {
    let dir = TempDir::new().unwrap();
    let server = start(test_config(dir.path())).await;
    let url = server.url();

    let first = r#"{"alerts":[{"labels":{"alertname":"First","hostname":"broker-1"}}]}"#;
    let second = r#"{"alerts":[{"labels":{"alertname":"Second","scope":"cluster"}}]}"#;
    let (a, b) = tokio::join!(post(&url, first), post(&url, second));
    assert_eq!((a, b), (200, 200));

    let mut kpis: Vec<String> = written_lines(dir.path())
        .iter()
        .map(|line| serde_json::from_str::<LogRecord>(line).unwrap().kpi)
        .collect();
    kpis.sort();
    assert_eq!(kpis, ["First", "Second"]);

    server.stop().await;
}

#[tokio::test]
async fn many_concurrent_requests_keep_lines_intact() {
    let dir = TempDir::new().unwrap();
    let server = start(test_config(dir.path())).await;
    let url = server.url();

    let requests: Vec<_> = (0..20)
        .map(|i| {
            let url = url.clone();
            tokio::spawn(async move {
                let body = format!(
                    r#"{{"alerts":[{{"labels":{{"alertname":"A{i}"}}}},{{"labels":{{"alertname":"B{i}"}}}}]}}"#
                );
                post(&url, &body).await
            })
        })
        .collect();
    for request in requests {
        assert_eq!(request.await.unwrap(), 200);
    }

    let lines = written_lines(dir.path());
    assert_eq!(lines.len(), 40);
    for line in &lines {
        assert!(serde_json::from_str::<LogRecord>(line).is_ok(), "corrupt line {line}");
    }

    server.stop().await;
}

#[tokio::test]
async fn unwritable_log_directory_still_returns_ok() {
    let dir = TempDir::new().unwrap();
    let server = start(test_config(&dir.path().join("does-not-exist"))).await;

    assert_eq!(post(&server.url(), HIGH_CPU).await, 200);
    assert_eq!(server.writer.failed_writes(), 1);
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());

    server.stop().await;
}

#[tokio::test]
async fn only_post_alerts_is_routed() {
    let dir = TempDir::new().unwrap();
    let server = start(test_config(dir.path())).await;
    let client = reqwest::Client::new();

    let get = client.get(server.url()).send().await.unwrap();
    assert_eq!(get.status().as_u16(), 405);

    let other = format!("http://{}/metrics", server.addr);
    assert_eq!(post(&other, r#"{"alerts":[]}"#).await, 404);

    server.stop().await;
}

#[tokio::test]
async fn stalled_body_hits_read_timeout() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path()).with_read_timeout(Duration::from_millis(200));
    let server = start(config).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"POST /alerts HTTP/1.1\r\nHost: test\r\nContent-Length: 100\r\n\r\n{\"alerts\":")
        .await
        .unwrap();

    let response = read_status_line(&mut stream).await;
    assert!(response.starts_with("HTTP/1.1 400"), "got {response}");
    assert!(written_lines(dir.path()).is_empty());

    server.stop().await;
}

async fn read_status_line(stream: &mut TcpStream) -> String {
    let mut response = Vec::new();
    let mut buf = [0u8; 512];
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            response.extend_from_slice(&buf[..n]);
            if n == 0 || response.windows(2).any(|w| w == b"\r\n") {
                break;
            }
        }
    })
    .await
    .expect("server should answer");
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn in_flight_request_completes_during_shutdown() {
    let dir = TempDir::new().unwrap();
    let server = start(test_config(dir.path())).await;

    let (head, tail) = HIGH_CPU.split_at(HIGH_CPU.len() / 2);
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let headers = format!(
        "POST /alerts HTTP/1.1\r\nHost: test\r\nContent-Length: {}\r\n\r\n",
        HIGH_CPU.len()
    );
    stream.write_all(headers.as_bytes()).await.unwrap();
    stream.write_all(head.as_bytes()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.shutdown_tx.send(true).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream.write_all(tail.as_bytes()).await.unwrap();

    let response = read_status_line(&mut stream).await;
    assert!(response.starts_with("HTTP/1.1 200"), "got {response}");

    server.stop().await;
    assert_eq!(written_lines(dir.path()).len(), 1);
}

/// Opening a FIFO for writing blocks until a reader shows up, which stalls
/// the append past the write timeout.
#[cfg(unix)]
#[tokio::test]
async fn write_timeout_closes_connection_and_append_still_finishes() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path()).with_write_timeout(Duration::from_millis(300));
    let server = start(config).await;

    let fifo = server.writer.path_for(chrono::Local::now().date_naive());
    let status = std::process::Command::new("mkfifo").arg(&fifo).status().unwrap();
    assert!(status.success());

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let request = format!(
        "POST /alerts HTTP/1.1\r\nHost: test\r\nContent-Length: {}\r\n\r\n{HIGH_CPU}",
        HIGH_CPU.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    // Closed without a status line.
    let response = read_status_line(&mut stream).await;
    assert!(response.is_empty(), "got {response}");

    // Requests that do not write are still served.
    assert_eq!(post(&server.url(), r#"{"alerts":[]}"#).await, 200);

    // Reading the FIFO releases the stalled append, which completes its line.
    let line = tokio::time::timeout(
        Duration::from_secs(3),
        tokio::task::spawn_blocking(move || fs::read_to_string(fifo).unwrap()),
    )
    .await
    .expect("stalled append should finish")
    .unwrap();
    let record: LogRecord = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(record.kpi, "HighCPU");

    server.stop().await;
}
