// ext-fuzzing/tests/controller_client.rs
//! Readiness gate, queue fetch, and report transmission against a canned
//! in-process controller

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use ext_fuzzing::client::ControllerClient;
use ext_fuzzing::error::HarnessError;
use ext_fuzzing::queue::{FuzzCase, RunReport};

/// Minimal canned controller: answers /ping, serves a fixed /tests
/// response, and records /report bodies.
struct CannedController {
    tests_status: &'static str,
    tests_body: &'static str,
    reports: Arc<Mutex<Vec<String>>>,
}

impl CannedController {
    async fn spawn(tests_status: &'static str, tests_body: &'static str) -> (u16, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let reports = Arc::new(Mutex::new(Vec::new()));
        let controller = CannedController {
            tests_status,
            tests_body,
            reports: Arc::clone(&reports),
        };
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                controller.handle(stream).await;
            }
        });
        (port, reports)
    }

    async fn handle(&self, mut stream: TcpStream) {
        let mut buf = Vec::new();
        let mut tmp = [0u8; 1024];
        let header_end = loop {
            let Ok(n) = stream.read(&mut tmp).await else {
                return;
            };
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&tmp[..n]);
            if let Some(pos) = find(&buf, b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let path = head
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .unwrap_or("")
            .to_string();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        let mut body = buf[header_end..].to_vec();
        while body.len() < content_length {
            let Ok(n) = stream.read(&mut tmp).await else {
                break;
            };
            if n == 0 {
                break;
            }
            body.extend_from_slice(&tmp[..n]);
        }

        let (status, response_body) = match path.as_str() {
            "/ping" => ("200 OK", ""),
            "/tests" => (self.tests_status, self.tests_body),
            "/report" => {
                self.reports
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&body).to_string());
                ("200 OK", "")
            }
            _ => ("404 Not Found", ""),
        };
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            response_body.len(),
            response_body
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[tokio::test]
async fn wait_ready_succeeds_once_the_controller_answers() {
    let (port, _) = CannedController::spawn("200 OK", "[]").await;
    let client = ControllerClient::new("127.0.0.1", port);
    client.wait_ready().await.unwrap();
}

#[tokio::test]
async fn wait_ready_exhausts_the_retry_budget_against_a_dead_port() {
    // Bind and drop to get a port nothing is listening on
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = ControllerClient::new("127.0.0.1", port);
    match client.wait_ready().await {
        Err(HarnessError::ControllerUnavailable(attempts)) => assert!(attempts > 0),
        other => panic!("expected ControllerUnavailable, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn fetch_cases_parses_the_queue() {
    let (port, _) = CannedController::spawn(
        "200 OK",
        r#"[{"funcName":"add","args":[2,3]},{"funcName":"boom","args":[]}]"#,
    )
    .await;
    let client = ControllerClient::new("127.0.0.1", port);

    let cases = client.fetch_cases().await;
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].func_name, "add");
    assert_eq!(cases[1].func_name, "boom");
}

#[tokio::test]
async fn fetch_cases_returns_empty_on_malformed_body() {
    let (port, _) = CannedController::spawn("200 OK", r#"{"not":"an array"}"#).await;
    let client = ControllerClient::new("127.0.0.1", port);
    assert!(client.fetch_cases().await.is_empty());
}

#[tokio::test]
async fn fetch_cases_returns_empty_on_error_status() {
    let (port, _) = CannedController::spawn("500 Internal Server Error", "").await;
    let client = ControllerClient::new("127.0.0.1", port);
    assert!(client.fetch_cases().await.is_empty());
}

#[tokio::test]
async fn send_report_posts_the_report_with_a_null_crash() {
    let (port, reports) = CannedController::spawn("200 OK", "[]").await;
    let client = ControllerClient::new("127.0.0.1", port);

    let report = RunReport {
        clean: vec![FuzzCase {
            func_name: "add".to_string(),
            args: vec![serde_json::json!(2), serde_json::json!(3)],
            coverage: BTreeMap::new(),
            error: None,
        }],
        errors: Vec::new(),
        crash: None,
        coverage: BTreeMap::new(),
    };
    client.send_report(&report).await.unwrap();

    let bodies = reports.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].contains(r#""crash":null"#));
    assert!(bodies[0].contains(r#""funcName":"add""#));
}
