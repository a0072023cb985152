/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock exchange helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for kucoin-stream-adapter tests

// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use kucoin_stream_adapter::Credentials;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Test API credentials
pub fn test_credentials() -> Credentials {
    Credentials {
        api_key: "test-key".to_string(),
        api_secret: "test-secret".to_string(),
        api_passphrase: "test-passphrase".to_string(),
    }
}

/// Mount a bullet-public mock pointing at the given ws endpoint
pub async fn mount_bullet_public(server: &MockServer, ws_url: &str, hits: u64) {
    Mock::given(method("POST"))
        .and(path("/api/v1/bullet-public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bullet_body(ws_url)))
        .expect(hits)
        .mount(server)
        .await;
}

/// Mount a bullet-private mock pointing at the given ws endpoint
pub async fn mount_bullet_private(server: &MockServer, ws_url: &str, hits: u64) {
    Mock::given(method("POST"))
        .and(path("/api/v1/bullet-private"))
        .and(wiremock::matchers::header_exists("KC-API-KEY"))
        .and(wiremock::matchers::header_exists("KC-API-SIGN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bullet_body(ws_url)))
        .expect(hits)
        .mount(server)
        .await;
}

fn bullet_body(ws_url: &str) -> Value {
    serde_json::json!({
        "code": "200000",
        "data": {
            "token": "test-token",
            "instanceServers": [
                {
                    "endpoint": ws_url,
                    "encrypt": false,
                    "protocol": "websocket",
                    "pingInterval": 18000,
                    "pingTimeout": 10000
                }
            ]
        }
    })
}

/// One recorded subscribe request
#[derive(Debug, Clone)]
pub struct SubRecord {
    pub connection: usize,
    pub id: String,
    pub topic: String,
    pub private: bool,
}

enum ExchangeCommand {
    Frame(String),
    Close,
}

/// In-process mock exchange WebSocket server.
///
/// Accepts connections in a loop, sends a welcome frame, acks subscribe
/// requests, answers pings with pongs, and lets tests inject data frames
/// into (or close) the most recent connection.
pub struct MockExchange {
    pub port: u16,
    accept_task: JoinHandle<()>,
    connections: Arc<AtomicUsize>,
    subscriptions: Arc<Mutex<Vec<SubRecord>>>,
    tokens: Arc<Mutex<Vec<String>>>,
    current: Arc<Mutex<Option<mpsc::UnboundedSender<ExchangeCommand>>>>,
}

impl MockExchange {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let connections = Arc::new(AtomicUsize::new(0));
        let subscriptions = Arc::new(Mutex::new(Vec::new()));
        let tokens = Arc::new(Mutex::new(Vec::new()));
        let current = Arc::new(Mutex::new(None::<mpsc::UnboundedSender<ExchangeCommand>>));

        let accept_connections = connections.clone();
        let accept_subscriptions = subscriptions.clone();
        let accept_tokens = tokens.clone();
        let accept_current = current.clone();

        let accept_task = tokio::spawn(async move {
            loop {
                let (conn, _) = listener.accept().await.unwrap();
                let conn_index = accept_connections.fetch_add(1, Ordering::SeqCst);

                let conn_tokens = accept_tokens.clone();
                let header_callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                    let token = req
                        .uri()
                        .query()
                        .and_then(|query| {
                            query.split('&').find_map(|pair| pair.strip_prefix("token="))
                        })
                        .unwrap_or_default()
                        .to_string();
                    conn_tokens.lock().unwrap().push(token);
                    Ok(resp)
                };

                let mut ws = match accept_hdr_async(conn, header_callback).await {
                    Ok(ws) => ws,
                    Err(_) => continue,
                };

                let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
                *accept_current.lock().unwrap() = Some(cmd_tx);

                let conn_subscriptions = accept_subscriptions.clone();
                tokio::spawn(async move {
                    let welcome =
                        serde_json::json!({"id": "welcome-1", "type": "welcome"}).to_string();
                    if ws.send(WsMessage::Text(welcome.into())).await.is_err() {
                        return;
                    }

                    loop {
                        tokio::select! {
                            cmd = cmd_rx.recv() => match cmd {
                                Some(ExchangeCommand::Frame(text)) => {
                                    if ws.send(WsMessage::Text(text.into())).await.is_err() {
                                        break;
                                    }
                                }
                                Some(ExchangeCommand::Close) => {
                                    let _ = ws.close(None).await;
                                    break;
                                }
                                None => break,
                            },
                            incoming = ws.next() => match incoming {
                                Some(Ok(WsMessage::Text(text))) => {
                                    let value: Value = match serde_json::from_str(&text) {
                                        Ok(value) => value,
                                        Err(_) => continue,
                                    };
                                    match value.get("type").and_then(|t| t.as_str()) {
                                        Some("ping") => {
                                            let pong = serde_json::json!({
                                                "id": value["id"],
                                                "type": "pong"
                                            })
                                            .to_string();
                                            if ws.send(WsMessage::Text(pong.into())).await.is_err() {
                                                break;
                                            }
                                        }
                                        Some("subscribe") => {
                                            conn_subscriptions.lock().unwrap().push(SubRecord {
                                                connection: conn_index,
                                                id: value["id"].as_str().unwrap_or_default().to_string(),
                                                topic: value["topic"].as_str().unwrap_or_default().to_string(),
                                                private: value
                                                    .get("privateChannel")
                                                    .and_then(|p| p.as_bool())
                                                    .unwrap_or(false),
                                            });
                                            let ack = serde_json::json!({
                                                "id": value["id"],
                                                "type": "ack"
                                            })
                                            .to_string();
                                            if ws.send(WsMessage::Text(ack.into())).await.is_err() {
                                                break;
                                            }
                                        }
                                        _ => {}
                                    }
                                }
                                Some(Ok(WsMessage::Close(_))) | None => break,
                                Some(Ok(_)) => {}
                                Some(Err(_)) => break,
                            }
                        }
                    }
                });
            }
        });

        Self { port, accept_task, connections, subscriptions, tokens, current }
    }

    pub fn url(&self) -> String {
        format!("ws://127.0.0.1:{}/endpoint", self.port)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn subscriptions(&self) -> Vec<SubRecord> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    /// Inject a data frame into the most recent connection
    pub fn send_frame(&self, frame: Value) {
        let guard = self.current.lock().unwrap();
        let sender = guard.as_ref().expect("no live connection");
        sender.send(ExchangeCommand::Frame(frame.to_string())).expect("connection task gone");
    }

    /// Inject a raw (possibly malformed) text frame
    pub fn send_raw(&self, text: &str) {
        let guard = self.current.lock().unwrap();
        let sender = guard.as_ref().expect("no live connection");
        sender.send(ExchangeCommand::Frame(text.to_string())).expect("connection task gone");
    }

    /// Close the most recent connection from the server side
    pub fn close_current(&self) {
        let guard = self.current.lock().unwrap();
        if let Some(sender) = guard.as_ref() {
            let _ = sender.send(ExchangeCommand::Close);
        }
    }

    /// Poll until at least `count` subscribe requests were recorded
    pub async fn wait_for_subscriptions(&self, count: usize) {
        wait_until(|| self.subscriptions.lock().unwrap().len() >= count).await;
    }

    /// Poll until at least `count` connections were accepted
    pub async fn wait_for_connections(&self, count: usize) {
        wait_until(|| self.connections.load(Ordering::SeqCst) >= count).await;
    }
}

impl Drop for MockExchange {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// Poll a condition every 10ms, panicking after 5s
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not met within 5s");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
