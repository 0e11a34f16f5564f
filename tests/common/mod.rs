//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use portfolio_gateway::config::{DeploymentProfile, GatewayConfig};
use portfolio_gateway::http::HttpServer;
use portfolio_gateway::lifecycle::Shutdown;
use portfolio_gateway::portfolio::{Portfolio, PortfolioProvider, PortfolioRequest, UpstreamError};

pub const TEST_API_KEY: &str = "test-key-0123456789";

/// Canned upstream replies by request path, plus a log of every path hit.
#[derive(Clone, Default)]
pub struct MockUpstream {
    routes: Arc<Mutex<HashMap<String, (u16, String)>>>,
    hits: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    pub fn reply(&self, path: &str, status: u16, body: Value) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
        self
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    /// Serve over raw TCP on an ephemeral port. Unknown paths get a 404.
    pub async fn start(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mock = self.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mock = mock.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    loop {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }

                    let head = String::from_utf8_lossy(&buf);
                    let path = head
                        .lines()
                        .next()
                        .and_then(|line| line.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .to_string();
                    mock.hits.lock().unwrap().push(path.clone());

                    let (status, body) = mock
                        .routes
                        .lock()
                        .unwrap()
                        .get(&path)
                        .cloned()
                        .unwrap_or((404, r#"{"error":"not found"}"#.to_string()));
                    let status_text = match status {
                        200 => "200 OK",
                        401 => "401 Unauthorized",
                        403 => "403 Forbidden",
                        404 => "404 Not Found",
                        500 => "500 Internal Server Error",
                        503 => "503 Service Unavailable",
                        _ => "500 Internal Server Error",
                    };

                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status_text,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        addr
    }
}

/// Provider that counts calls and returns a fixed outcome.
pub struct StubProvider {
    pub calls: AtomicUsize,
    pub last: Mutex<Option<PortfolioRequest>>,
    failure: Option<fn() -> UpstreamError>,
}

impl StubProvider {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
            failure: None,
        })
    }

    pub fn failing(failure: fn() -> UpstreamError) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
            failure: Some(failure),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PortfolioProvider for StubProvider {
    async fn fetch_portfolio(&self, request: &PortfolioRequest) -> Result<Portfolio, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());
        if let Some(make) = self.failure {
            return Err(make());
        }
        Ok(Portfolio {
            account_id: request.account_id().unwrap_or("U1234567").to_string(),
            positions: request
                .include_positions()
                .then(|| vec![serde_json::json!({"ticker": "AAPL", "position": 10})]),
            summary: request
                .include_summary()
                .then(|| serde_json::json!({"netliquidation": {"amount": 1000.0}})),
        })
    }
}

pub fn config(profile: DeploymentProfile) -> GatewayConfig {
    let mut config = GatewayConfig::for_profile(profile);
    if profile == DeploymentProfile::Hardened {
        config.auth.api_key = Some(TEST_API_KEY.to_string());
    }
    config
}

/// Bind an ephemeral port and run the gateway until the returned
/// coordinator is triggered.
pub async fn spawn_gateway(
    config: GatewayConfig,
    provider: Arc<dyn PortfolioProvider>,
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, provider);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_auth(uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", authorization)
        .body(Body::empty())
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
