//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use tenant_router::config::RouterConfig;
use tenant_router::http::HttpServer;
use tenant_router::lifecycle::Shutdown;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Request headers the echo upstream reports back.
const ECHOED: [&str; 6] = [
    "host",
    "x-forwarded-host",
    "x-forwarded-proto",
    "x-original-uri",
    "x-session-id",
    "x-request-id",
];

/// Read a request head, returning the request target and the echoed headers.
async fn read_head(socket: &mut TcpStream) -> Option<(String, Vec<(String, String)>)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buf).to_string();
    let mut lines = head.lines();
    let target = lines.next()?.split_whitespace().nth(1)?.to_string();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .filter(|(k, _)| ECHOED.contains(&k.as_str()))
        .collect();
    Some((target, headers))
}

async fn write_response(socket: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start an upstream that answers every request with what it received,
/// one `key=value` per line (`target` plus the echoed headers).
pub async fn start_echo_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Some((target, headers)) = read_head(&mut socket).await else {
                    return;
                };
                let mut body = format!("target={target}\n");
                for (k, v) in headers {
                    body.push_str(&format!("{k}={v}\n"));
                }
                write_response(&mut socket, "200 OK", &body).await;
            });
        }
    });

    addr
}

/// Start an upstream that waits `delay` before answering.
pub async fn start_slow_upstream(delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                if read_head(&mut socket).await.is_some() {
                    tokio::time::sleep(delay).await;
                    write_response(&mut socket, "200 OK", "late").await;
                }
            });
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A running router under test.
pub struct TestRouter {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<RouterConfig>,
}

impl TestRouter {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the router in front of `upstream` with the given config tweaks.
pub async fn start_router(upstream: SocketAddr, mut config: RouterConfig) -> TestRouter {
    config.upstream.address = upstream.to_string();
    config.listener.bind_address = "127.0.0.1:0".to_string();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_rx, server_shutdown).await;
    });

    TestRouter {
        addr,
        shutdown,
        config_updates: config_tx,
    }
}

/// Client that never follows redirects and ignores proxy env vars.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Parse an echo upstream body into a map.
pub fn parse_echo(body: &str) -> HashMap<String, String> {
    body.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
