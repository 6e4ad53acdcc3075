//! Shared helpers for gateway integration tests.
#![allow(dead_code)]

use std::{
    future::Future,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::{StatusCode, header},
    response::Response,
};
use gangway::{
    GatewayServer, HttpClientAdapter, config::GatewayConfig, utils::GracefulShutdown,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

/// A backend that echoes what it received and counts requests.
pub struct MockBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start an echo backend on an ephemeral port.
///
/// The response body is `"{METHOD} {path?query}\nhost={Host}\n{request body}"`.
/// A path ending in `/status/<code>` answers with that status code.
pub async fn start_echo_backend(name: &'static str) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let app = axum::Router::new().fallback(move |req: Request| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            echo(name, req).await
        }
    });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend { addr, hits }
}

/// Start a backend that accepts requests and never answers within `delay`.
pub async fn start_slow_backend(delay: Duration) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let app = axum::Router::new().fallback(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            "too late"
        }
    });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend { addr, hits }
}

/// A backend speaking raw HTTP/1.1 over TCP, for behavior axum cannot fake.
pub struct RawBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    done: Arc<AtomicBool>,
}

impl RawBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Streaming backend: the last chunk was written.
    /// Holding backend: the gateway closed the connection.
    pub fn done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

async fn read_request_head(socket: &mut TcpStream) -> bool {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return false,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    true
}

async fn start_raw_backend<F, Fut>(handle: F) -> RawBackend
where
    F: Fn(TcpStream, Arc<AtomicBool>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicBool::new(false));
    let handle = Arc::new(handle);

    let (counter, flag) = (hits.clone(), done.clone());
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let (counter, flag, handle) = (counter.clone(), flag.clone(), handle.clone());
            tokio::spawn(async move {
                if read_request_head(&mut socket).await {
                    counter.fetch_add(1, Ordering::SeqCst);
                    handle(socket, flag).await;
                }
            });
        }
    });

    RawBackend { addr, hits, done }
}

/// Sends headers promising 100 bytes, writes 7 of them, then goes silent.
pub async fn start_stalled_body_backend() -> RawBackend {
    start_raw_backend(|mut socket, _| async move {
        let _ = socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\npartial")
            .await;
        tokio::time::sleep(Duration::from_secs(30)).await;
    })
    .await
}

/// Streams `chunks` with chunked encoding, pausing `gap` before each one
/// after the first.
pub async fn start_chunked_backend(chunks: &'static [&'static str], gap: Duration) -> RawBackend {
    start_raw_backend(move |mut socket, finished| async move {
        let head = b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\ncontent-type: text/plain\r\n\r\n";
        if socket.write_all(head).await.is_err() {
            return;
        }
        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(gap).await;
            }
            let frame = format!("{:x}\r\n{}\r\n", chunk.len(), chunk);
            if socket.write_all(frame.as_bytes()).await.is_err() {
                return;
            }
        }
        let _ = socket.write_all(b"0\r\n\r\n").await;
        finished.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
    })
    .await
}

/// Never answers; marks `done` once the peer closes the connection.
pub async fn start_holding_backend() -> RawBackend {
    start_raw_backend(|mut socket, closed| async move {
        let mut buf = [0u8; 256];
        loop {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => continue,
            }
        }
        closed.store(true, Ordering::SeqCst);
    })
    .await
}

/// Poll `condition` every 10ms until it holds or `limit` passes.
pub async fn eventually(limit: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// An address nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn echo(name: &'static str, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap();

    let status = parts
        .uri
        .path()
        .rsplit_once("/status/")
        .and_then(|(_, code)| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);

    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let text = format!(
        "{} {}\nhost={}\n{}",
        parts.method,
        path_and_query,
        host,
        String::from_utf8_lossy(&body)
    );

    Response::builder()
        .status(status)
        .header("x-backend", name)
        .header("x-echo-custom", header_or_empty(&parts.headers, "x-custom"))
        .body(Body::from(text))
        .unwrap()
}

fn header_or_empty(headers: &axum::http::HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// A running gateway bound to an ephemeral local port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Arc<GracefulShutdown>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Build the gateway from `config` and serve it in the background.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let shutdown = Arc::new(GracefulShutdown::new());
    let server = GatewayServer::from_config(
        Arc::new(config),
        Arc::new(HttpClientAdapter::new().unwrap()),
        shutdown.clone(),
    )
    .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        server.serve(listener).await.unwrap();
    });

    TestGateway { addr, shutdown }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
