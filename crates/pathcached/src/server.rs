//! Accept loop and per-connection request handling

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::handler::RequestHandler;
use crate::http::{Request, Response, Status};

/// How long a client may take to send a complete request head
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Accept connections forever, one task per client
pub async fn serve(listener: TcpListener, handler: Arc<RequestHandler>) -> Result<()> {
    serve_with_timeout(listener, handler, READ_TIMEOUT).await
}

/// Like [`serve`], with an explicit request-head deadline
pub async fn serve_with_timeout(
    listener: TcpListener,
    handler: Arc<RequestHandler>,
    read_timeout: Duration,
) -> Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!("New connection from {}", addr);
                let handler = Arc::clone(&handler);

                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, handler, read_timeout).await {
                        error!("Error handling client {}: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
            }
        }
    }
}

async fn handle_client(
    mut stream: TcpStream,
    handler: Arc<RequestHandler>,
    read_timeout: Duration,
) -> Result<()> {
    let mut buffer = BytesMut::with_capacity(4096);
    // Deadline covers the whole head, not each read
    let deadline = tokio::time::Instant::now() + read_timeout;

    let request = loop {
        match Request::parse(&mut buffer) {
            Ok(Some(request)) => break request,
            Ok(None) => {}
            Err(e) => {
                warn!("Parse error: {}", e);
                let response = Response::error(Status::BadRequest);
                stream.write_all(&response.serialize()).await?;
                stream.shutdown().await?;
                return Ok(());
            }
        }

        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        let n = match timeout(remaining, stream.read_buf(&mut buffer)).await {
            Ok(read) => read?,
            Err(_) => {
                warn!("Timed out waiting for request head");
                let response = Response::error(Status::RequestTimeout);
                stream.write_all(&response.serialize()).await?;
                stream.shutdown().await?;
                return Ok(());
            }
        };
        if n == 0 {
            // Connection closed before a full request arrived
            return Ok(());
        }
    };

    // The file store does blocking disk reads
    let response = tokio::task::spawn_blocking(move || {
        debug!(
            user_agent = request.header("User-Agent").unwrap_or("-"),
            "HTTP/{} request",
            request.version
        );
        let response = handler.handle(&request);
        info!(
            "{:?} {} -> {}",
            request.method,
            request.path,
            response.status.code()
        );
        response
    })
    .await?;

    stream.write_all(&response.serialize()).await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathcache::CachedStore;
    use std::fs;
    use tempfile::TempDir;

    async fn start(files: &[(&str, &[u8])], capacity: usize) -> (TempDir, std::net::SocketAddr) {
        let dir = TempDir::new().unwrap();
        for (name, data) in files {
            fs::write(dir.path().join(name), data).unwrap();
        }
        let cache = Arc::new(CachedStore::new(dir.path(), capacity).unwrap());
        let handler = Arc::new(RequestHandler::new(cache));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, handler));

        (dir, addr)
    }

    async fn send(addr: std::net::SocketAddr, raw: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8(response).unwrap()
    }

    #[tokio::test]
    async fn test_serves_file() {
        let (_dir, addr) = start(&[("index.html", b"<h1>hi</h1>")], 10).await;

        let response = send(addr, b"GET /index.html HTTP/1.1\r\nHost: test\r\n\r\n").await;

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: text/html\r\n"));
        assert!(response.ends_with("<h1>hi</h1>"));
    }

    #[tokio::test]
    async fn test_second_request_hits_cache() {
        let (_dir, addr) = start(&[("a.txt", b"a")], 10).await;

        send(addr, b"GET /a.txt HTTP/1.1\r\n\r\n").await;
        send(addr, b"GET /a.txt HTTP/1.1\r\n\r\n").await;

        let stats = send(addr, b"GET /_stats HTTP/1.1\r\n\r\n").await;
        let body = stats.split("\r\n\r\n").nth(1).unwrap();
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["misses"], 1);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let (_dir, addr) = start(&[], 10).await;

        let response = send(addr, b"GET /missing.png HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[tokio::test]
    async fn test_bad_request() {
        let (_dir, addr) = start(&[], 10).await;

        let response = send(addr, b"NONSENSE\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn test_idle_client_times_out() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(CachedStore::new(dir.path(), 10).unwrap());
        let handler = Arc::new(RequestHandler::new(cache));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_with_timeout(listener, handler, Duration::from_millis(50)));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"GET /a.txt HTTP/1.1\r\n").await.unwrap();

        let mut response = Vec::new();
        timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
            .await
            .expect("server should close an idle connection")
            .unwrap();
        let response = String::from_utf8(response).unwrap();
        assert!(response.starts_with("HTTP/1.1 408 Request Timeout\r\n"));
    }

    #[tokio::test]
    async fn test_request_split_across_writes() {
        let (_dir, addr) = start(&[("a.txt", b"split")], 10).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"GET /a.txt HT").await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        stream.write_all(b"TP/1.1\r\n\r\n").await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        assert!(String::from_utf8(response).unwrap().ends_with("split"));
    }
}
