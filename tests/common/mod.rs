//! Minimal HTTP/1.1 stub for integration tests.
//!
//! Accepts any request on a loopback port, records the raw request text and
//! answers every connection with the same canned status and body.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Clone)]
struct Reply {
    status: u16,
    body: String,
    /// Overrides the advertised length of `body`.
    content_length: Option<usize>,
}

pub struct StubServer {
    /// `http://127.0.0.1:<port>`
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    /// Answer every request with `status` and `body`.
    pub async fn respond(status: u16, body: impl Into<String>) -> Self {
        Self::start(Some(Reply {
            status,
            body: body.into(),
            content_length: None,
        }))
        .await
    }

    /// Answer with `status` and a `Content-Length` larger than `body`, then
    /// close the connection mid-body.
    pub async fn truncated(status: u16, body: impl Into<String>, declared_len: usize) -> Self {
        let body = body.into();
        assert!(declared_len > body.len());
        Self::start(Some(Reply {
            status,
            body,
            content_length: Some(declared_len),
        }))
        .await
    }

    /// Accept connections and read requests, but never answer.
    pub async fn hang() -> Self {
        Self::start(None).await
    }

    async fn start(reply: Option<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                let seen = Arc::clone(&seen);
                let reply = reply.clone();
                tokio::spawn(async move {
                    let request = read_request(&mut sock).await;
                    seen.lock().unwrap().push(request);
                    match reply {
                        Some(Reply {
                            status,
                            body,
                            content_length,
                        }) => {
                            let response = format!(
                                "HTTP/1.1 {status} Stub\r\n\
                                 Content-Type: text/html; charset=utf-8\r\n\
                                 Content-Length: {}\r\n\
                                 Connection: close\r\n\r\n{body}",
                                content_length.unwrap_or(body.len())
                            );
                            let _ = sock.write_all(response.as_bytes()).await;
                            let _ = sock.shutdown().await;
                        }
                        None => {
                            // Hold the socket open until the client gives up.
                            let mut sink = [0u8; 64];
                            while let Ok(n) = sock.read(&mut sink).await {
                                if n == 0 {
                                    break;
                                }
                            }
                        }
                    }
                });
            }
        });

        Self { url, requests }
    }

    /// Raw text (request line, headers, body) of every request so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Body of a raw request captured by [`StubServer`].
pub fn request_body(raw: &str) -> &str {
    raw.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("")
}

/// A loopback URL nothing listens on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn read_request(sock: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match sock.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let content_length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
