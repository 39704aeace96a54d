//! Single shot HTTP archive, serving a canned response on the loopback interface.
use std::net::SocketAddr;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::oneshot,
};

pub struct MockArchive {
    addr: SocketAddr,
    path_rx: oneshot::Receiver<String>,
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

impl MockArchive {
    /// Deploys a [MockArchive] that answers the first request
    /// with this status code and body.
    pub async fn serve(status: u16, body: Vec<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (path_tx, path_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => return,
            };

            let mut request = Vec::<u8>::with_capacity(1024);
            let mut buf = [0; 1024];

            loop {
                let size = socket.read(&mut buf).await.unwrap_or(0);
                if size == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..size]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            // GET /path HTTP/1.1
            let request = String::from_utf8_lossy(&request);
            if let Some(path) = request.split_whitespace().nth(1) {
                let _ = path_tx.send(path.to_string());
            }

            let head = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                reason(status),
                body.len()
            );

            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        });

        Self { addr, path_rx }
    }

    /// Base URL of this archive
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Full URL for this path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Path that was requested, once the request was served
    pub async fn requested(self) -> Option<String> {
        self.path_rx.await.ok()
    }
}
