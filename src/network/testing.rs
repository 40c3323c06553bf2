//! In-memory [`NetworkClient`] serving fixtures to adapter tests.

use super::{HttpPage, NetworkClient};
use crate::error::ScraperError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A request as seen by [`FakeClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub cookie: Option<String>,
}

/// Serves canned bodies keyed by exact URL and records every call.
#[derive(Default)]
pub struct FakeClient {
    pages: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl NetworkClient for FakeClient {
    async fn call(
        &self,
        request: reqwest::Request,
        _follow_redirects: bool,
    ) -> Result<HttpPage, ScraperError> {
        let url = request.url().to_string();
        let cookie = request
            .headers()
            .get(reqwest::header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method().to_string(),
            url: url.clone(),
            cookie,
        });

        match self.pages.lock().unwrap().get(&url) {
            Some(body) => Ok(HttpPage {
                url,
                status: 200,
                body: body.clone(),
            }),
            None => Err(ScraperError::HttpStatus { status: 404, url }),
        }
    }
}

/// Starts a local server answering every request with `301` to `location`.
/// Returns its base URL.
pub async fn redirect_server(location: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let reply = format!(
        "HTTP/1.1 301 Moved Permanently\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        location
    );

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let reply = reply.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}/", addr)
}
