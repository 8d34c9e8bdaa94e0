//! HTTP access behind the [`Fetch`] trait.

use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

/// A successful response, body already read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl Fetched {
    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or("")
    }
}

/// Transport used by the resolver, project index and ingestion.
///
/// Non-success statuses are reported as [`FetchError::Status`].
pub trait Fetch: Send + Sync {
    fn get(&self, url: &str) -> impl Future<Output = Result<Fetched, FetchError>> + Send;

    fn post_json(
        &self,
        url: &str,
        body: &Value,
    ) -> impl Future<Output = Result<Fetched, FetchError>> + Send;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn get(&self, url: &str) -> impl Future<Output = Result<Fetched, FetchError>> + Send {
        (**self).get(url)
    }

    fn post_json(
        &self,
        url: &str,
        body: &Value,
    ) -> impl Future<Output = Result<Fetched, FetchError>> + Send {
        (**self).post_json(url, body)
    }
}

/// reqwest-backed fetcher with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout_ms: u64) -> Result<Self, FetchError> {
        let timeout = Duration::from_millis(timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("beacon/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Fetched, FetchError> {
        let exchange = async {
            let response = request.send().await.map_err(|e| self.request_error(url, e))?;
            let status = response.status();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.map_err(|e| self.request_error(url, e))?;

            if !status.is_success() {
                let detail = error_detail(&body)
                    .or_else(|| status.canonical_reason().map(str::to_string));
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                    detail,
                });
            }

            debug!(url, status = status.as_u16(), bytes = body.len(), "fetched");
            Ok(Fetched {
                url: url.to_string(),
                status: status.as_u16(),
                content_type,
                body,
            })
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(self.timed_out(url)),
        }
    }

    fn request_error(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            self.timed_out(url)
        } else {
            FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    fn timed_out(&self, url: &str) -> FetchError {
        FetchError::Timeout {
            url: url.to_string(),
            ms: self.timeout.as_millis() as u64,
        }
    }
}

impl Fetch for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Fetched, FetchError> {
        self.send(url, self.client.get(url)).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Fetched, FetchError> {
        self.send(url, self.client.post(url).json(body)).await
    }
}

/// `detail` of an error body such as `{"detail": "..."}`
pub fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Join a base URL and a relative path with exactly one slash
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Trim, drop blanks and trailing slashes, keep first occurrence order
pub fn normalize_bases(bases: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for base in bases {
        let base = base.trim().trim_end_matches('/');
        if !base.is_empty() && !out.iter().any(|b| b == base) {
            out.push(base.to_string());
        }
    }
    out
}
