//! In-memory [`Fetch`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use crate::client::{error_detail, Fetch, Fetched};
use crate::error::FetchError;

#[derive(Debug, Clone)]
struct Route {
    status: u16,
    content_type: Option<String>,
    body: String,
    delay: Duration,
}

/// Serves canned bodies by URL.
///
/// Lookup tries the exact URL first, then the URL without its query string.
/// Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    routes: HashMap<String, Route>,
    requested: Mutex<Vec<String>>,
    posted: Mutex<Vec<(String, Value)>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, body: &str) -> Self {
        self.route(url, 200, None, body, Duration::ZERO)
    }

    pub fn with_type(self, url: &str, content_type: &str, body: &str) -> Self {
        self.route(url, 200, Some(content_type), body, Duration::ZERO)
    }

    pub fn with_status(self, url: &str, status: u16, body: &str) -> Self {
        self.route(url, status, None, body, Duration::ZERO)
    }

    pub fn with_delay(self, url: &str, delay: Duration, body: &str) -> Self {
        self.route(url, 200, None, body, delay)
    }

    fn route(
        mut self,
        url: &str,
        status: u16,
        content_type: Option<&str>,
        body: &str,
        delay: Duration,
    ) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                status,
                content_type: content_type.map(str::to_string),
                body: body.to_string(),
                delay,
            },
        );
        self
    }

    /// URLs requested so far, in order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn posted(&self) -> Vec<(String, Value)> {
        self.posted.lock().unwrap().clone()
    }

    async fn serve(&self, url: &str) -> Result<Fetched, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());

        let bare = url.split('?').next().unwrap_or(url);
        let route = self.routes.get(url).or_else(|| self.routes.get(bare)).cloned();
        let Some(route) = route else {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
                detail: None,
            });
        };

        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        if !(200..300).contains(&route.status) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: route.status,
                detail: error_detail(&route.body),
            });
        }

        Ok(Fetched {
            url: url.to_string(),
            status: route.status,
            content_type: route.content_type,
            body: route.body,
        })
    }
}

impl Fetch for StaticFetcher {
    async fn get(&self, url: &str) -> Result<Fetched, FetchError> {
        self.serve(url).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Fetched, FetchError> {
        self.posted.lock().unwrap().push((url.to_string(), body.clone()));
        self.serve(url).await
    }
}
