//! Project index fetching.

use libbeacon_core::ProjectEntry;
use serde_json::Value;
use tracing::debug;

use crate::client::{join_url, Fetch};
use crate::error::FetchError;

/// Index locations, tried in order
pub const INDEX_PATHS: [&str; 2] = ["dist/index.json", "index.json"];

/// Fetch the project index served under `base`.
///
/// Returns the error of the last location tried when none answers with a
/// usable index.
pub async fn fetch_projects<F: Fetch>(fetcher: &F, base: &str) -> Result<Vec<ProjectEntry>, FetchError> {
    let mut last_err = None;
    for path in INDEX_PATHS {
        let url = join_url(base, path);
        match fetcher.get(&url).await.and_then(|f| parse_index(&f.url, &f.body)) {
            Ok(projects) => {
                debug!(url = %url, count = projects.len(), "project index loaded");
                return Ok(projects);
            }
            Err(e) => {
                debug!(url = %url, error = %e, "project index unavailable");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| FetchError::Transport {
        url: base.to_string(),
        message: "no index location".to_string(),
    }))
}

/// Accept either a bare array or `{"projects": [...]}`
pub fn parse_index(url: &str, body: &str) -> Result<Vec<ProjectEntry>, FetchError> {
    let decode_err = |message: String| FetchError::Decode {
        url: url.to_string(),
        message,
    };

    let value: Value = serde_json::from_str(body).map_err(|e| decode_err(e.to_string()))?;
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut obj) => match obj.remove("projects") {
            Some(list @ Value::Array(_)) => list,
            _ => return Err(decode_err("expected a 'projects' array".to_string())),
        },
        _ => return Err(decode_err("expected an array of projects".to_string())),
    };
    serde_json::from_value(list).map_err(|e| decode_err(e.to_string()))
}
