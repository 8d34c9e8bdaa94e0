use libbeacon_core::BeaconError;
use thiserror::Error;

/// Failure of a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered {status}{}", detail_suffix(.detail))]
    Status {
        url: String,
        status: u16,
        detail: Option<String>,
    },

    #[error("{url} timed out after {ms} ms")]
    Timeout { url: String, ms: u64 },

    #[error("could not decode {url}: {message}")]
    Decode { url: String, message: String },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default()
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status { status: 404, .. })
    }
}

impl From<FetchError> for BeaconError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Decode { .. } => BeaconError::Parse(err.to_string()),
            FetchError::Status {
                detail: Some(detail),
                ..
            } => BeaconError::Network(detail),
            other => BeaconError::Network(other.to_string()),
        }
    }
}
