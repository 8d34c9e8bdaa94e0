//! Decoding fetched bodies by declared or sniffed content kind.

use serde_json::Value;

use crate::client::Fetched;
use crate::error::FetchError;

/// How a source's body should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Guess from URL suffix, then content type, then content
    Auto,
    /// Indentation-based key/value text (YAML)
    Structured,
    /// Markdown or plain text, kept as-is
    Prose,
    Json,
}

/// A decoded body
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Data(Value),
    Text(String),
}

impl Document {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Document::Data(v) => Some(v),
            Document::Text(_) => None,
        }
    }
}

/// Resolve `Auto` from the URL path suffix and the content type
pub fn sniff(url: &str, content_type: &str) -> ContentKind {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    let content_type = content_type.to_ascii_lowercase();

    if path.ends_with(".yml") || path.ends_with(".yaml") || content_type.contains("yaml") {
        ContentKind::Structured
    } else if path.ends_with(".md") || content_type.contains("markdown") {
        ContentKind::Prose
    } else {
        ContentKind::Auto
    }
}

pub fn decode(fetched: &Fetched, kind: ContentKind) -> Result<Document, FetchError> {
    let kind = match kind {
        ContentKind::Auto => sniff(&fetched.url, fetched.content_type()),
        declared => declared,
    };

    match kind {
        ContentKind::Structured => serde_yaml::from_str::<Value>(&fetched.body)
            .map(Document::Data)
            .map_err(|e| decode_error(fetched, e)),
        ContentKind::Json => serde_json::from_str::<Value>(&fetched.body)
            .map(Document::Data)
            .map_err(|e| decode_error(fetched, e)),
        ContentKind::Prose => Ok(Document::Text(fetched.body.clone())),
        // Nothing conclusive: JSON if it parses, raw text otherwise
        ContentKind::Auto => Ok(serde_json::from_str::<Value>(&fetched.body)
            .map(Document::Data)
            .unwrap_or_else(|_| Document::Text(fetched.body.clone()))),
    }
}

fn decode_error(fetched: &Fetched, err: impl std::fmt::Display) -> FetchError {
    FetchError::Decode {
        url: fetched.url.clone(),
        message: err.to_string(),
    }
}
