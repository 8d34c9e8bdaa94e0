//! Banner-prefixed text encodings of a [`Snapshot`].
//!
//! Both encodings start with exactly one comment line naming the project and
//! the source path:
//!
//! ```text
//! // BRaiN Copy v1 • project=<id> • source=<path>     (JSON)
//! # BRaiN Copy v1 • project=<id> • source=<path>      (YAML)
//! ```
//!
//! Parsing strips that single line and decodes the rest. The marker only
//! decides which format is tried first; a JSON body pasted under a `#` banner
//! still parses. Content after the document is ignored in both formats.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::BeaconError;
use crate::types::snapshot::REQUIRED_KEYS;
use crate::types::Snapshot;

/// Banner title, versioned together with the snapshot schema
pub const BANNER_TITLE: &str = "BRaiN Copy v1";

pub const DEFAULT_PROJECT_ID: &str = "brain";
pub const DEFAULT_SOURCE: &str = "/stp.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Structured object rendering (pretty-printed JSON)
    #[default]
    Json,
    /// Flattened indentation-based rendering (YAML)
    Yaml,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }

    pub fn comment_marker(&self) -> &'static str {
        match self {
            Format::Json => "//",
            Format::Yaml => "#",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        self.as_str()
    }

    /// Format suggested by a leading comment marker
    pub fn from_marker(text: &str) -> Option<Format> {
        if text.starts_with("//") {
            Some(Format::Json)
        } else if text.starts_with('#') {
            Some(Format::Yaml)
        } else {
            None
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Format {
    type Err = BeaconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(BeaconError::InvalidArgs(format!("unknown format '{}'", other))),
        }
    }
}

/// The single banner line, including its trailing newline
pub fn banner(project_id: Option<&str>, source: Option<&str>, format: Format) -> String {
    let project = project_id.filter(|p| !p.is_empty()).unwrap_or(DEFAULT_PROJECT_ID);
    let source = source.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SOURCE);
    format!(
        "{} {} • project={} • source={}\n",
        format.comment_marker(),
        BANNER_TITLE,
        project,
        source
    )
}

/// Render a snapshot as banner + body
pub fn encode(
    snapshot: &Snapshot,
    project_id: Option<&str>,
    source: Option<&str>,
    format: Format,
) -> Result<String, BeaconError> {
    let body = match format {
        Format::Json => serde_json::to_string_pretty(snapshot)?,
        Format::Yaml => serde_yaml::to_string(snapshot)?,
    };
    let mut text = banner(project_id, source, format);
    text.push_str(&body);
    Ok(text)
}

/// Single-line JSON without a banner
pub fn encode_compact(snapshot: &Snapshot) -> Result<String, BeaconError> {
    Ok(serde_json::to_string(snapshot)?)
}

/// Split off the banner line if present.
///
/// Returns the format the marker suggests and the remaining body. Only the
/// first line is removed; a banner without a newline leaves an empty body.
pub fn strip_banner(text: &str) -> (Option<Format>, &str) {
    match Format::from_marker(text) {
        Some(format) => {
            let body = match text.find('\n') {
                Some(idx) => &text[idx + 1..],
                None => "",
            };
            (Some(format), body)
        }
        None => (None, text),
    }
}

/// Decode copy text back into a snapshot
pub fn parse(text: &str) -> Result<Snapshot, BeaconError> {
    let (hint, body) = strip_banner(text);
    decode_either(hint, body, decode_json, decode_yaml)
}

/// Parse loosely, check the nine top-level keys, then decode strictly
pub fn validate(text: &str) -> Result<Snapshot, BeaconError> {
    let (hint, body) = strip_banner(text);
    let value = decode_either(hint, body, first_json_value, yaml_value)?;

    let missing = missing_keys(&value);
    if !missing.is_empty() {
        return Err(BeaconError::missing_keys(missing));
    }

    serde_json::from_value(value).map_err(|e| BeaconError::Parse(e.to_string()))
}

/// Required top-level keys absent from `value`
pub fn missing_keys(value: &Value) -> Vec<&'static str> {
    match value.as_object() {
        Some(obj) => REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|k| !obj.contains_key(*k))
            .collect(),
        None => REQUIRED_KEYS.to_vec(),
    }
}

/// Try the hinted decoder, then the other one. The hinted decoder's error is
/// the one reported.
fn decode_either<T>(
    hint: Option<Format>,
    body: &str,
    json: fn(&str) -> Result<T, BeaconError>,
    yaml: fn(&str) -> Result<T, BeaconError>,
) -> Result<T, BeaconError> {
    let (first, second) = match hint {
        Some(Format::Yaml) => (yaml, json),
        Some(Format::Json) | None => (json, yaml),
    };
    first(body).or_else(|err| second(body).map_err(|_| err))
}

/// Decode the first JSON value; anything after it is ignored
fn decode_json(body: &str) -> Result<Snapshot, BeaconError> {
    let mut stream = serde_json::Deserializer::from_str(body).into_iter::<Snapshot>();
    match stream.next() {
        Some(Ok(snapshot)) => Ok(snapshot),
        Some(Err(e)) => Err(BeaconError::Parse(format!("invalid JSON snapshot: {}", e))),
        None => Err(BeaconError::Parse("empty snapshot body".to_string())),
    }
}

fn decode_yaml(body: &str) -> Result<Snapshot, BeaconError> {
    first_yaml_document::<Snapshot>(body, |_| true)
        .map_err(|e| BeaconError::Parse(format!("invalid YAML snapshot: {}", e)))
}

fn first_json_value(body: &str) -> Result<Value, BeaconError> {
    let mut stream = serde_json::Deserializer::from_str(body).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(BeaconError::Parse(format!("invalid JSON: {}", e))),
        None => Err(BeaconError::Parse("empty document".to_string())),
    }
}

fn yaml_value(body: &str) -> Result<Value, BeaconError> {
    first_yaml_document::<Value>(body, Value::is_object).map_err(|e| BeaconError::Parse(format!("invalid YAML: {}", e)))
}

/// Decode a YAML document, ignoring anything after it.
///
/// A trailing `---` document is dropped. Otherwise, when decoding fails, the
/// longest run of lines before the error location that decodes (and passes
/// `accept`) wins. On failure the original error is returned.
fn first_yaml_document<T: DeserializeOwned>(body: &str, accept: fn(&T) -> bool) -> Result<T, serde_yaml::Error> {
    let err = match serde_yaml::from_str::<T>(body) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Some(doc) = serde_yaml::Deserializer::from_str(body).next() {
        if let Ok(value) = T::deserialize(doc) {
            if accept(&value) {
                return Ok(value);
            }
        }
    }

    let Some(location) = err.location() else {
        return Err(err);
    };
    let lines: Vec<&str> = body.lines().collect();
    let end = location.line().min(lines.len());
    (1..=end)
        .rev()
        .find_map(|n| {
            serde_yaml::from_str::<T>(&lines[..n].join("\n"))
                .ok()
                .filter(|value| accept(value))
        })
        .ok_or(err)
}
