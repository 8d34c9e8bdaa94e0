use thiserror::Error;

/// Main error type for beacon operations
#[derive(Debug, Error)]
pub enum BeaconError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("snapshot is not well-formed: missing {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("git error: {0}")]
    Git(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BeaconError {
    /// Get the error code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            BeaconError::InvalidArgs(_) => "invalid_args",
            BeaconError::NotFound(_) => "not_found",
            BeaconError::Network(_) => "network_error",
            BeaconError::Parse(_) => "parse_error",
            BeaconError::Validation { .. } => "validation_error",
            BeaconError::Delivery(_) => "delivery_error",
            BeaconError::Git(_) => "git_error",
            BeaconError::Io(_) => "io_error",
            BeaconError::Json(_) => "parse_error",
            BeaconError::Yaml(_) => "parse_error",
            BeaconError::TomlParse(_) => "invalid_args",
            BeaconError::TomlSerialize(_) => "internal_error",
            BeaconError::Internal(_) => "internal_error",
        }
    }

    /// Get the exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            BeaconError::InvalidArgs(_) => 2,
            BeaconError::TomlParse(_) => 2,
            BeaconError::NotFound(_) => 3,
            BeaconError::Network(_) => 4,
            BeaconError::Parse(_) | BeaconError::Json(_) | BeaconError::Yaml(_) => 5,
            BeaconError::Validation { .. } => 6,
            BeaconError::Delivery(_) => 7,
            BeaconError::Io(_) => 8,
            _ => 1,
        }
    }

    /// Get actionable suggestions for fixing the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            BeaconError::Network(_) => vec![
                "Check that the base URL is reachable (try '<base>/healthz')",
                "Pass --base-url explicitly or set base_urls in .beacon/config.toml",
            ],
            BeaconError::Parse(_) | BeaconError::Json(_) | BeaconError::Yaml(_) => vec![
                "Make sure the text starts with a single '//' or '#' banner line",
                "Re-run 'beacon compose' to produce a fresh copy",
            ],
            BeaconError::Validation { .. } => vec![
                "The document is missing required top-level sections",
                "Re-run 'beacon compose' to produce a complete snapshot",
            ],
            BeaconError::Delivery(_) => vec![
                "Install a clipboard tool (pbcopy, wl-copy, xclip or xsel)",
                "Or use '--deliver file --output <path>' to write the snapshot to disk",
            ],
            BeaconError::NotFound(msg) => {
                if msg.contains("project") {
                    vec!["Run 'beacon projects list' to see available projects"]
                } else {
                    vec![]
                }
            }
            BeaconError::Git(_) => vec![
                "Run inside a git repository or pass --no-git",
            ],
            _ => vec![],
        }
    }

    /// Create a Validation error from the list of absent top-level keys
    pub fn missing_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BeaconError::Validation {
            missing: keys.into_iter().map(Into::into).collect(),
        }
    }
}
