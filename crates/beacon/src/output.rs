use libbeacon_core::{BeaconError, SCHEMA_VERSION};
use serde::Serialize;
use crate::cli::Cli;

/// JSON response envelope
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    pub schema_version: u32,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

#[derive(Serialize)]
pub struct JsonError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

/// Output a successful result; human mode prints `human` instead of the data
pub fn output_success<T: Serialize>(cli: &Cli, data: T, human: &str) {
    if cli.json {
        let response = JsonResponse {
            schema_version: SCHEMA_VERSION,
            ok: true,
            data: Some(data),
            error: None,
        };
        println!("{}", to_pretty(&response));
    } else if !cli.quiet && !human.is_empty() {
        println!("{}", human);
    }
}

/// Output an error
pub fn output_error(cli: &Cli, err: &BeaconError) {
    if cli.json {
        let suggestions = err.suggestions();
        let mut details = serde_json::Map::new();
        if let BeaconError::Validation { missing } = err {
            details.insert("missing".to_string(), serde_json::json!(missing));
        }
        if !suggestions.is_empty() {
            details.insert("suggestions".to_string(), serde_json::json!(suggestions));
        }
        let details = if details.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::Value::Object(details)
        };

        let response: JsonResponse<()> = JsonResponse {
            schema_version: SCHEMA_VERSION,
            ok: false,
            data: None,
            error: Some(JsonError {
                code: err.error_code().to_string(),
                message: err.to_string(),
                details,
            }),
        };
        eprintln!("{}", to_pretty(&response));
    } else {
        eprintln!("error: {}", err);
        let suggestions = err.suggestions();
        if !suggestions.is_empty() {
            eprintln!();
            eprintln!("Suggestions:");
            for suggestion in suggestions {
                eprintln!("  - {}", suggestion);
            }
        }
    }
}

/// Print human-readable output (ignored in quiet mode)
pub fn print_human(cli: &Cli, msg: &str) {
    if !cli.json && !cli.quiet {
        println!("{}", msg);
    }
}

/// Human status line on stderr, keeping stdout for the document
pub fn print_status(cli: &Cli, msg: &str) {
    if !cli.json && !cli.quiet {
        eprintln!("{}", msg);
    }
}

fn to_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"ok\": false, \"error\": \"{}\"}}", e))
}
