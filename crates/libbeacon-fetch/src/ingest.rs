//! Project ingestion client.

use libbeacon_core::codec;
use libbeacon_core::{BeaconError, ProjectEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::client::{join_url, Fetch};
use crate::error::FetchError;

pub const INGEST_PATH: &str = "ingest";

/// Project descriptor submitted for validation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestRequest {
    pub stp_url: String,
    pub ai_url: String,
    pub prompt_pack_url: String,
    pub name: String,
    pub id: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Value>,
}

impl IngestRequest {
    /// Attach a pasted snapshot; it must be JSON (a leading banner line is dropped)
    pub fn with_snapshot_text(mut self, text: &str) -> Result<Self, BeaconError> {
        let (_, body) = codec::strip_banner(text.trim_start());
        let value = serde_json::from_str::<Value>(body)
            .map_err(|e| BeaconError::Parse(format!("snapshot JSON is invalid: {}", e)))?;
        self.snapshot = Some(value);
        Ok(self)
    }

    /// Trim every text field
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.stp_url,
            &mut self.ai_url,
            &mut self.prompt_pack_url,
            &mut self.name,
            &mut self.id,
        ] {
            *field = field.trim().to_string();
        }
        self
    }

    /// Nothing to ingest without a snapshot URL or a pasted snapshot
    pub fn check(&self) -> Result<(), BeaconError> {
        if self.stp_url.is_empty() && self.snapshot.is_none() {
            return Err(BeaconError::InvalidArgs(
                "either a snapshot URL or a snapshot document is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server answer to a successful ingestion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestResponse {
    pub ok: bool,
    pub project: ProjectEntry,
    /// Command that commits the validated project into the index
    pub git_command: String,
}

/// POST the request to `<base>/ingest`
pub async fn ingest<F: Fetch>(
    fetcher: &F,
    base: &str,
    request: &IngestRequest,
) -> Result<IngestResponse, FetchError> {
    let url = join_url(base, INGEST_PATH);
    let body = serde_json::to_value(request).map_err(|e| FetchError::Decode {
        url: url.clone(),
        message: e.to_string(),
    })?;

    let fetched = fetcher.post_json(&url, &body).await?;
    let response: IngestResponse =
        serde_json::from_str(&fetched.body).map_err(|e| FetchError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;

    info!(project = %response.project.id, "project validated");
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::testing::StaticFetcher;

    fn request() -> IngestRequest {
        IngestRequest {
            stp_url: " https://g.test/stp.json ".into(),
            name: "Griffin".into(),
            id: "griffin".into(),
            tags: libbeacon_core::parse_tags("map, ,training"),
            ..Default::default()
        }
        .normalized()
    }

    #[tokio::test]
    async fn test_ingest_success() {
        let fetcher = StaticFetcher::new().with(
            "https://api.test/ingest",
            r#"{"ok": true, "project": {"id": "griffin", "name": "Griffin", "tags": ["map"]},
                "git_command": "git add projects/griffin.json && git commit -m 'add griffin'"}"#,
        );
        let response = ingest(&fetcher, "https://api.test/", &request()).await.unwrap();

        assert!(response.ok);
        assert_eq!(response.project.id, "griffin");
        assert!(response.git_command.starts_with("git add"));

        let posted = fetcher.posted();
        assert_eq!(posted[0].0, "https://api.test/ingest");
        assert_eq!(posted[0].1["stp_url"], json!("https://g.test/stp.json"));
        assert_eq!(posted[0].1["tags"], json!(["map", "training"]));
        assert!(posted[0].1.get("snapshot").is_none());
    }

    #[tokio::test]
    async fn test_ingest_failure_carries_detail() {
        let fetcher = StaticFetcher::new().with_status(
            "https://api.test/ingest",
            422,
            r#"{"detail": "stp_url did not return a snapshot"}"#,
        );
        let err = ingest(&fetcher, "https://api.test", &request()).await.unwrap_err();
        let err: BeaconError = err.into();
        assert_eq!(err.to_string(), "network error: stp_url did not return a snapshot");
    }

    #[test]
    fn test_snapshot_must_be_json() {
        let req = IngestRequest::default()
            .with_snapshot_text("// BRaiN Copy v1\n{\"thread_brief\": \"x\"}")
            .unwrap();
        assert_eq!(req.snapshot, Some(json!({"thread_brief": "x"})));
        assert!(req.check().is_ok());

        let err = IngestRequest::default().with_snapshot_text("thread_brief: x").unwrap_err();
        assert!(matches!(err, BeaconError::Parse(_)));
    }

    #[test]
    fn test_check_requires_source() {
        assert!(IngestRequest::default().check().is_err());
        assert!(request().check().is_ok());
    }
}
