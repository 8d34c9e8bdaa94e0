//! Narrative configuration (`brain.yml`) as seen by the composer.
//!
//! The document is authored by hand and produced by external tooling, so
//! extraction is lenient: unknown keys are ignored and wrongly-typed values
//! fall back to their defaults instead of rejecting the whole document.

use std::collections::BTreeMap;

use serde_json::Value;

use super::snapshot::TroubleshootingEntry;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Narrative {
    pub project: NarrativeProject,
    pub goals: Vec<String>,
    pub current_step: Option<NarrativeStep>,
    pub commands_recent: Vec<String>,
    pub next_steps: Vec<String>,
    pub troubleshooting: Vec<TroubleshootingEntry>,
    pub endpoints: BTreeMap<String, String>,
    /// `critical_files.max_inline_kb`
    pub max_inline_kb: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeProject {
    pub name: Option<String>,
    pub overview: String,
    pub summary: Option<String>,
    pub capabilities: Vec<String>,
    pub architecture: Vec<String>,
    pub data_sources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeStep {
    pub name: String,
    pub definition_of_done: Vec<String>,
    pub commands: Vec<String>,
}

impl Narrative {
    /// Whether a parsed document looks like a narrative at all.
    ///
    /// Static hosts happily answer any path with an index page or an empty
    /// object; only documents carrying `project`, `current_step` or a
    /// non-empty `goals` list are accepted.
    pub fn is_recognized(doc: &Value) -> bool {
        let Some(obj) = doc.as_object() else {
            return false;
        };
        let has = |key: &str| obj.get(key).is_some_and(|v| !v.is_null());
        let has_goals = obj
            .get("goals")
            .and_then(Value::as_array)
            .is_some_and(|g| !g.is_empty());
        has("project") || has("current_step") || has_goals
    }

    pub fn from_value(doc: &Value) -> Self {
        let project = doc.get("project").map(NarrativeProject::from_value).unwrap_or_default();

        let current_step = doc
            .get("current_step")
            .filter(|v| v.is_object())
            .map(NarrativeStep::from_value);

        let troubleshooting = doc
            .get("troubleshooting")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(troubleshooting_entry).collect())
            .unwrap_or_default();

        let endpoints = doc
            .get("endpoints")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| scalar_string(v).map(|s| (k.clone(), s)))
                    .collect()
            })
            .unwrap_or_default();

        let max_inline_kb = doc
            .get("critical_files")
            .and_then(|c| c.get("max_inline_kb"))
            .and_then(Value::as_f64)
            .filter(|kb| kb.is_finite() && *kb >= 0.0);

        Self {
            project,
            goals: string_list(doc.get("goals")),
            current_step,
            commands_recent: string_list(doc.get("commands_recent")),
            next_steps: string_list(doc.get("next_steps")),
            troubleshooting,
            endpoints,
            max_inline_kb,
        }
    }
}

impl NarrativeProject {
    fn from_value(v: &Value) -> Self {
        Self {
            name: v.get("name").and_then(scalar_string),
            overview: v.get("overview").and_then(scalar_string).unwrap_or_default(),
            summary: v.get("summary").and_then(scalar_string),
            capabilities: string_list(v.get("capabilities")),
            architecture: string_list(v.get("architecture")),
            data_sources: string_list(v.get("data_sources")),
        }
    }
}

impl NarrativeStep {
    fn from_value(v: &Value) -> Self {
        Self {
            name: v.get("name").and_then(scalar_string).unwrap_or_default(),
            definition_of_done: string_list(v.get("definition_of_done")),
            commands: string_list(v.get("commands")),
        }
    }
}

fn troubleshooting_entry(v: &Value) -> Option<TroubleshootingEntry> {
    if !v.is_object() {
        return None;
    }
    let fix = match v.get("fix") {
        Some(Value::String(s)) => vec![s.clone()],
        other => string_list(other),
    };
    Some(TroubleshootingEntry {
        issue: v.get("issue").and_then(scalar_string).unwrap_or_default(),
        cause: v.get("cause").and_then(scalar_string).unwrap_or_default(),
        fix,
    })
}

fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|items| items.iter().filter_map(scalar_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recognition_guard() {
        assert!(Narrative::is_recognized(&json!({"project": {"name": "x"}})));
        assert!(Narrative::is_recognized(&json!({"current_step": {"name": "s"}})));
        assert!(Narrative::is_recognized(&json!({"goals": ["ship"]})));

        assert!(!Narrative::is_recognized(&json!({})));
        assert!(!Narrative::is_recognized(&json!({"goals": []})));
        assert!(!Narrative::is_recognized(&json!({"project": null})));
        assert!(!Narrative::is_recognized(&json!("<html>")));
        assert!(!Narrative::is_recognized(&json!(["project"])));
    }

    #[test]
    fn test_from_value_full() {
        let doc = json!({
            "project": {
                "name": "beacon",
                "overview": "Composes snapshots",
                "summary": "Working on the copy button",
                "capabilities": ["copy", "download"],
                "architecture": ["cli"],
                "data_sources": ["brain.yml"]
            },
            "goals": ["ship v1"],
            "current_step": {"name": "Step-16a", "definition_of_done": ["valid JSON"], "commands": ["git status"]},
            "commands_recent": ["a", "b", "c"],
            "next_steps": ["Step-17"],
            "troubleshooting": [{"issue": "blank page", "cause": "bad base", "fix": ["set VITE_API_BASE"]}],
            "endpoints": {"api": "https://api.example.com", "port": 5090},
            "critical_files": {"max_inline_kb": 4}
        });

        let n = Narrative::from_value(&doc);
        assert_eq!(n.project.name.as_deref(), Some("beacon"));
        assert_eq!(n.project.capabilities, vec!["copy", "download"]);
        assert_eq!(n.goals, vec!["ship v1"]);
        assert_eq!(n.current_step.as_ref().unwrap().commands, vec!["git status"]);
        assert_eq!(n.commands_recent.len(), 3);
        assert_eq!(n.troubleshooting[0].fix, vec!["set VITE_API_BASE"]);
        assert_eq!(n.endpoints.get("port").map(String::as_str), Some("5090"));
        assert_eq!(n.max_inline_kb, Some(4.0));
    }

    #[test]
    fn test_from_value_tolerates_wrong_types() {
        let doc = json!({
            "project": "not a mapping",
            "goals": "ship",
            "current_step": ["x"],
            "troubleshooting": [{"issue": "i", "cause": "c", "fix": "restart"}, "junk"],
            "critical_files": {"max_inline_kb": "ten"}
        });

        let n = Narrative::from_value(&doc);
        assert_eq!(n.project, NarrativeProject::default());
        assert!(n.goals.is_empty());
        assert!(n.current_step.is_none());
        assert_eq!(n.troubleshooting.len(), 1);
        assert_eq!(n.troubleshooting[0].fix, vec!["restart"]);
        assert!(n.max_inline_kb.is_none());
    }
}
