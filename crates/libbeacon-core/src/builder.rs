//! Snapshot assembly from resolved sources.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::inline::{partition, threshold_bytes, Candidate};
use crate::types::{
    BuildTrace, CommitIdentity, CurrentStep, Footer, Narrative, ProjectOverview, RepoIdentity,
    RuntimeFacts, Snapshot,
};

/// Fallback repository name when neither the caller nor the narrative names one
pub const DEFAULT_REPO_NAME: &str = "project-brain-beacon";

pub const DEFAULT_BRANCH: &str = "main";

/// Everything the resolver gathered for one composition
#[derive(Debug, Clone, Default)]
pub struct ResolvedSources {
    pub repo: RepoIdentity,
    pub branch: Option<String>,
    pub commit: CommitIdentity,
    pub runtime: RuntimeFacts,
    pub endpoints: BTreeMap<String, String>,
    pub narrative: Narrative,
    pub prompt_pack: String,
}

/// Build a snapshot stamped with the current time
pub fn build(resolved: &ResolvedSources, files: &[Candidate]) -> Snapshot {
    build_at(resolved, files, Utc::now())
}

/// Build a snapshot stamped with `now`.
///
/// Output depends only on the arguments; two calls with the same inputs and
/// the same `now` produce equal snapshots.
pub fn build_at(resolved: &ResolvedSources, files: &[Candidate], now: DateTime<Utc>) -> Snapshot {
    let narrative = &resolved.narrative;

    let build_trace = BuildTrace {
        repo: RepoIdentity {
            name: non_blank(&resolved.repo.name)
                .or_else(|| narrative.project.name.as_deref().and_then(non_blank))
                .unwrap_or(DEFAULT_REPO_NAME)
                .to_string(),
            remote: resolved.repo.remote.clone(),
        },
        branch: resolved
            .branch
            .as_deref()
            .and_then(non_blank)
            .unwrap_or(DEFAULT_BRANCH)
            .to_string(),
        commit: resolved.commit.clone(),
        generated_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        runtime: resolved.runtime.clone(),
        endpoints: if resolved.endpoints.is_empty() {
            narrative.endpoints.clone()
        } else {
            resolved.endpoints.clone()
        },
    };

    let project_overview = ProjectOverview {
        overview: narrative.project.overview.clone(),
        capabilities: narrative.project.capabilities.clone(),
        architecture: narrative.project.architecture.clone(),
        data_sources: narrative.project.data_sources.clone(),
        goals: narrative.goals.clone(),
    };

    let step_name = narrative.current_step.as_ref().map(|s| s.name.as_str());
    let thread_brief = narrative
        .project
        .summary
        .as_deref()
        .and_then(non_blank)
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "Project {} on {}. Current focus: {}.",
                build_trace.repo.name,
                build_trace.branch,
                step_name.and_then(non_blank).unwrap_or("n/a")
            )
        });

    let current_step = current_step(narrative);

    let (file_tree, important_files) = partition(files, threshold_bytes(narrative.max_inline_kb));

    let footer = Footer::standard(narrative.next_steps.clone(), narrative.commands_recent.clone());

    Snapshot {
        build_trace,
        project_overview,
        thread_brief,
        current_step,
        troubleshooting: narrative.troubleshooting.clone(),
        file_tree,
        important_files,
        prompt_pack: resolved.prompt_pack.clone(),
        footer,
    }
}

/// The step's own commands, or the two most recent commands when it has none
fn current_step(narrative: &Narrative) -> CurrentStep {
    let (name, definition_of_done, own_commands) = match &narrative.current_step {
        Some(step) => (step.name.clone(), step.definition_of_done.clone(), step.commands.clone()),
        None => ("Unknown".to_string(), Vec::new(), Vec::new()),
    };

    let commands = if own_commands.is_empty() {
        narrative.commands_recent.iter().take(2).cloned().collect()
    } else {
        own_commands
    };

    CurrentStep {
        name,
        definition_of_done,
        commands,
    }
}

fn non_blank(s: &str) -> Option<&str> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::FileCandidate;
    use crate::types::narrative::{NarrativeProject, NarrativeStep};
    use crate::types::snapshot::{RULES, STOP_RULE};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_absent_narrative_yields_defaults() {
        let snap = build_at(&ResolvedSources::default(), &[], fixed_now());

        assert_eq!(snap.build_trace.repo.name, DEFAULT_REPO_NAME);
        assert_eq!(snap.build_trace.branch, "main");
        assert_eq!(snap.build_trace.generated_at, "2026-10-19T12:30:00.000Z");
        assert_eq!(snap.project_overview, ProjectOverview::default());
        assert_eq!(
            snap.thread_brief,
            "Project project-brain-beacon on main. Current focus: n/a."
        );
        assert_eq!(snap.current_step.name, "Unknown");
        assert!(snap.current_step.commands.is_empty());
        assert!(snap.troubleshooting.is_empty());
        assert!(snap.file_tree.is_empty());
        assert!(snap.important_files.is_empty());
        assert_eq!(snap.prompt_pack, "");
        assert_eq!(snap.footer.rules.len(), RULES.len());
        assert_eq!(snap.footer.stop_rule, STOP_RULE);

        let value = serde_json::to_value(&snap).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 9);
    }

    #[test]
    fn test_recent_commands_fill_empty_step() {
        let resolved = ResolvedSources {
            narrative: Narrative {
                current_step: Some(NarrativeStep {
                    name: "X".into(),
                    ..Default::default()
                }),
                commands_recent: vec!["a".into(), "b".into(), "c".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        let snap = build_at(&resolved, &[], fixed_now());
        assert_eq!(snap.current_step.name, "X");
        assert_eq!(snap.current_step.commands, vec!["a", "b"]);
        assert_eq!(snap.footer.startup_asks.commands, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_step_commands_win() {
        let resolved = ResolvedSources {
            narrative: Narrative {
                current_step: Some(NarrativeStep {
                    name: "X".into(),
                    definition_of_done: vec!["done".into()],
                    commands: vec!["cargo test".into()],
                }),
                commands_recent: vec!["a".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        let snap = build_at(&resolved, &[], fixed_now());
        assert_eq!(snap.current_step.commands, vec!["cargo test"]);
        assert_eq!(snap.current_step.definition_of_done, vec!["done"]);
    }

    #[test]
    fn test_identity_precedence() {
        let mut resolved = ResolvedSources {
            narrative: Narrative {
                project: NarrativeProject {
                    name: Some("from-narrative".into()),
                    summary: Some("  ".into()),
                    ..Default::default()
                },
                endpoints: BTreeMap::from([("api".to_string(), "https://n".to_string())]),
                ..Default::default()
            },
            branch: Some("feat/x".into()),
            ..Default::default()
        };
        let snap = build_at(&resolved, &[], fixed_now());
        assert_eq!(snap.build_trace.repo.name, "from-narrative");
        assert_eq!(snap.build_trace.branch, "feat/x");
        assert_eq!(snap.build_trace.endpoints.get("api").map(String::as_str), Some("https://n"));
        assert!(snap.thread_brief.starts_with("Project from-narrative on feat/x."));

        resolved.repo.name = "explicit".into();
        resolved.endpoints = BTreeMap::from([("api".to_string(), "https://o".to_string())]);
        let snap = build_at(&resolved, &[], fixed_now());
        assert_eq!(snap.build_trace.repo.name, "explicit");
        assert_eq!(snap.build_trace.endpoints.get("api").map(String::as_str), Some("https://o"));
    }

    #[test]
    fn test_narrative_threshold_applies() {
        let resolved = ResolvedSources {
            narrative: Narrative {
                max_inline_kb: Some(1.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let files: Vec<Candidate> = vec![
            FileCandidate::new("small", "x".repeat(1024)).into(),
            FileCandidate::new("large", "x".repeat(1025)).into(),
        ];
        let snap = build_at(&resolved, &files, fixed_now());
        assert!(snap.important_files[0].is_inline());
        assert!(!snap.important_files[1].is_inline());
    }

    #[test]
    fn test_deterministic_apart_from_timestamp() {
        let resolved = ResolvedSources {
            prompt_pack: "# Prompt".into(),
            ..Default::default()
        };
        let files: Vec<Candidate> = vec!["b".into(), "a".into()];
        let first = build_at(&resolved, &files, fixed_now());
        let second = build_at(&resolved, &files, fixed_now());
        assert_eq!(first, second);

        let later = build_at(&resolved, &files, fixed_now() + chrono::Duration::seconds(5));
        assert_ne!(first.build_trace.generated_at, later.build_trace.generated_at);
        let mut later_same_time = later.clone();
        later_same_time.build_trace.generated_at = first.build_trace.generated_at.clone();
        assert_eq!(first, later_same_time);
    }
}
