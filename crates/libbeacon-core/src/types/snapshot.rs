use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level keys of a snapshot, in emission order
pub const REQUIRED_KEYS: [&str; 9] = [
    "build_trace",
    "project_overview",
    "thread_brief",
    "current_step",
    "troubleshooting",
    "file_tree",
    "important_files",
    "prompt_pack",
    "footer",
];

/// Note attached to files that are referenced instead of inlined
pub const REFERENCE_NOTE: &str = "ask by path";

/// The composed root document.
///
/// Field order is the wire order; serde emits struct fields in declaration
/// order, so reordering these fields changes the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub build_trace: BuildTrace,
    pub project_overview: ProjectOverview,
    pub thread_brief: String,
    pub current_step: CurrentStep,
    pub troubleshooting: Vec<TroubleshootingEntry>,
    pub file_tree: Vec<String>,
    pub important_files: Vec<ImportantFile>,
    pub prompt_pack: String,
    pub footer: Footer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildTrace {
    pub repo: RepoIdentity,
    pub branch: String,
    pub commit: CommitIdentity,
    /// ISO-8601 UTC, stamped by the builder
    pub generated_at: String,
    pub runtime: RuntimeFacts,
    pub endpoints: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoIdentity {
    pub name: String,
    pub remote: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitIdentity {
    pub short: String,
    pub full: String,
}

impl CommitIdentity {
    pub fn is_complete(&self) -> bool {
        !self.short.is_empty() && !self.full.is_empty()
    }

    /// Fill empty parts from `other`, deriving the short hash from the full one if needed
    pub fn fill_from(&mut self, other: &CommitIdentity) {
        if self.full.is_empty() {
            self.full = other.full.clone();
        }
        if self.short.is_empty() {
            self.short = if other.short.is_empty() {
                self.full.chars().take(7).collect()
            } else {
                other.short.clone()
            };
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeFacts {
    pub python: String,
    pub node: String,
    pub os: String,
}

impl RuntimeFacts {
    pub fn is_complete(&self) -> bool {
        !self.python.is_empty() && !self.node.is_empty() && !self.os.is_empty()
    }

    /// Fill only the fields that are still empty
    pub fn fill_missing(&mut self, other: &RuntimeFacts) {
        for (mine, theirs) in [
            (&mut self.python, &other.python),
            (&mut self.node, &other.node),
            (&mut self.os, &other.os),
        ] {
            if mine.is_empty() && !theirs.is_empty() {
                *mine = theirs.clone();
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectOverview {
    pub overview: String,
    pub capabilities: Vec<String>,
    pub architecture: Vec<String>,
    pub data_sources: Vec<String>,
    pub goals: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentStep {
    pub name: String,
    pub definition_of_done: Vec<String>,
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TroubleshootingEntry {
    pub issue: String,
    pub cause: String,
    pub fix: Vec<String>,
}

/// A curated file, either embedded or referenced by path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImportantFile {
    Inline(InlineFile),
    Reference(FileReference),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineFile {
    pub path: String,
    pub bytes: u64,
    pub inline: bool,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub path: String,
    pub note: String,
}

impl ImportantFile {
    pub fn inline(path: impl Into<String>, bytes: u64, content: impl Into<String>) -> Self {
        ImportantFile::Inline(InlineFile {
            path: path.into(),
            bytes,
            inline: true,
            content: content.into(),
        })
    }

    pub fn reference(path: impl Into<String>) -> Self {
        ImportantFile::Reference(FileReference {
            path: path.into(),
            note: REFERENCE_NOTE.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        match self {
            ImportantFile::Inline(f) => &f.path,
            ImportantFile::Reference(f) => &f.path,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, ImportantFile::Inline(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Footer {
    pub startup_asks: StartupAsks,
    pub rules: Vec<String>,
    pub stop_rule: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupAsks {
    pub summary: String,
    pub next_actions: Vec<String>,
    pub commands: Vec<String>,
}

pub const STARTUP_SUMMARY: &str = "Summarize project state, confirm objective, list missing inputs.";

pub const STOP_RULE: &str = "Stop after 1–2 commands and wait for my output.";

pub const RULES: [&str; 5] = [
    "Treat .brain.yml + Prompt Pack as ground truth.",
    "Use full-file replacements.",
    "Use a Redline Notice if deviating.",
    "Snapshot Ritual after each step (git add/commit/tag + screenshot).",
    STOP_RULE,
];

impl Footer {
    /// Footer with the fixed guidance rules
    pub fn standard(next_actions: Vec<String>, commands: Vec<String>) -> Self {
        Self {
            startup_asks: StartupAsks {
                summary: STARTUP_SUMMARY.to_string(),
                next_actions,
                commands,
            },
            rules: RULES.iter().map(|r| r.to_string()).collect(),
            stop_rule: STOP_RULE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_important_file_shapes() {
        let inline = serde_json::to_value(ImportantFile::inline("a.txt", 3, "abc")).unwrap();
        assert_eq!(
            inline,
            serde_json::json!({"path": "a.txt", "bytes": 3, "inline": true, "content": "abc"})
        );

        let reference = serde_json::to_value(ImportantFile::reference("b.txt")).unwrap();
        assert_eq!(reference, serde_json::json!({"path": "b.txt", "note": "ask by path"}));
    }

    #[test]
    fn test_important_file_untagged_decode() {
        let files: Vec<ImportantFile> = serde_json::from_value(serde_json::json!([
            {"path": "b.txt", "note": "ask by path"},
            {"path": "a.txt", "bytes": 1, "inline": true, "content": "x"},
        ]))
        .unwrap();
        assert!(!files[0].is_inline());
        assert!(files[1].is_inline());
        assert_eq!(files[1].path(), "a.txt");
    }

    #[test]
    fn test_commit_fill_derives_short() {
        let mut commit = CommitIdentity::default();
        commit.fill_from(&CommitIdentity {
            short: String::new(),
            full: "0123456789abcdef".into(),
        });
        assert_eq!(commit.short, "0123456");
        assert!(commit.is_complete());
    }

    #[test]
    fn test_runtime_fill_keeps_explicit() {
        let mut rt = RuntimeFacts {
            python: "3.12".into(),
            ..Default::default()
        };
        rt.fill_missing(&RuntimeFacts {
            python: "3.9".into(),
            node: "20".into(),
            os: String::new(),
        });
        assert_eq!(rt.python, "3.12");
        assert_eq!(rt.node, "20");
        assert!(rt.os.is_empty());
    }

    #[test]
    fn test_footer_rules_end_with_stop_rule() {
        let footer = Footer::standard(vec![], vec![]);
        assert_eq!(footer.rules.last().map(String::as_str), Some(STOP_RULE));
        assert_eq!(footer.stop_rule, STOP_RULE);
    }
}
