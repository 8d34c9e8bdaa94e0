//! Inline-or-reference policy for curated files.

use serde::{Deserialize, Serialize};

use crate::types::ImportantFile;

/// Default inline threshold (10 KiB)
pub const DEFAULT_MAX_INLINE_BYTES: u64 = 10 * 1024;

/// A candidate for the snapshot's file section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Candidate {
    /// Bare path: listed in the file tree only
    Path(String),
    /// File with metadata: listed in the tree and decided by the inliner
    File(FileCandidate),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCandidate {
    pub path: String,
    /// Declared size; measured from `content` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    /// Force inlining regardless of size
    #[serde(default)]
    pub inline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FileCandidate {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            bytes: None,
            inline: false,
            content: Some(content.into()),
        }
    }

    pub fn byte_len(&self) -> Option<u64> {
        self.bytes
            .or_else(|| self.content.as_ref().map(|c| c.len() as u64))
    }
}

impl Candidate {
    pub fn path(&self) -> &str {
        match self {
            Candidate::Path(p) => p,
            Candidate::File(f) => &f.path,
        }
    }
}

impl From<&str> for Candidate {
    fn from(path: &str) -> Self {
        Candidate::Path(path.to_string())
    }
}

impl From<FileCandidate> for Candidate {
    fn from(file: FileCandidate) -> Self {
        Candidate::File(file)
    }
}

/// Convert a narrative `max_inline_kb` setting into a byte threshold
pub fn threshold_bytes(max_inline_kb: Option<f64>) -> u64 {
    match max_inline_kb {
        Some(kb) if kb.is_finite() && kb >= 0.0 => (kb * 1024.0) as u64,
        _ => DEFAULT_MAX_INLINE_BYTES,
    }
}

/// Decide inline vs reference for each file, preserving input order.
///
/// A file is inlined when it carries the explicit flag or its size is within
/// `max_inline_bytes`. Files without content can only be referenced.
pub fn decide(files: &[FileCandidate], max_inline_bytes: u64) -> Vec<ImportantFile> {
    files
        .iter()
        .map(|f| {
            let Some(content) = f.content.as_ref() else {
                return ImportantFile::reference(&f.path);
            };
            let bytes = f.bytes.unwrap_or(content.len() as u64);
            if f.inline || bytes <= max_inline_bytes {
                ImportantFile::inline(&f.path, bytes, content.clone())
            } else {
                ImportantFile::reference(&f.path)
            }
        })
        .collect()
}

/// Sorted path list for every candidate, whatever the inline outcome
pub fn file_tree(candidates: &[Candidate]) -> Vec<String> {
    let mut paths: Vec<String> = candidates.iter().map(|c| c.path().to_string()).collect();
    paths.sort();
    paths
}

/// Split candidates into the file tree and the important-file section
pub fn partition(candidates: &[Candidate], max_inline_bytes: u64) -> (Vec<String>, Vec<ImportantFile>) {
    let files: Vec<FileCandidate> = candidates
        .iter()
        .filter_map(|c| match c {
            Candidate::File(f) => Some(f.clone()),
            Candidate::Path(_) => None,
        })
        .collect();
    (file_tree(candidates), decide(&files, max_inline_bytes))
}
