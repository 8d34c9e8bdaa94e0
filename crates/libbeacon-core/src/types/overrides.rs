use std::collections::BTreeMap;

use super::snapshot::{CommitIdentity, RepoIdentity, RuntimeFacts};
use crate::inline::Candidate;

/// Values the caller already knows; these win over anything fetched
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub repo: RepoIdentity,
    pub branch: Option<String>,
    pub commit: CommitIdentity,
    pub runtime: RuntimeFacts,
    pub endpoints: BTreeMap<String, String>,
    pub prompt_pack: Option<String>,
    pub files: Vec<Candidate>,
}
