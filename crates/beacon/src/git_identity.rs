use std::path::Path;

use git2::Repository;
use libbeacon_core::BeaconError;

/// Build identity of the local working copy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub remote: String,
    pub branch: String,
    pub commit_full: String,
}

/// Discover the repository containing `start`.
///
/// Works from any subdirectory and from worktrees. An unborn HEAD leaves
/// branch and commit empty.
pub fn discover(start: &Path) -> Result<GitIdentity, BeaconError> {
    let repo = Repository::discover(start)
        .map_err(|_| BeaconError::Git("not a git repository (or any parent)".to_string()))?;

    let remote = repo
        .find_remote("origin")
        .ok()
        .and_then(|r| r.url().map(str::to_string))
        .unwrap_or_default();

    let (branch, commit_full) = match repo.head() {
        Ok(head) => {
            let branch = if head.is_branch() {
                head.shorthand().unwrap_or_default().to_string()
            } else {
                String::new()
            };
            let commit = head
                .peel_to_commit()
                .map(|c| c.id().to_string())
                .unwrap_or_default();
            (branch, commit)
        }
        Err(_) => (String::new(), String::new()),
    };

    let name = repo_name(&remote).unwrap_or_else(|| {
        repo.workdir()
            .and_then(|w| w.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    Ok(GitIdentity {
        name,
        remote,
        branch,
        commit_full,
    })
}

/// Last path segment of a remote URL without `.git`
fn repo_name(remote: &str) -> Option<String> {
    let trimmed = remote.trim().trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
