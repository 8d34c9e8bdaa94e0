use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use libbeacon_core::{BeaconError, Candidate, FileCandidate};

/// Collect snapshot file candidates.
///
/// `files` and `inline` are read from disk (relative to `root`) and decided
/// by the inliner; `inline` ones are forced inline. Files matching `pattern`
/// only join the file tree. With `use_git` the pattern runs over
/// `git ls-files`, otherwise over the filesystem.
pub fn collect(
    root: &Path,
    files: &[PathBuf],
    inline: &[PathBuf],
    pattern: Option<&str>,
    use_git: bool,
) -> Result<Vec<Candidate>, BeaconError> {
    let mut candidates = Vec::new();

    for (path, forced) in files
        .iter()
        .map(|p| (p, false))
        .chain(inline.iter().map(|p| (p, true)))
    {
        let display = display_path(path.strip_prefix(root).unwrap_or(path));
        if candidates.iter().any(|c: &Candidate| c.path() == display) {
            continue;
        }
        candidates.push(Candidate::File(read_candidate(root, path, display, forced)?));
    }

    if let Some(pattern) = pattern {
        let matched = if use_git {
            tracked_matching(root, pattern)?
        } else {
            walk_matching(root, pattern)?
        };
        for path in matched {
            if !candidates.iter().any(|c| c.path() == path) {
                candidates.push(Candidate::Path(path));
            }
        }
    }

    Ok(candidates)
}

fn read_candidate(root: &Path, path: &Path, display: String, forced: bool) -> Result<FileCandidate, BeaconError> {
    let full = root.join(path);
    let metadata = std::fs::metadata(&full).map_err(|e| match e.kind() {
        ErrorKind::NotFound => BeaconError::NotFound(format!("file {}", display)),
        _ => BeaconError::Io(e),
    })?;

    // Non-UTF-8 content cannot be embedded; it stays a reference
    let content = match std::fs::read_to_string(&full) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == ErrorKind::InvalidData => None,
        Err(e) => return Err(BeaconError::Io(e)),
    };

    Ok(FileCandidate {
        path: display,
        bytes: Some(metadata.len()),
        inline: forced,
        content,
    })
}

/// Get tracked files matching a glob, using git ls-files
fn tracked_matching(root: &Path, pattern: &str) -> Result<Vec<String>, BeaconError> {
    let glob = compile(pattern)?;
    let output = StdCommand::new("git")
        .arg("ls-files")
        .current_dir(root)
        .output()
        .map_err(|e| BeaconError::Git(format!("failed to run git ls-files: {}", e)))?;

    if !output.status.success() {
        return Err(BeaconError::Git("git ls-files failed".to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .filter(|l| !l.is_empty() && glob.matches(l))
        .map(str::to_string)
        .collect())
}

fn walk_matching(root: &Path, pattern: &str) -> Result<Vec<String>, BeaconError> {
    compile(pattern)?;
    let full = root.join(pattern);
    let entries = glob::glob(&full.to_string_lossy())
        .map_err(|e| BeaconError::InvalidArgs(format!("invalid glob pattern: {}", e)))?;

    let mut paths = Vec::new();
    for entry in entries.flatten() {
        if entry.is_file() {
            let relative = entry.strip_prefix(root).unwrap_or(&entry);
            paths.push(display_path(relative));
        }
    }
    Ok(paths)
}

fn compile(pattern: &str) -> Result<glob::Pattern, BeaconError> {
    glob::Pattern::new(pattern)
        .map_err(|e| BeaconError::InvalidArgs(format!("invalid glob pattern: {}", e)))
}

/// Forward-slash path as it appears in the snapshot
fn display_path(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    text.strip_prefix("./").map(str::to_string).unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_collect_reads_explicit_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("small.rs"), "fn a() {}\n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "# notes").unwrap();
        std::fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();

        let candidates = collect(
            dir.path(),
            &[PathBuf::from("./small.rs"), PathBuf::from("blob.bin")],
            &[PathBuf::from("notes.md")],
            None,
            false,
        )
        .unwrap();

        assert_eq!(candidates.len(), 3);
        match &candidates[0] {
            Candidate::File(f) => {
                assert_eq!(f.path, "small.rs");
                assert_eq!(f.bytes, Some(10));
                assert!(!f.inline);
            }
            other => panic!("unexpected candidate {:?}", other),
        }
        match &candidates[1] {
            Candidate::File(f) => assert!(f.content.is_none()),
            other => panic!("unexpected candidate {:?}", other),
        }
        match &candidates[2] {
            Candidate::File(f) => assert!(f.inline),
            other => panic!("unexpected candidate {:?}", other),
        }
    }

    #[test]
    fn test_absolute_file_is_relative_to_root() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "pub fn a() {}\n").unwrap();

        let candidates = collect(dir.path(), &[dir.path().join("src/lib.rs")], &[], None, false).unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].path(), "src/lib.rs");
        match &candidates[0] {
            Candidate::File(f) => assert_eq!(f.content.as_deref(), Some("pub fn a() {}\n")),
            other => panic!("unexpected candidate {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = collect(dir.path(), &[PathBuf::from("nope.rs")], &[], None, false).unwrap_err();
        assert!(matches!(err, BeaconError::NotFound(_)));
    }

    #[test]
    fn test_pattern_adds_tree_only_paths() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/a.rs"), "a").unwrap();
        std::fs::write(dir.path().join("src/b.rs"), "b").unwrap();
        std::fs::write(dir.path().join("src/c.txt"), "c").unwrap();

        let candidates = collect(
            dir.path(),
            &[PathBuf::from("src/a.rs")],
            &[],
            Some("src/*.rs"),
            false,
        )
        .unwrap();

        let paths: Vec<&str> = candidates.iter().map(Candidate::path).collect();
        assert_eq!(paths, vec!["src/a.rs", "src/b.rs"]);
        assert!(matches!(candidates[1], Candidate::Path(_)));
    }

    #[test]
    fn test_bad_pattern() {
        let dir = tempdir().unwrap();
        let err = collect(dir.path(), &[], &[], Some("src/[.rs"), false).unwrap_err();
        assert!(matches!(err, BeaconError::InvalidArgs(_)));
    }
}
