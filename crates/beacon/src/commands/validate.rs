use std::io::Read;
use std::path::Path;

use libbeacon_core::codec::{self, Format};
use libbeacon_core::BeaconError;
use serde::Serialize;

use crate::cli::Cli;
use crate::output::output_success;

#[derive(Serialize)]
struct ValidateOutput {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    repo: String,
    branch: String,
    generated_at: String,
    files: usize,
    inlined: usize,
}

pub fn run(cli: &Cli, path: Option<&Path>) -> Result<(), BeaconError> {
    let text = match path.filter(|p| p.as_os_str() != "-") {
        Some(path) => std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BeaconError::NotFound(format!("file {}", path.display())),
            _ => BeaconError::Io(e),
        })?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let snapshot = codec::validate(&text)?;
    let (format, _) = codec::strip_banner(&text);

    let out = ValidateOutput {
        valid: true,
        format: format.map(|f: Format| f.as_str()),
        repo: snapshot.build_trace.repo.name.clone(),
        branch: snapshot.build_trace.branch.clone(),
        generated_at: snapshot.build_trace.generated_at.clone(),
        files: snapshot.file_tree.len(),
        inlined: snapshot.important_files.iter().filter(|f| f.is_inline()).count(),
    };
    let human = format!(
        "valid snapshot: {} on {} ({} files, {} inlined, generated {})",
        out.repo, out.branch, out.files, out.inlined, out.generated_at
    );
    output_success(cli, out, &human);
    Ok(())
}
