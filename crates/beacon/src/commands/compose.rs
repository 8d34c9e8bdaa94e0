use std::collections::BTreeMap;
use std::path::Path;

use libbeacon_core::codec::Format;
use libbeacon_core::delivery::{self, Deliverer, DeliveryStatus, SystemClipboard};
use libbeacon_core::{BeaconError, Overrides, TracingHook};
use libbeacon_fetch::{Capabilities, ComposeOptions, ComposeRequest, Composer, Composition, HttpFetcher};
use serde::Serialize;
use tracing::debug;

use crate::candidates;
use crate::cli::{Cli, ComposeArgs, DeliverMode};
use crate::context::BeaconContext;
use crate::git_identity;
use crate::output::{output_success, print_status};

#[derive(Serialize)]
struct ComposeOutput<'a> {
    format: &'a str,
    status: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_error: Option<String>,
    repo: &'a str,
    branch: &'a str,
    files: usize,
    text: &'a str,
}

pub async fn run(cli: &Cli, args: &ComposeArgs) -> Result<(), BeaconError> {
    let ctx = BeaconContext::resolve(cli)?;
    let cwd = std::env::current_dir()?;

    let format = match (args.format, ctx.config.format.as_deref()) {
        (Some(arg), _) => Format::from(arg),
        (None, Some(configured)) => configured.parse()?,
        (None, None) => Format::default(),
    };

    let overrides = build_overrides(args, &cwd)?;
    let request = ComposeRequest {
        overrides,
        base_urls: ctx.base_urls(&args.base_url),
        capabilities: if args.offline {
            Capabilities::offline()
        } else {
            Capabilities::all()
        },
    };

    let fetcher = HttpFetcher::new(args.timeout_ms.unwrap_or(ctx.config.timeout_ms()))?;
    let composer = Composer::new(
        fetcher,
        TracingHook,
        ComposeOptions {
            format,
            project_id: ctx.project_id(args.project.as_deref()),
            source: ctx.config.source.clone(),
            max_inline_kb: ctx.config.max_inline_kb,
        },
    );

    let composition = composer.compose(&request).await?;
    deliver(cli, args, &ctx, &composition)
}

fn deliver(cli: &Cli, args: &ComposeArgs, ctx: &BeaconContext, composition: &Composition) -> Result<(), BeaconError> {
    let snapshot = &composition.snapshot;
    let mut out = ComposeOutput {
        format: composition.format.as_str(),
        status: "printed",
        message: String::new(),
        path: None,
        validation_error: None,
        repo: &snapshot.build_trace.repo.name,
        branch: &snapshot.build_trace.branch,
        files: snapshot.file_tree.len(),
        text: &composition.text,
    };

    match args.deliver {
        DeliverMode::Stdout => {
            if !cli.json {
                print_document(&composition.text);
            }
        }
        DeliverMode::File => {
            let path = match &args.output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(path, &composition.text)?;
                    path.clone()
                }
                None => delivery::write_download(&ctx.download_dir(), &composition.text, composition.format)?,
            };
            out.status = "written";
            out.message = format!("Wrote snapshot to {}", path.display());
            out.path = Some(path.display().to_string());
            print_status(cli, &out.message);
        }
        DeliverMode::Clipboard => {
            let report = Deliverer::new(SystemClipboard, composition.format)
                .with_download_dir(ctx.download_dir())
                .deliver(&composition.text);
            out.status = report.status.as_str();
            out.message = report.message.clone();
            out.path = report.download_path.as_ref().map(|p| p.display().to_string());
            out.validation_error = report.validation_error.clone();

            // Manual-copy surface
            if report.status == DeliveryStatus::Blocked && !cli.json {
                print_document(&report.text);
            }
            print_status(cli, &report.message);
            if let Some(err) = &report.validation_error {
                print_status(cli, &format!("  {}", err));
            }
        }
    }

    if cli.json {
        output_success(cli, out, "");
    }
    Ok(())
}

fn print_document(text: &str) {
    if text.ends_with('\n') {
        print!("{}", text);
    } else {
        println!("{}", text);
    }
}

/// Overrides from flags, completed from the local repository unless --no-git
fn build_overrides(args: &ComposeArgs, cwd: &Path) -> Result<Overrides, BeaconError> {
    let mut overrides = Overrides::default();

    overrides.repo.name = args.repo_name.clone().unwrap_or_default();
    overrides.repo.remote = args.remote.clone().unwrap_or_default();
    overrides.branch = args.branch.clone();
    if let Some(commit) = args.commit.as_deref().map(str::trim) {
        if commit.len() > 7 {
            overrides.commit.full = commit.to_string();
        } else {
            overrides.commit.short = commit.to_string();
        }
    }
    overrides.endpoints = parse_endpoints(&args.endpoint)?;

    if let Some(path) = &args.prompt_pack {
        overrides.prompt_pack = Some(std::fs::read_to_string(path)?);
    }

    if !args.no_git {
        match git_identity::discover(cwd) {
            Ok(identity) => {
                if overrides.repo.name.is_empty() {
                    overrides.repo.name = identity.name;
                }
                if overrides.repo.remote.is_empty() {
                    overrides.repo.remote = identity.remote;
                }
                if overrides.branch.is_none() && !identity.branch.is_empty() {
                    overrides.branch = Some(identity.branch);
                }
                if overrides.commit.full.is_empty() && overrides.commit.short.is_empty() {
                    overrides.commit.full = identity.commit_full;
                }
            }
            Err(e) => debug!(error = %e, "no local git identity"),
        }
    }

    overrides.files = candidates::collect(
        cwd,
        &args.file,
        &args.inline,
        args.pattern.as_deref(),
        !args.no_git,
    )?;

    Ok(overrides)
}

/// Parse repeated `key=url` flags
fn parse_endpoints(raw: &[String]) -> Result<BTreeMap<String, String>, BeaconError> {
    let mut endpoints = BTreeMap::new();
    for entry in raw {
        let (key, value) = entry
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .ok_or_else(|| {
                BeaconError::InvalidArgs(format!("endpoint must be key=url, got '{}'", entry))
            })?;
        endpoints.insert(key.to_string(), value.to_string());
    }
    Ok(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_parse_endpoints() {
        let parsed = parse_endpoints(&["api = https://a".to_string(), "prompt_pack=https://p".to_string()]).unwrap();
        assert_eq!(parsed["api"], "https://a");
        assert_eq!(parsed["prompt_pack"], "https://p");

        assert!(parse_endpoints(&["nope".to_string()]).is_err());
        assert!(parse_endpoints(&["k=".to_string()]).is_err());
    }

    #[test]
    fn test_overrides_from_flags() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("pack.md"), "# Local pack").unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();

        let args = ComposeArgs {
            repo_name: Some("beacon".into()),
            branch: Some("dev".into()),
            commit: Some("0123456789abcdef".into()),
            prompt_pack: Some(dir.path().join("pack.md")),
            file: vec![PathBuf::from("main.rs")],
            no_git: true,
            ..Default::default()
        };
        let overrides = build_overrides(&args, dir.path()).unwrap();

        assert_eq!(overrides.repo.name, "beacon");
        assert_eq!(overrides.branch.as_deref(), Some("dev"));
        assert_eq!(overrides.commit.full, "0123456789abcdef");
        assert_eq!(overrides.prompt_pack.as_deref(), Some("# Local pack"));
        assert_eq!(overrides.files.len(), 1);
    }
}
