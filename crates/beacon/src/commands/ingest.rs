use libbeacon_core::{parse_tags, BeaconError};
use libbeacon_fetch::{ingest, HttpFetcher, IngestRequest};

use crate::cli::{Cli, IngestArgs};
use crate::context::BeaconContext;
use crate::output::output_success;

pub async fn run(cli: &Cli, args: &IngestArgs) -> Result<(), BeaconError> {
    let ctx = BeaconContext::resolve(cli)?;

    let base = args
        .base_url
        .clone()
        .or_else(|| ctx.config.base_urls.first().cloned())
        .ok_or_else(|| {
            BeaconError::InvalidArgs("no base URL: pass --base-url or set base_urls in config.toml".to_string())
        })?;

    let mut request = IngestRequest {
        stp_url: args.stp_url.clone(),
        ai_url: args.ai_url.clone(),
        prompt_pack_url: args.prompt_pack_url.clone(),
        name: args.name.clone(),
        id: args.id.clone(),
        tags: parse_tags(&args.tags),
        snapshot: None,
    }
    .normalized();

    if let Some(path) = &args.snapshot {
        let text = std::fs::read_to_string(path)?;
        request = request.with_snapshot_text(&text)?;
    }
    request.check()?;

    let fetcher = HttpFetcher::new(ctx.config.timeout_ms())?;
    let response = ingest(&fetcher, &base, &request).await?;

    let human = format!(
        "Validated project {} ({})\n\nCommit it with:\n  {}",
        response.project.id, response.project.name, response.git_command
    );
    output_success(cli, &response, &human);
    Ok(())
}
