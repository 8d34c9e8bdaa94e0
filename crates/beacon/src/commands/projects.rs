use comfy_table::{ContentArrangement, Table};
use libbeacon_core::{filter_projects, BeaconError, ProjectEntry};
use libbeacon_fetch::{fetch_projects, HttpFetcher};
use serde::Serialize;

use crate::cli::{Cli, ProjectsCommand};
use crate::context::BeaconContext;
use crate::output::{output_success, print_human};

#[derive(Serialize)]
struct ListOutput<'a> {
    base_url: &'a str,
    projects: Vec<&'a ProjectEntry>,
}

#[derive(Serialize)]
struct SelectionOutput<'a> {
    project: Option<&'a str>,
}

pub async fn run(cli: &Cli, cmd: ProjectsCommand) -> Result<(), BeaconError> {
    let mut ctx = BeaconContext::resolve(cli)?;

    match cmd {
        ProjectsCommand::List { base_url, query } => {
            let bases = ctx.base_urls(&base_url);
            let (base, projects) = load_index(&ctx, &bases).await?;
            let matched = filter_projects(&projects, query.as_deref().unwrap_or(""));

            if cli.json {
                output_success(
                    cli,
                    ListOutput {
                        base_url: &base,
                        projects: matched,
                    },
                    "",
                );
            } else if matched.is_empty() {
                print_human(cli, "No projects match");
            } else {
                print_human(cli, &render_table(&matched, ctx.state.last_project.as_deref()));
            }
        }
        ProjectsCommand::Select { id, base_url } => {
            let id = id.trim().to_string();
            if id.is_empty() {
                return Err(BeaconError::InvalidArgs("project id is empty".to_string()));
            }

            // Explicit and configured bases only; the previous selection's
            // base says nothing about this project
            let bases = if base_url.is_empty() {
                ctx.config.base_urls.clone()
            } else {
                base_url
            };
            let selected_base = if bases.is_empty() {
                None
            } else {
                let (index_base, projects) = load_index(&ctx, &bases).await?;
                let entry = projects
                    .iter()
                    .find(|p| p.id == id)
                    .ok_or_else(|| BeaconError::NotFound(format!("project '{}' is not in the index", id)))?;
                Some(entry.base_url().unwrap_or(index_base))
            };

            ctx.state.last_project = Some(id.clone());
            ctx.state.base_url = selected_base;
            ctx.state.save(&ctx.config_dir)?;
            output_success(
                cli,
                SelectionOutput { project: Some(&id) },
                &format!("Selected project {}", id),
            );
        }
        ProjectsCommand::Current => match ctx.state.last_project.as_deref() {
            Some(id) => output_success(cli, SelectionOutput { project: Some(id) }, id),
            None => return Err(BeaconError::NotFound("no project selected".to_string())),
        },
    }

    Ok(())
}

/// First base URL that serves an index
async fn load_index(ctx: &BeaconContext, bases: &[String]) -> Result<(String, Vec<ProjectEntry>), BeaconError> {
    if bases.is_empty() {
        return Err(BeaconError::InvalidArgs(
            "no base URL: pass --base-url or set base_urls in config.toml".to_string(),
        ));
    }

    let fetcher = HttpFetcher::new(ctx.config.timeout_ms())?;
    let mut last_err = None;
    for base in bases {
        match fetch_projects(&fetcher, base).await {
            Ok(projects) => return Ok((base.clone(), projects)),
            Err(e) => {
                tracing::warn!(base = %base, error = %e, "project index unavailable");
                last_err = Some(e);
            }
        }
    }
    Err(last_err
        .map(BeaconError::from)
        .unwrap_or_else(|| BeaconError::Internal("no index fetched".to_string())))
}

fn render_table(projects: &[&ProjectEntry], selected: Option<&str>) -> String {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["", "ID", "Name", "Tags", "Snapshot URL"]);
    for p in projects {
        let marker = if selected == Some(p.id.as_str()) { "*" } else { "" };
        table.add_row(vec![
            marker.to_string(),
            p.id.clone(),
            p.name.clone(),
            p.tags.join(", "),
            p.stp_url.clone(),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_marks_selection() {
        let projects = vec![
            ProjectEntry {
                id: "griffin".into(),
                name: "Griffin".into(),
                tags: vec!["map".into()],
                ..Default::default()
            },
            ProjectEntry {
                id: "beacon".into(),
                name: "Beacon".into(),
                ..Default::default()
            },
        ];
        let refs: Vec<&ProjectEntry> = projects.iter().collect();
        let rendered = render_table(&refs, Some("beacon"));
        assert!(rendered.contains("griffin"));
        assert!(rendered.contains("map"));
        let beacon_line = rendered.lines().find(|l| l.contains("Beacon")).unwrap();
        assert!(beacon_line.contains('*'));
    }
}
