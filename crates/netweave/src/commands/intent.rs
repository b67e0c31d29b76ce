//! Custom intent and path command handlers.

use serde::Serialize;
use tabled::Tabled;

use netweave_core::CustomIntent;

use crate::cli::{GlobalOpts, IntentArgs, IntentCommand};
use crate::error::CliError;
use crate::output;

use super::util::{self, Workspace};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    node: String,
}

#[derive(Serialize)]
struct PathEntry {
    hops: usize,
    nodes: Vec<String>,
}

#[derive(Tabled)]
struct PathRow {
    #[tabled(rename = "Hops")]
    hops: usize,
    #[tabled(rename = "Path")]
    path: String,
}

fn print_nodes(nodes: &[String], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(
        global.output_format(),
        nodes,
        |n| NodeRow { node: n.clone() },
        String::clone,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(ws: &mut Workspace, args: IntentArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        IntentCommand::Check {
            nodes,
            from_file,
            apply,
        } => {
            let Some(path) = from_file else {
                if apply.apply {
                    return Err(CliError::Validation {
                        field: "apply".into(),
                        reason: "--apply needs an intent from --from-file".into(),
                    });
                }
                let project = ws.project_for(nodes.first().map(String::as_str))?;
                ws.service().check_chain(project, &nodes)?;
                let color = output::should_color(global.color_mode());
                if !global.quiet {
                    eprintln!("{}", output::status("Path is valid", true, color));
                }
                return Ok(());
            };

            let intent: CustomIntent = util::read_document(&path)?;
            if let Some(project) = ws.project().filter(|p| *p != intent.project_id) {
                return Err(CliError::Validation {
                    field: "projectid".into(),
                    reason: format!(
                        "intent belongs to project {}, but project {project} is selected",
                        intent.project_id
                    ),
                });
            }
            let batch = ws.service().plan_intent(&intent)?;
            util::print_batch(&batch, global)?;
            if apply.apply {
                ws.apply(&batch, global)?;
            }
            Ok(())
        }

        IntentCommand::NextHops { nodes } => {
            let project = ws.project_for(nodes.first().map(String::as_str))?;
            print_nodes(&ws.service().next_hops(project, &nodes), global)
        }

        IntentCommand::Destinations { nodes } => {
            let project = ws.project_for(nodes.first().map(String::as_str))?;
            print_nodes(&ws.service().destinations(project, &nodes), global)
        }

        IntentCommand::Paths {
            source,
            destination,
            max_hops,
        } => {
            let max_hops = max_hops.unwrap_or(ws.max_hops);
            let project = ws.project_for(Some(source.as_str()))?;
            let paths: Vec<PathEntry> = ws
                .service()
                .paths(project, &source, &destination, max_hops)?
                .into_iter()
                .map(|nodes| PathEntry {
                    hops: nodes.len().saturating_sub(1),
                    nodes,
                })
                .collect();
            if paths.is_empty() && !global.quiet {
                eprintln!("No path from {source} to {destination} within {max_hops} hop(s)");
            }
            let out = output::render_list(
                global.output_format(),
                &paths,
                |p| PathRow {
                    hops: p.hops,
                    path: p.nodes.join(" -> "),
                },
                |p| p.nodes.join(" "),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
