//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tabled::Tabled;

use netweave_core::{
    BatchEntry, CommandBatch, ConnectionKey, CoreError, ConnectionKind, ConnectionPlan, EntityId, Host,
    InterfaceEntry, Router, Switch, TopologyService, TopologySnapshot, submit_batch,
};

use crate::cli::{AddressArgs, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;
use crate::output;

// ── Snapshot files ──────────────────────────────────────────────────

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

/// Read a JSON or YAML document, picking the format by file extension.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path)?;
    if is_yaml(path) {
        serde_yaml::from_str(&contents).map_err(|source| CliError::Yaml {
            path: path.display().to_string(),
            source,
        })
    } else {
        serde_json::from_str(&contents).map_err(|source| CliError::Json {
            path: path.display().to_string(),
            source,
        })
    }
}

fn write_document<T: Serialize>(path: &Path, data: &T) -> Result<(), CliError> {
    let rendered = if is_yaml(path) {
        serde_yaml::to_string(data).map_err(|source| CliError::Yaml {
            path: path.display().to_string(),
            source,
        })?
    } else {
        let mut json = serde_json::to_string_pretty(data).map_err(|source| CliError::Json {
            path: path.display().to_string(),
            source,
        })?;
        json.push('\n');
        json
    };
    std::fs::write(path, rendered)?;
    Ok(())
}

/// The loaded snapshot, narrowed to one project when asked.
///
/// Plans are computed against the narrowed view; applied commands go to
/// the full snapshot so other projects survive the write-back.
pub struct Workspace {
    path: PathBuf,
    full: TopologySnapshot,
    view: Option<TopologySnapshot>,
    project: Option<EntityId>,
    pub max_hops: usize,
}

impl Workspace {
    pub fn open(target: Target, max_hops: usize) -> Result<Self, CliError> {
        let full: TopologySnapshot = read_document(&target.snapshot)?;
        tracing::info!(
            path = %target.snapshot.display(),
            routers = full.routers.len(),
            switches = full.switches.len(),
            links = full.connections().count(),
            "loaded snapshot"
        );
        let mut workspace = Self {
            path: target.snapshot,
            full,
            view: None,
            project: target.project,
            max_hops,
        };
        workspace.refresh_view();
        Ok(workspace)
    }

    fn refresh_view(&mut self) {
        self.view = self.project.map(|id| self.full.for_project(id));
    }

    pub fn snapshot(&self) -> &TopologySnapshot {
        self.view.as_ref().unwrap_or(&self.full)
    }

    pub fn service(&self) -> TopologyService<'_> {
        TopologyService::new(self.snapshot())
    }

    /// The selected project, if any.
    pub fn project(&self) -> Option<EntityId> {
        self.project
    }

    /// The project a path query runs in: the selected one, or else the one
    /// owning `node`, the first node of the chain.
    pub fn project_for(&self, node: Option<&str>) -> Result<EntityId, CliError> {
        if let Some(project) = self.project {
            return Ok(project);
        }
        let Some(node) = node else {
            return Err(CoreError::EmptyChain { len: 0 }.into());
        };
        self.service().project_of(node).map_err(|err| match err {
            CoreError::Validation { field, reason } if field == "project" => CliError::Validation {
                field,
                reason: format!("{reason} with --project"),
            },
            other => other.into(),
        })
    }

    /// Submit a batch against the snapshot and write it back to disk.
    ///
    /// Nothing is written when any command fails; the in-memory snapshot is
    /// compensated by `submit_batch` before the error is returned.
    pub fn apply(&mut self, batch: &CommandBatch, global: &GlobalOpts) -> Result<(), CliError> {
        if batch.is_empty() {
            if !global.quiet {
                eprintln!("Nothing to apply");
            }
            return Ok(());
        }
        let prompt = format!(
            "Apply {} command(s) to {}?",
            batch.len(),
            self.path.display()
        );
        if !confirm(&prompt, global.yes)? {
            return Ok(());
        }

        let applied = submit_batch(&mut self.full, batch)?;
        write_document(&self.path, &self.full)?;
        self.refresh_view();
        tracing::info!(applied, path = %self.path.display(), "snapshot written");
        if !global.quiet {
            eprintln!("Applied {applied} command(s) to {}", self.path.display());
        }
        Ok(())
    }
}

// ── Lookups ─────────────────────────────────────────────────────────

pub fn resolve_router<'a>(service: &TopologyService<'a>, identifier: &str) -> Result<&'a Router, CliError> {
    service.router(identifier).map_err(|_| not_found("router", identifier))
}

pub fn resolve_switch<'a>(service: &TopologyService<'a>, identifier: &str) -> Result<&'a Switch, CliError> {
    service.switch(identifier).map_err(|_| not_found("switch", identifier))
}

pub fn resolve_host<'a>(service: &TopologyService<'a>, identifier: &str) -> Result<&'a Host, CliError> {
    service.host(identifier).map_err(|_| not_found("host", identifier))
}

fn not_found(resource_type: &str, identifier: &str) -> CliError {
    CliError::NotFound {
        resource_type: resource_type.into(),
        identifier: identifier.into(),
        list_command: "links list".into(),
    }
}

/// Parse a link key as printed by `links list`: `kind/project/a/b`.
pub fn parse_key(raw: &str) -> Result<ConnectionKey, CliError> {
    let invalid = |reason: &str| CliError::Validation {
        field: "key".into(),
        reason: format!("'{raw}' {reason}"),
    };
    let parts: Vec<&str> = raw.trim().split('/').collect();
    let &[kind, project, a, b] = parts.as_slice() else {
        return Err(invalid("is not of the form kind/project/a/b"));
    };
    let kind = ConnectionKind::from_str(kind)
        .map_err(|_| invalid("has an unknown link kind (routerSwitch, switchSwitch, switchHost)"))?;
    let id = |part: &str| EntityId::from_str(part).map_err(|_| invalid("has a non-numeric id"));
    Ok(ConnectionKey {
        kind,
        project_id: id(project)?,
        a: id(a)?,
        b: id(b)?,
    })
}

/// Parse the repeated `--ip ADDRESS/MASK` values.
pub fn interface_entries(addresses: &AddressArgs) -> Result<Vec<InterfaceEntry>, CliError> {
    addresses
        .ips
        .iter()
        .map(|raw| InterfaceEntry::from_str(raw).map_err(CliError::from))
        .collect()
}

// ── Prompts ─────────────────────────────────────────────────────────

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.trim_end_matches('?').into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

// ── Plans ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Step<'a> {
    step: usize,
    #[serde(flatten)]
    entry: &'a BatchEntry,
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    step: usize,
    #[tabled(rename = "Direction")]
    direction: String,
    #[tabled(rename = "Op")]
    op: &'static str,
    #[tabled(rename = "Target")]
    target: String,
}

impl From<&Step<'_>> for StepRow {
    fn from(s: &Step<'_>) -> Self {
        Self {
            step: s.step,
            direction: s.entry.direction.to_string(),
            op: s.entry.command.verb(),
            target: s.entry.command.target(),
        }
    }
}

fn steps(batch: &CommandBatch) -> Vec<Step<'_>> {
    batch
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| Step { step: i + 1, entry })
        .collect()
}

fn step_line(s: &Step<'_>) -> String {
    format!("{} {}", s.entry.command.verb(), s.entry.command.target())
}

/// Print the commands of a batch, one row per step.
pub fn print_batch(batch: &CommandBatch, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(
        global.output_format(),
        &steps(batch),
        |s| StepRow::from(s),
        step_line,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Print a connection plan: its steps plus any interface it frees.
pub fn print_plan(plan: &ConnectionPlan, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(
        global.output_format(),
        plan,
        |p| {
            let rows: Vec<StepRow> = steps(&p.batch).iter().map(|s| StepRow::from(s)).collect();
            let mut text = format!("{} link: {} command(s)\n", p.kind, p.batch.len());
            text.push_str(&output::render_table(&rows));
            if let Some(interface) = &p.released_interface {
                text.push_str(&format!("\nReleases interface {interface}"));
            }
            text
        },
        |p| steps(&p.batch).iter().map(step_line).collect::<Vec<_>>().join("\n"),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_printed_keys() {
        let key = parse_key("switchSwitch/1/10/11").unwrap();
        assert_eq!(key.kind, ConnectionKind::SwitchSwitch);
        assert_eq!(key.b, EntityId::new(11));
        assert_eq!(key.to_string(), "switchSwitch/1/10/11");
    }

    #[test]
    fn rejects_malformed_keys() {
        for raw in ["switchSwitch/1/10", "bridge/1/2/3", "routerSwitch/a/2/3"] {
            assert!(matches!(parse_key(raw), Err(CliError::Validation { .. })), "{raw}");
        }
    }

    #[test]
    fn snapshot_format_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topo.yml");
        std::fs::write(&path, "routers:\n  - {routerid: 1, routername: R1, projectid: 1}\n").unwrap();
        let snap: TopologySnapshot = read_document(&path).unwrap();
        assert_eq!(snap.routers.len(), 1);

        write_document(&path, &snap).unwrap();
        let again: TopologySnapshot = read_document(&path).unwrap();
        assert_eq!(again.routers.len(), 1);
    }
}
