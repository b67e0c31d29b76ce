//! Link command handlers.

use serde::Serialize;
use tabled::Tabled;

use netweave_core::allocator::plan_router_switch;
use netweave_core::mirror::repair_plan;
use netweave_core::{
    CommandBatch, Connection, ConnectionKey, ConnectionKind, ConnectionPlan, EntityId, InterfaceEntry,
    MirrorIssue, RouterLinkRequest, SubnetMask, SwitchHost, SwitchSwitch, TopologyService,
};

use crate::cli::{AddressArgs, GlobalOpts, LinkKind, LinksArgs, LinksCommand};
use crate::error::CliError;
use crate::output;

use super::util::{self, Workspace};

impl From<LinkKind> for ConnectionKind {
    fn from(kind: LinkKind) -> Self {
        match kind {
            LinkKind::RouterSwitch => Self::RouterSwitch,
            LinkKind::SwitchSwitch => Self::SwitchSwitch,
            LinkKind::SwitchHost => Self::SwitchHost,
        }
    }
}

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Portname")]
    portname: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Addresses")]
    addresses: String,
}

impl From<&Connection> for LinkRow {
    fn from(c: &Connection) -> Self {
        let (interface, addresses) = match c {
            Connection::RouterSwitch(link) => (
                link.interface_name.clone().unwrap_or_else(|| "-".into()),
                link.configuration
                    .iter()
                    .map(|(ip, mask)| match SubnetMask::from_dotted(mask) {
                        Ok(m) => format!("{ip}/{}", m.prefix()),
                        Err(_) => format!("{ip} {mask}"),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => (String::new(), String::new()),
        };
        Self {
            key: c.key().to_string(),
            portname: c.portname().to_owned(),
            interface,
            addresses,
        }
    }
}

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "Issue")]
    issue: String,
    #[tabled(rename = "Link")]
    link: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn issue_name(issue: &MirrorIssue) -> &'static str {
    match issue {
        MirrorIssue::SelfLoop { .. } => "self-loop",
        MirrorIssue::MissingReverse { .. } => "missing-reverse",
        MirrorIssue::StalePortname { .. } => "stale-portname",
        MirrorIssue::DanglingSwitch { .. } => "dangling-switch",
    }
}

#[derive(Serialize)]
struct AuditReport<'a> {
    issues: &'a [MirrorIssue],
    #[serde(skip_serializing_if = "Option::is_none")]
    repair: Option<&'a CommandBatch>,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(ws: &mut Workspace, args: LinksArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        LinksCommand::List { kind } => {
            let wanted = kind.map(ConnectionKind::from);
            let links: Vec<Connection> = ws
                .snapshot()
                .connections()
                .filter(|c| wanted.is_none_or(|k| c.kind() == k))
                .collect();
            let out = output::render_list(
                global.output_format(),
                &links,
                |c| LinkRow::from(c),
                |c| c.key().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LinksCommand::PlanCreate {
            kind,
            a,
            b,
            addresses,
            apply,
        } => {
            let plan = plan_create(ws, kind, &a, &b, &addresses)?;
            util::print_plan(&plan, global)?;
            if apply.apply {
                ws.apply(&plan.batch, global)?;
            }
            Ok(())
        }

        LinksCommand::PlanUpdate {
            key,
            src,
            dst,
            addresses,
            apply,
        } => {
            let plan = plan_update(ws, &key, src.as_deref(), dst.as_deref(), &addresses)?;
            util::print_plan(&plan, global)?;
            if apply.apply {
                ws.apply(&plan.batch, global)?;
            }
            Ok(())
        }

        LinksCommand::PlanDelete { key, apply } => {
            let plan = {
                let service = ws.service();
                let key = util::parse_key(&key)?;
                stored_link(&service, &key)?;
                service.plan_delete(&key)?
            };
            util::print_plan(&plan, global)?;
            if apply.apply {
                ws.apply(&plan.batch, global)?;
            }
            Ok(())
        }

        LinksCommand::Audit { repair, apply } => {
            let issues = ws.service().audit();
            let batch = repair.then(|| repair_plan(&issues));
            let color = output::should_color(global.color_mode());

            let report = AuditReport {
                issues: &issues,
                repair: batch.as_ref(),
            };
            let out = output::render_single(
                global.output_format(),
                &report,
                |r| audit_table(r, color),
                |r| {
                    r.issues
                        .iter()
                        .map(|i| format!("{} {}", issue_name(i), i.link().portname))
                        .collect::<Vec<_>>()
                        .join("\n")
                },
            )?;
            output::print_output(&out, global.quiet);

            if let Some(batch) = batch.as_ref().filter(|_| apply) {
                ws.apply(batch, global)?;
            }
            Ok(())
        }
    }
}

fn audit_table(report: &AuditReport<'_>, color: bool) -> String {
    if report.issues.is_empty() {
        return output::status("All switch links are mirrored", true, color);
    }
    let rows: Vec<IssueRow> = report
        .issues
        .iter()
        .map(|issue| IssueRow {
            issue: output::status(issue_name(issue), false, color),
            link: format!(
                "{} -> {}",
                issue.link().switch_id_src,
                issue.link().switch_id_dst
            ),
            detail: issue.to_string(),
        })
        .collect();
    let mut text = output::render_table(&rows);
    if let Some(batch) = report.repair {
        text.push_str(&format!("\n\nRepair: {} command(s)\n", batch.len()));
        text.push_str(
            &batch
                .commands()
                .map(|c| format!("  {} {}", c.verb(), c.target()))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    text
}

// ── Planning ────────────────────────────────────────────────────────

fn persisted(id: Option<EntityId>, kind: &str, name: &str) -> Result<EntityId, CliError> {
    id.ok_or_else(|| CliError::Validation {
        field: kind.into(),
        reason: format!("{kind} '{name}' has no id yet"),
    })
}

fn reject_addresses(kind: ConnectionKind, addresses: &AddressArgs) -> Result<(), CliError> {
    if addresses.ips.is_empty() && addresses.peer.is_none() {
        return Ok(());
    }
    Err(CliError::Validation {
        field: "ip".into(),
        reason: format!("--ip and --peer only apply to routerSwitch links, not {kind}"),
    })
}

fn stored_link(service: &TopologyService<'_>, key: &ConnectionKey) -> Result<Connection, CliError> {
    service.connection(key).map_err(|_| CliError::NotFound {
        resource_type: "link".into(),
        identifier: key.to_string(),
        list_command: "links list".into(),
    })
}

fn plan_create(
    ws: &Workspace,
    kind: LinkKind,
    a: &str,
    b: &str,
    addresses: &AddressArgs,
) -> Result<ConnectionPlan, CliError> {
    let service = ws.service();
    let connection: Connection = match kind {
        LinkKind::RouterSwitch => {
            let router = util::resolve_router(&service, a)?;
            let switch = util::resolve_switch(&service, b)?;
            let request = RouterLinkRequest {
                entries: util::interface_entries(addresses)?,
                peer: addresses.peer.clone(),
            };
            plan_router_switch(router, switch, &request, None)?.into()
        }
        LinkKind::SwitchSwitch => {
            reject_addresses(ConnectionKind::SwitchSwitch, addresses)?;
            let src = util::resolve_switch(&service, a)?;
            let dst = util::resolve_switch(&service, b)?;
            SwitchSwitch {
                project_id: src.project_id,
                switch_id_src: persisted(src.id, "switch", &src.name)?,
                switch_id_dst: persisted(dst.id, "switch", &dst.name)?,
                portname: String::new(),
            }
            .into()
        }
        LinkKind::SwitchHost => {
            reject_addresses(ConnectionKind::SwitchHost, addresses)?;
            let switch = util::resolve_switch(&service, a)?;
            let host = util::resolve_host(&service, b)?;
            SwitchHost {
                project_id: switch.project_id,
                switch_id: persisted(switch.id, "switch", &switch.name)?,
                host_id: persisted(host.id, "host", &host.name)?,
                portname: String::new(),
            }
            .into()
        }
    };
    Ok(service.plan_create(&connection)?)
}

fn plan_update(
    ws: &Workspace,
    key: &str,
    src: Option<&str>,
    dst: Option<&str>,
    addresses: &AddressArgs,
) -> Result<ConnectionPlan, CliError> {
    let service = ws.service();
    let old = stored_link(&service, &util::parse_key(key)?)?;

    let new: Connection = match &old {
        Connection::RouterSwitch(link) => {
            let router_ref = src.map_or_else(|| link.router_id.to_string(), str::to_owned);
            let switch_ref = dst.map_or_else(|| link.switch_id.to_string(), str::to_owned);
            let router = util::resolve_router(&service, &router_ref)?;
            let switch = util::resolve_switch(&service, &switch_ref)?;
            let entries = if addresses.ips.is_empty() {
                link.configuration
                    .iter()
                    .map(|(ip, mask)| InterfaceEntry::new(ip, mask))
                    .collect()
            } else {
                util::interface_entries(addresses)?
            };
            let request = RouterLinkRequest {
                entries,
                peer: addresses.peer.clone().or_else(|| link.peer.clone()),
            };
            plan_router_switch(router, switch, &request, Some(link))?.into()
        }
        Connection::SwitchSwitch(link) => {
            reject_addresses(ConnectionKind::SwitchSwitch, addresses)?;
            let switch_id = |raw: Option<&str>, current: EntityId| -> Result<EntityId, CliError> {
                match raw {
                    Some(raw) => {
                        let switch = util::resolve_switch(&service, raw)?;
                        persisted(switch.id, "switch", &switch.name)
                    }
                    None => Ok(current),
                }
            };
            SwitchSwitch {
                switch_id_src: switch_id(src, link.switch_id_src)?,
                switch_id_dst: switch_id(dst, link.switch_id_dst)?,
                ..link.clone()
            }
            .into()
        }
        Connection::SwitchHost(link) => {
            reject_addresses(ConnectionKind::SwitchHost, addresses)?;
            let switch_id = match src {
                Some(raw) => {
                    let switch = util::resolve_switch(&service, raw)?;
                    persisted(switch.id, "switch", &switch.name)?
                }
                None => link.switch_id,
            };
            let host_id = match dst {
                Some(raw) => {
                    let host = util::resolve_host(&service, raw)?;
                    persisted(host.id, "host", &host.name)?
                }
                None => link.host_id,
            };
            SwitchHost {
                switch_id,
                host_id,
                ..link.clone()
            }
            .into()
        }
    };
    tracing::debug!(from = %old.key(), to = %new.key(), "planning link update");
    Ok(service.plan_update(&old, &new)?)
}
