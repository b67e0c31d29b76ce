// ── Connection Mirroring ──
//
// A switch-switch link is stored as two directional records with swapped
// endpoints and concatenated portnames. The reverse record is always
// derived from the forward one and never edited on its own.
//
// Router-switch and switch-host links are single records; they go through
// the same planning functions so callers handle every kind the same way.

use serde::Serialize;
use tracing::debug;

use crate::allocator::validate_interface_configuration;
use crate::command::{Command, CommandBatch, Direction};
use crate::error::CoreError;
use crate::model::{
    Connection, ConnectionKind, EntityId, RouterSwitch, Switch, SwitchHost, SwitchSwitch,
};
use crate::store::{Inventory, TopologySnapshot};

// ── Mirrored pairs ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirroredPair {
    pub forward: SwitchSwitch,
    pub reverse: SwitchSwitch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordUpdate {
    pub old: SwitchSwitch,
    pub new: SwitchSwitch,
}

/// The reverse half of an edit. `stored` is the mirror as persisted,
/// stale portname included; a pair that already lost its mirror has none
/// and `new` is created instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReverseUpdate {
    pub stored: Option<SwitchSwitch>,
    pub new: SwitchSwitch,
}

/// Both halves of a mirrored edit. Submit them together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirroredUpdate {
    pub forward: RecordUpdate,
    pub reverse: ReverseUpdate,
}

/// Both records of a switch-switch link to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirroredDelete {
    pub forward: SwitchSwitch,
    /// The stored mirror, when there is one.
    pub reverse: Option<SwitchSwitch>,
}

fn switch_name<'a>(
    switches: &'a Inventory<Switch>,
    project_id: EntityId,
    id: EntityId,
    field: &str,
) -> Result<&'a str, CoreError> {
    match switches.get(id) {
        Some(s) if s.project_id == project_id => Ok(&s.name),
        Some(s) => Err(CoreError::validation(
            field,
            format!("switch '{}' belongs to project {}", s.name, s.project_id),
        )),
        None => Err(CoreError::validation(field, format!("unknown switch id {id}"))),
    }
}

fn check_endpoints(
    project_id: EntityId,
    src: EntityId,
    dst: EntityId,
    switches: &Inventory<Switch>,
) -> Result<(), CoreError> {
    if src == dst {
        return Err(CoreError::validation(
            "switchid_dst",
            format!("switch {src} cannot be linked to itself"),
        ));
    }
    switch_name(switches, project_id, src, "switchid_src")?;
    switch_name(switches, project_id, dst, "switchid_dst")?;
    Ok(())
}

fn same_direction(a: &SwitchSwitch, b: &SwitchSwitch) -> bool {
    a.project_id == b.project_id && a.switch_id_src == b.switch_id_src && a.switch_id_dst == b.switch_id_dst
}

fn stored_mirror<'a>(forward: &SwitchSwitch, links: &'a [SwitchSwitch]) -> Option<&'a SwitchSwitch> {
    links.iter().find(|other| other.is_reverse_of(forward))
}

/// The record for the other direction, with its portname built from the
/// switch names in reverse order.
fn derive_reverse(forward: &SwitchSwitch, switches: &Inventory<Switch>) -> Result<SwitchSwitch, CoreError> {
    let src = switch_name(switches, forward.project_id, forward.switch_id_src, "switchid_src")?;
    let dst = switch_name(switches, forward.project_id, forward.switch_id_dst, "switchid_dst")?;
    Ok(SwitchSwitch {
        project_id: forward.project_id,
        switch_id_src: forward.switch_id_dst,
        switch_id_dst: forward.switch_id_src,
        portname: format!("{dst}{src}"),
    })
}

/// The forward record with its portname regenerated from the switch names.
fn normalize_forward(link: &SwitchSwitch, switches: &Inventory<Switch>) -> Result<SwitchSwitch, CoreError> {
    let src = switch_name(switches, link.project_id, link.switch_id_src, "switchid_src")?;
    let dst = switch_name(switches, link.project_id, link.switch_id_dst, "switchid_dst")?;
    Ok(SwitchSwitch {
        portname: format!("{src}{dst}"),
        ..link.clone()
    })
}

/// Build both directions of a new switch-switch link.
///
/// Fails on a self-loop, or when either switch is not in `switches` for
/// this project.
pub fn create_mirrored_pair(
    project_id: EntityId,
    src_id: EntityId,
    dst_id: EntityId,
    src_name: &str,
    dst_name: &str,
    switches: &Inventory<Switch>,
) -> Result<MirroredPair, CoreError> {
    check_endpoints(project_id, src_id, dst_id, switches)?;

    let forward = SwitchSwitch {
        project_id,
        switch_id_src: src_id,
        switch_id_dst: dst_id,
        portname: format!("{src_name}{dst_name}"),
    };
    let reverse = SwitchSwitch {
        project_id,
        switch_id_src: dst_id,
        switch_id_dst: src_id,
        portname: format!("{dst_name}{src_name}"),
    };
    debug!(forward = %forward.portname, reverse = %reverse.portname, "created mirrored pair");
    Ok(MirroredPair { forward, reverse })
}

/// Turn an edit of the forward record into updates for both directions.
///
/// The new reverse record is regenerated from the new forward record. The
/// old side is the mirror stored in `links`, so undoing the edit restores
/// exactly what was there.
pub fn update_mirrored_pair(
    old_forward: &SwitchSwitch,
    new_forward: &SwitchSwitch,
    switches: &Inventory<Switch>,
    links: &[SwitchSwitch],
) -> Result<MirroredUpdate, CoreError> {
    if old_forward.project_id != new_forward.project_id {
        return Err(CoreError::validation(
            "projectid",
            "a link cannot move between projects",
        ));
    }
    check_endpoints(
        new_forward.project_id,
        new_forward.switch_id_src,
        new_forward.switch_id_dst,
        switches,
    )?;

    let new = normalize_forward(new_forward, switches)?;
    let new_reverse = derive_reverse(&new, switches)?;
    let stored = stored_mirror(old_forward, links).cloned();

    let taken = links.iter().any(|l| {
        same_direction(l, &new_reverse) && stored.as_ref().is_none_or(|s| !same_direction(s, l))
    });
    if taken {
        return Err(CoreError::validation(
            "connection",
            format!(
                "switch {} is already linked to switch {}",
                new_reverse.switch_id_src, new_reverse.switch_id_dst
            ),
        ));
    }
    if stored.is_none() {
        debug!(link = %old_forward.portname, "edited link had no mirror; it will be created");
    }

    Ok(MirroredUpdate {
        forward: RecordUpdate {
            old: old_forward.clone(),
            new,
        },
        reverse: ReverseUpdate {
            stored,
            new: new_reverse,
        },
    })
}

/// The records to delete for a switch-switch link: the forward one and
/// its mirror as stored in `links`.
pub fn delete_mirrored_pair(forward: &SwitchSwitch, links: &[SwitchSwitch]) -> MirroredDelete {
    MirroredDelete {
        forward: forward.clone(),
        reverse: stored_mirror(forward, links).cloned(),
    }
}

impl MirroredPair {
    pub fn into_batch(self) -> CommandBatch {
        let mut batch = CommandBatch::new();
        batch.push(
            Direction::Forward,
            Command::CreateConnection {
                connection: self.forward.into(),
            },
        );
        batch.push(
            Direction::Reverse,
            Command::CreateConnection {
                connection: self.reverse.into(),
            },
        );
        batch
    }
}

impl MirroredUpdate {
    pub fn into_batch(self) -> CommandBatch {
        let mut batch = CommandBatch::new();
        batch.push(
            Direction::Forward,
            Command::UpdateConnection {
                old: self.forward.old.into(),
                new: self.forward.new.into(),
            },
        );
        let reverse = match self.reverse.stored {
            Some(stored) => Command::UpdateConnection {
                old: stored.into(),
                new: self.reverse.new.into(),
            },
            None => Command::CreateConnection {
                connection: self.reverse.new.into(),
            },
        };
        batch.push(Direction::Reverse, reverse);
        batch
    }
}

impl MirroredDelete {
    pub fn into_batch(self) -> CommandBatch {
        let mut batch = CommandBatch::single(Command::DeleteConnection {
            connection: self.forward.into(),
        });
        if let Some(reverse) = self.reverse {
            batch.push(
                Direction::Reverse,
                Command::DeleteConnection {
                    connection: reverse.into(),
                },
            );
        }
        batch
    }
}

// ── Uniform planning over every connection kind ──

/// What the caller must persist for one connection change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionPlan {
    pub kind: ConnectionKind,
    pub batch: CommandBatch,
    /// Router interface freed by deleting a router-switch link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released_interface: Option<String>,
}

impl ConnectionPlan {
    fn new(kind: ConnectionKind, batch: CommandBatch) -> Self {
        Self {
            kind,
            batch,
            released_interface: None,
        }
    }
}

fn router_name(snapshot: &TopologySnapshot, link: &RouterSwitch) -> Result<String, CoreError> {
    match snapshot.routers.get(link.router_id) {
        Some(r) if r.project_id == link.project_id => Ok(r.name.clone()),
        Some(r) => Err(CoreError::validation(
            "routerid",
            format!("router '{}' belongs to project {}", r.name, r.project_id),
        )),
        None => Err(CoreError::validation(
            "routerid",
            format!("unknown router id {}", link.router_id),
        )),
    }
}

fn host_name(snapshot: &TopologySnapshot, link: &SwitchHost) -> Result<String, CoreError> {
    match snapshot.hosts.get(link.host_id) {
        Some(h) if h.project_id == link.project_id => Ok(h.name.clone()),
        Some(h) => Err(CoreError::validation(
            "hostid",
            format!("host '{}' belongs to project {}", h.name, h.project_id),
        )),
        None => Err(CoreError::validation(
            "hostid",
            format!("unknown host id {}", link.host_id),
        )),
    }
}

/// Normalize a single-record connection: device references resolved,
/// portname regenerated, router interface configuration checked.
fn normalize_single(connection: &Connection, snapshot: &TopologySnapshot) -> Result<Connection, CoreError> {
    match connection {
        Connection::RouterSwitch(link) => {
            let router = router_name(snapshot, link)?;
            let switch = switch_name(&snapshot.switches, link.project_id, link.switch_id, "switchid")?;
            let configuration = validate_interface_configuration(&link.configuration)?;
            Ok(Connection::RouterSwitch(RouterSwitch {
                portname: format!("{router}{switch}"),
                configuration,
                ..link.clone()
            }))
        }
        Connection::SwitchHost(link) => {
            let switch = switch_name(&snapshot.switches, link.project_id, link.switch_id, "switchid")?;
            let host = host_name(snapshot, link)?;
            Ok(Connection::SwitchHost(SwitchHost {
                portname: format!("{switch}{host}"),
                ..link.clone()
            }))
        }
        Connection::SwitchSwitch(link) => normalize_forward(link, &snapshot.switches).map(Connection::from),
    }
}

fn reject_existing(connection: &Connection, snapshot: &TopologySnapshot) -> Result<(), CoreError> {
    if snapshot.find_connection(&connection.key()).is_some() {
        return Err(CoreError::validation(
            "connection",
            format!("{} already exists", connection.key()),
        ));
    }
    Ok(())
}

/// Plan the creation of a connection.
pub fn plan_create(connection: &Connection, snapshot: &TopologySnapshot) -> Result<ConnectionPlan, CoreError> {
    let plan = match connection {
        Connection::SwitchSwitch(link) => {
            let switches = &snapshot.switches;
            let pair = create_mirrored_pair(
                link.project_id,
                link.switch_id_src,
                link.switch_id_dst,
                switches.name_of(link.switch_id_src).unwrap_or_default(),
                switches.name_of(link.switch_id_dst).unwrap_or_default(),
                switches,
            )?;
            reject_existing(&pair.forward.clone().into(), snapshot)?;
            reject_existing(&pair.reverse.clone().into(), snapshot)?;
            ConnectionPlan::new(ConnectionKind::SwitchSwitch, pair.into_batch())
        }
        single => {
            let normalized = normalize_single(single, snapshot)?;
            reject_existing(&normalized, snapshot)?;
            let normalized = match normalized {
                // Interface names are assigned by the backend.
                Connection::RouterSwitch(link) => Connection::RouterSwitch(RouterSwitch {
                    interface_name: None,
                    ..link
                }),
                other => other,
            };
            ConnectionPlan::new(
                single.kind(),
                CommandBatch::single(Command::CreateConnection {
                    connection: normalized,
                }),
            )
        }
    };
    debug!(kind = %plan.kind, commands = plan.batch.len(), "planned connection create");
    Ok(plan)
}

/// Plan an edit. `old` is the stored record, `new` the edited one.
pub fn plan_update(
    old: &Connection,
    new: &Connection,
    snapshot: &TopologySnapshot,
) -> Result<ConnectionPlan, CoreError> {
    if old.kind() != new.kind() {
        return Err(CoreError::validation(
            "kind",
            format!("cannot change a {} link into a {} link", old.kind(), new.kind()),
        ));
    }
    if new.key() != old.key() {
        reject_existing(new, snapshot)?;
    }

    let plan = match (old, new) {
        (Connection::SwitchSwitch(old), Connection::SwitchSwitch(new)) => {
            let update = update_mirrored_pair(old, new, &snapshot.switches, &snapshot.switch_switch)?;
            ConnectionPlan::new(ConnectionKind::SwitchSwitch, update.into_batch())
        }
        _ => {
            let mut normalized = normalize_single(new, snapshot)?;
            if let (Connection::RouterSwitch(stored), Connection::RouterSwitch(edited)) =
                (old, &mut normalized)
            {
                // Interface names belong to the router; a moved link gets a new one.
                edited.interface_name = if stored.router_id == edited.router_id {
                    stored.interface_name.clone()
                } else {
                    None
                };
            }
            ConnectionPlan::new(
                new.kind(),
                CommandBatch::single(Command::UpdateConnection {
                    old: old.clone(),
                    new: normalized,
                }),
            )
        }
    };
    debug!(kind = %plan.kind, commands = plan.batch.len(), "planned connection update");
    Ok(plan)
}

/// Plan the deletion of a stored connection.
///
/// A switch-switch link takes its stored mirror with it. A router-switch
/// link cannot go while a static route on its router still exits through
/// its interface.
pub fn plan_delete(connection: &Connection, snapshot: &TopologySnapshot) -> Result<ConnectionPlan, CoreError> {
    let single = || {
        CommandBatch::single(Command::DeleteConnection {
            connection: connection.clone(),
        })
    };

    let plan = match connection {
        Connection::SwitchSwitch(link) => {
            let pair = delete_mirrored_pair(link, &snapshot.switch_switch);
            if pair.reverse.is_none() {
                debug!(link = %connection.key(), "no stored mirror to delete");
            }
            ConnectionPlan::new(ConnectionKind::SwitchSwitch, pair.into_batch())
        }
        Connection::RouterSwitch(link) => {
            if let Some(interface) = &link.interface_name {
                let routes = snapshot
                    .routers
                    .get(link.router_id)
                    .map(|r| r.configuration.routes.as_slice())
                    .unwrap_or_default();
                if let Some(route) = routes
                    .iter()
                    .find(|r| r.exit_interface.as_deref() == Some(interface.as_str()))
                {
                    return Err(CoreError::validation(
                        "interfacename",
                        format!(
                            "interface '{interface}' is the exit interface of route {}{}",
                            route.prefix,
                            display_mask(&route.mask)
                        ),
                    ));
                }
            }
            ConnectionPlan {
                released_interface: link.interface_name.clone(),
                ..ConnectionPlan::new(ConnectionKind::RouterSwitch, single())
            }
        }
        Connection::SwitchHost(_) => ConnectionPlan::new(ConnectionKind::SwitchHost, single()),
    };

    debug!(kind = %plan.kind, commands = plan.batch.len(), "planned connection delete");
    Ok(plan)
}

fn display_mask(mask: &str) -> String {
    if mask.starts_with('/') {
        mask.to_owned()
    } else {
        format!(" {mask}")
    }
}

// ── Audit ──

/// A switch-switch record that breaks the mirroring rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "camelCase")]
pub enum MirrorIssue {
    SelfLoop { link: SwitchSwitch },
    /// `expected` is the reverse record derived from `forward`.
    MissingReverse {
        forward: SwitchSwitch,
        expected: SwitchSwitch,
    },
    StalePortname { link: SwitchSwitch, expected: String },
    /// The record references a switch the snapshot does not know.
    DanglingSwitch { link: SwitchSwitch, switch_id: EntityId },
}

impl MirrorIssue {
    pub fn link(&self) -> &SwitchSwitch {
        match self {
            Self::SelfLoop { link }
            | Self::StalePortname { link, .. }
            | Self::DanglingSwitch { link, .. } => link,
            Self::MissingReverse { forward, .. } => forward,
        }
    }
}

impl std::fmt::Display for MirrorIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfLoop { link } => write!(f, "switch {} is linked to itself", link.switch_id_src),
            Self::MissingReverse { forward, expected } => write!(
                f,
                "{} -> {} has no mirror (expected portname '{}')",
                forward.switch_id_src, forward.switch_id_dst, expected.portname
            ),
            Self::StalePortname { link, expected } => write!(
                f,
                "{} -> {} has portname '{}', expected '{expected}'",
                link.switch_id_src, link.switch_id_dst, link.portname
            ),
            Self::DanglingSwitch { link, switch_id } => write!(
                f,
                "{} -> {} references unknown switch {switch_id}",
                link.switch_id_src, link.switch_id_dst
            ),
        }
    }
}

/// Check every switch-switch record against the mirroring rules.
///
/// Both directions of a pair are checked independently, so a pair with
/// two stale portnames yields two issues.
pub fn audit_mirrors(links: &[SwitchSwitch], switches: &Inventory<Switch>) -> Vec<MirrorIssue> {
    let mut issues = Vec::new();

    for link in links {
        if link.is_self_loop() {
            issues.push(MirrorIssue::SelfLoop { link: link.clone() });
            continue;
        }
        let (Some(src), Some(dst)) = (
            switches.name_of(link.switch_id_src),
            switches.name_of(link.switch_id_dst),
        ) else {
            let switch_id = if switches.contains(link.switch_id_src) {
                link.switch_id_dst
            } else {
                link.switch_id_src
            };
            issues.push(MirrorIssue::DanglingSwitch {
                link: link.clone(),
                switch_id,
            });
            continue;
        };

        let expected = format!("{src}{dst}");
        if link.portname != expected {
            issues.push(MirrorIssue::StalePortname {
                link: link.clone(),
                expected,
            });
        }
        if !links.iter().any(|other| other.is_reverse_of(link)) {
            issues.push(MirrorIssue::MissingReverse {
                forward: link.clone(),
                expected: SwitchSwitch {
                    project_id: link.project_id,
                    switch_id_src: link.switch_id_dst,
                    switch_id_dst: link.switch_id_src,
                    portname: format!("{dst}{src}"),
                },
            });
        }
    }

    debug!(checked = links.len(), found = issues.len(), "audited switch links");
    issues
}

/// Commands that restore symmetry for the given issues.
///
/// Self-loops are deleted, missing mirrors created, stale portnames
/// rewritten. Dangling references need an operator and are left alone.
pub fn repair_plan(issues: &[MirrorIssue]) -> CommandBatch {
    let mut batch = CommandBatch::new();
    for issue in issues {
        match issue {
            MirrorIssue::SelfLoop { link } => batch.push(
                Direction::Forward,
                Command::DeleteConnection {
                    connection: link.clone().into(),
                },
            ),
            MirrorIssue::MissingReverse { expected, .. } => batch.push(
                Direction::Reverse,
                Command::CreateConnection {
                    connection: expected.clone().into(),
                },
            ),
            MirrorIssue::StalePortname { link, expected } => batch.push(
                Direction::Forward,
                Command::UpdateConnection {
                    old: link.clone().into(),
                    new: SwitchSwitch {
                        portname: expected.clone(),
                        ..link.clone()
                    }
                    .into(),
                },
            ),
            MirrorIssue::DanglingSwitch { .. } => {}
        }
    }
    batch
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::command::{Backend, submit_batch};
    use crate::error::ErrorKind;
    use crate::model::{InterfaceConfiguration, Route, Router, RouterConfiguration};

    fn id(raw: u64) -> EntityId {
        EntityId::new(raw)
    }

    fn snapshot() -> TopologySnapshot {
        let mut snap = TopologySnapshot::default();
        for (raw, name) in [(4, "A"), (5, "B"), (6, "C")] {
            snap.switches.push(Switch {
                id: Some(id(raw)),
                name: name.into(),
                project_id: id(1),
                controller: None,
            });
        }
        snap.switches.push(Switch {
            id: Some(id(9)),
            name: "Z".into(),
            project_id: id(2),
            controller: None,
        });
        snap.routers.push(Router {
            id: Some(id(1)),
            name: "R1".into(),
            project_id: id(1),
            management: None,
            configuration: RouterConfiguration {
                users: vec![],
                routes: vec![Route {
                    prefix: "192.168.0.0".into(),
                    mask: "/24".into(),
                    exit_interface: Some("eth0".into()),
                    exit_gateway: None,
                    metric: None,
                }],
            },
        });
        snap
    }

    fn link(src: u64, dst: u64, portname: &str) -> SwitchSwitch {
        SwitchSwitch {
            project_id: id(1),
            switch_id_src: id(src),
            switch_id_dst: id(dst),
            portname: portname.into(),
        }
    }

    fn router_link(interface: &str) -> RouterSwitch {
        RouterSwitch {
            project_id: id(1),
            router_id: id(1),
            switch_id: id(4),
            portname: "R1A".into(),
            interface_name: Some(interface.into()),
            configuration: [("10.0.0.1", "255.255.255.252")].into_iter().collect(),
            peer: None,
        }
    }

    #[test]
    fn pair_is_symmetric() {
        let snap = snapshot();
        for (src, dst, a, b) in [(4, 5, "A", "B"), (5, 6, "B", "C"), (6, 4, "C", "A")] {
            let pair = create_mirrored_pair(id(1), id(src), id(dst), a, b, &snap.switches).unwrap();
            assert_eq!(pair.reverse.switch_id_src, pair.forward.switch_id_dst);
            assert_eq!(pair.reverse.switch_id_dst, pair.forward.switch_id_src);
            assert_eq!(pair.forward.portname, format!("{a}{b}"));
            assert_eq!(pair.reverse.portname, format!("{b}{a}"));
        }
    }

    #[test]
    fn self_loop_is_rejected() {
        let err = create_mirrored_pair(id(1), id(5), id(5), "A", "A", &snapshot().switches).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn unknown_or_foreign_switches_are_rejected() {
        let switches = snapshot().switches;
        assert!(create_mirrored_pair(id(1), id(4), id(77), "A", "?", &switches).is_err());
        assert!(create_mirrored_pair(id(1), id(4), id(9), "A", "Z", &switches).is_err());
    }

    #[test]
    fn update_regenerates_both_sides() {
        let switches = snapshot().switches;
        let old = link(4, 5, "AB");
        let new = link(4, 6, "whatever");
        let stored = [old.clone(), link(5, 4, "BA")];
        let update = update_mirrored_pair(&old, &new, &switches, &stored).unwrap();

        assert_eq!(update.forward.old, old);
        assert_eq!(update.forward.new, link(4, 6, "AC"));
        assert_eq!(update.reverse.stored, Some(link(5, 4, "BA")));
        assert_eq!(update.reverse.new, link(6, 4, "CA"));

        let batch = update.into_batch();
        let directions: Vec<_> = batch.entries().iter().map(|e| e.direction).collect();
        assert_eq!(directions, [Direction::Forward, Direction::Reverse]);
    }

    #[test]
    fn update_undo_restores_the_stored_mirror() {
        let switches = snapshot().switches;
        let stored = [link(4, 5, "AB"), link(5, 4, "stale")];
        let batch = update_mirrored_pair(&stored[0], &link(4, 6, ""), &switches, &stored)
            .unwrap()
            .into_batch();

        assert_eq!(
            batch.entries()[1].command.compensation(),
            Some(Command::UpdateConnection {
                old: link(6, 4, "CA").into(),
                new: link(5, 4, "stale").into(),
            })
        );
    }

    #[test]
    fn update_recreates_a_missing_mirror() {
        let switches = snapshot().switches;
        let old = link(4, 5, "AB");
        let batch = update_mirrored_pair(&old, &link(4, 6, ""), &switches, &[old.clone()])
            .unwrap()
            .into_batch();
        assert_eq!(
            batch.entries()[1].command,
            Command::CreateConnection {
                connection: link(6, 4, "CA").into()
            }
        );
    }

    #[test]
    fn update_refuses_to_overwrite_another_link() {
        let switches = snapshot().switches;
        let stored = [link(4, 5, "AB"), link(5, 4, "BA"), link(6, 4, "CA")];
        let err = update_mirrored_pair(&stored[0], &link(4, 6, ""), &switches, &stored).unwrap_err();
        assert!(err.to_string().contains("already linked"), "{err}");
    }

    #[test]
    fn update_into_self_loop_is_rejected() {
        let switches = snapshot().switches;
        assert!(update_mirrored_pair(&link(4, 5, "AB"), &link(4, 4, "AA"), &switches, &[]).is_err());
    }

    #[test]
    fn delete_covers_both_directions() {
        let stored = [link(4, 5, "AB"), link(5, 4, "BA")];
        let pair = delete_mirrored_pair(&stored[0], &stored);
        assert_eq!(pair.forward, link(4, 5, "AB"));
        assert_eq!(pair.reverse, Some(link(5, 4, "BA")));
        assert_eq!(pair.into_batch().len(), 2);

        let lone = delete_mirrored_pair(&link(5, 6, "BC"), &stored);
        assert_eq!(lone.reverse, None);
        assert_eq!(lone.into_batch().len(), 1);
    }

    #[test]
    fn plan_create_mirrors_switch_links_only() {
        let snap = snapshot();
        let plan = plan_create(&link(4, 5, "").into(), &snap).unwrap();
        assert_eq!(plan.batch.len(), 2);

        let host_link = Connection::SwitchHost(SwitchHost {
            project_id: id(1),
            switch_id: id(4),
            host_id: id(30),
            portname: String::new(),
        });
        // Host 30 is not in the snapshot.
        assert!(plan_create(&host_link, &snap).is_err());

        let plan = plan_create(&router_link("eth9").into(), &snap).unwrap();
        assert_eq!(plan.batch.len(), 1);
        let Command::CreateConnection {
            connection: Connection::RouterSwitch(created),
        } = &plan.batch.entries()[0].command
        else {
            panic!("expected a router link create");
        };
        assert!(created.interface_name.is_none());
    }

    #[test]
    fn plan_create_rejects_existing_links() {
        let mut snap = snapshot();
        snap.switch_switch.push(link(5, 4, "BA"));
        let err = plan_create(&link(4, 5, "AB").into(), &snap).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn router_link_update_keeps_interface_name() {
        let snap = snapshot();
        let old: Connection = router_link("eth2").into();
        let mut edited = router_link("eth2");
        edited.interface_name = None;
        edited.configuration = [("10.0.0.5", "255.255.255.252")].into_iter().collect::<InterfaceConfiguration>();

        let plan = plan_update(&old, &edited.into(), &snap).unwrap();
        let Command::UpdateConnection {
            new: Connection::RouterSwitch(new),
            ..
        } = &plan.batch.entries()[0].command
        else {
            panic!("expected a router link update");
        };
        assert_eq!(new.interface_name.as_deref(), Some("eth2"));
        assert_eq!(new.configuration.primary_ip(), Some("10.0.0.5"));
    }

    #[test]
    fn router_link_moved_to_another_router_gets_a_new_interface() {
        let mut snap = snapshot();
        snap.routers.push(Router {
            id: Some(id(2)),
            name: "R2".into(),
            project_id: id(1),
            management: None,
            configuration: RouterConfiguration::default(),
        });
        let mut r2_link = router_link("eth0");
        r2_link.router_id = id(2);
        r2_link.switch_id = id(5);
        r2_link.portname = "R2B".into();
        snap.router_switch = vec![router_link("eth0"), r2_link];

        let mut moved = router_link("eth0");
        moved.router_id = id(2);
        let plan = plan_update(&router_link("eth0").into(), &moved.into(), &snap).unwrap();
        let Command::UpdateConnection {
            new: Connection::RouterSwitch(new),
            ..
        } = &plan.batch.entries()[0].command
        else {
            panic!("expected a router link update");
        };
        assert_eq!(new.interface_name, None);
        assert_eq!(new.portname, "R2A");

        submit_batch(&mut snap, &plan.batch).unwrap();
        let names: Vec<_> = snap
            .links_of_router(id(2))
            .filter_map(|c| c.interface_name.as_deref())
            .collect();
        assert_eq!(names, ["eth0", "eth1"]);
    }

    #[test]
    fn plan_update_refuses_kind_changes() {
        let snap = snapshot();
        let err = plan_update(&link(4, 5, "AB").into(), &router_link("eth0").into(), &snap).unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "kind"));
    }

    #[test]
    fn plan_delete_takes_stored_mirror() {
        let mut snap = snapshot();
        snap.switch_switch = vec![link(4, 5, "AB"), link(5, 4, "stale")];
        let plan = plan_delete(&link(4, 5, "AB").into(), &snap).unwrap();
        let deleted: Vec<_> = plan.batch.commands().map(Command::target).collect();
        assert_eq!(deleted, ["switchSwitch/1/4/5", "switchSwitch/1/5/4"]);
        // The stored record, stale portname included, so undo recreates it exactly.
        assert_eq!(
            plan.batch.entries()[1].command,
            Command::DeleteConnection {
                connection: link(5, 4, "stale").into()
            }
        );
    }

    #[test]
    fn router_link_delete_respects_routes() {
        let snap = snapshot();
        let err = plan_delete(&router_link("eth0").into(), &snap).unwrap_err();
        assert!(err.to_string().contains("192.168.0.0/24"));

        let plan = plan_delete(&router_link("eth1").into(), &snap).unwrap();
        assert_eq!(plan.released_interface.as_deref(), Some("eth1"));
    }

    #[test]
    fn audit_finds_and_repairs_missing_mirror() {
        let mut snap = snapshot();
        snap.switch_switch = vec![link(4, 5, "AB"), link(5, 4, "BA"), link(5, 6, "BC")];

        let issues = audit_mirrors(&snap.switch_switch, &snap.switches);
        assert_eq!(
            issues,
            [MirrorIssue::MissingReverse {
                forward: link(5, 6, "BC"),
                expected: link(6, 5, "CB"),
            }]
        );

        let repair = repair_plan(&issues);
        submit_batch(&mut snap, &repair).unwrap();
        assert!(audit_mirrors(&snap.switch_switch, &snap.switches).is_empty());
    }

    #[test]
    fn audit_reports_stale_names_loops_and_dangling_ids() {
        let snap = snapshot();
        let links = vec![link(4, 5, "AB"), link(5, 4, "old"), link(6, 6, "CC"), link(4, 42, "A?")];
        let issues = audit_mirrors(&links, &snap.switches);
        assert_eq!(issues.len(), 3);
        assert!(matches!(&issues[0], MirrorIssue::StalePortname { expected, .. } if expected == "BA"));
        assert!(matches!(&issues[1], MirrorIssue::SelfLoop { .. }));
        assert_eq!(
            issues[2],
            MirrorIssue::DanglingSwitch {
                link: link(4, 42, "A?"),
                switch_id: id(42),
            }
        );

        let repair = repair_plan(&issues);
        let verbs: Vec<_> = repair.commands().map(Command::verb).collect();
        assert_eq!(verbs, ["update", "delete"]);
    }

    #[test]
    fn planned_pair_applies_and_deletes_cleanly() {
        let mut snap = snapshot();
        let pair = create_mirrored_pair(id(1), id(4), id(6), "A", "C", &snap.switches).unwrap();
        submit_batch(&mut snap, &pair.into_batch()).unwrap();
        assert_eq!(snap.switch_switch.len(), 2);

        let plan = plan_delete(&snap.switch_switch[1].clone().into(), &snap).unwrap();
        snap.apply(&plan.batch.entries()[0].command).unwrap();
        snap.apply(&plan.batch.entries()[1].command).unwrap();
        assert!(snap.switch_switch.is_empty());
    }
}
