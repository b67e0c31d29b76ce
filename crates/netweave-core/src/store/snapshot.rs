// ── Topology snapshot ──
//
// A point-in-time copy of every record the consistency rules look at.
// Core functions read it; only `Backend::apply` writes it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::inventory::Inventory;
use crate::command::{Backend, Command};
use crate::error::CoreError;
use crate::model::{
    BgpConfig, Connection, ConnectionKey, ConnectionKind, CustomIntent, EntityId, Host, Project,
    Router, RouterSwitch, Server, Switch, SwitchHost, SwitchSwitch,
};
use crate::path::Adjacency;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologySnapshot {
    #[serde(default)]
    pub servers: Inventory<Server>,
    #[serde(default)]
    pub projects: Inventory<Project>,
    #[serde(default)]
    pub routers: Inventory<Router>,
    #[serde(default)]
    pub switches: Inventory<Switch>,
    #[serde(default)]
    pub hosts: Inventory<Host>,
    #[serde(default)]
    pub router_switch: Vec<RouterSwitch>,
    #[serde(default)]
    pub switch_switch: Vec<SwitchSwitch>,
    #[serde(default)]
    pub switch_host: Vec<SwitchHost>,
    #[serde(default)]
    pub bgp: Vec<BgpConfig>,
    #[serde(default)]
    pub custom_intents: Vec<CustomIntent>,
    /// Adjacency per project as computed by the backend. A project without
    /// an entry has its adjacency derived from its connection records.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub adjacency: IndexMap<EntityId, Adjacency>,
}

impl TopologySnapshot {
    /// Every connection record, tagged.
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.router_switch
            .iter()
            .cloned()
            .map(Connection::from)
            .chain(self.switch_switch.iter().cloned().map(Connection::from))
            .chain(self.switch_host.iter().cloned().map(Connection::from))
    }

    pub fn find_connection(&self, key: &ConnectionKey) -> Option<Connection> {
        match key.kind {
            ConnectionKind::RouterSwitch => self
                .router_switch
                .iter()
                .find(|c| c.project_id == key.project_id && c.router_id == key.a && c.switch_id == key.b)
                .cloned()
                .map(Connection::from),
            ConnectionKind::SwitchSwitch => self
                .switch_switch
                .iter()
                .find(|c| {
                    c.project_id == key.project_id
                        && c.switch_id_src == key.a
                        && c.switch_id_dst == key.b
                })
                .cloned()
                .map(Connection::from),
            ConnectionKind::SwitchHost => self
                .switch_host
                .iter()
                .find(|c| c.project_id == key.project_id && c.switch_id == key.a && c.host_id == key.b)
                .cloned()
                .map(Connection::from),
        }
    }

    pub fn links_of_router(&self, router_id: EntityId) -> impl Iterator<Item = &RouterSwitch> {
        self.router_switch
            .iter()
            .filter(move |c| c.router_id == router_id)
    }

    pub fn bgp_of_router(&self, router_id: EntityId) -> Option<&BgpConfig> {
        self.bgp.iter().find(|b| b.router_id == router_id)
    }

    /// The part of the snapshot that belongs to one project.
    ///
    /// Servers are shared and kept whole.
    pub fn for_project(&self, project_id: EntityId) -> Self {
        let in_project = |p: EntityId| p == project_id;
        Self {
            servers: self.servers.clone(),
            projects: self
                .projects
                .iter()
                .filter(|p| p.id == Some(project_id))
                .cloned()
                .collect(),
            routers: self
                .routers
                .iter()
                .filter(|r| in_project(r.project_id))
                .cloned()
                .collect(),
            switches: self
                .switches
                .iter()
                .filter(|s| in_project(s.project_id))
                .cloned()
                .collect(),
            hosts: self
                .hosts
                .iter()
                .filter(|h| in_project(h.project_id))
                .cloned()
                .collect(),
            router_switch: filter_cloned(&self.router_switch, |c| in_project(c.project_id)),
            switch_switch: filter_cloned(&self.switch_switch, |c| in_project(c.project_id)),
            switch_host: filter_cloned(&self.switch_host, |c| in_project(c.project_id)),
            bgp: filter_cloned(&self.bgp, |b| {
                self.routers
                    .get(b.router_id)
                    .is_some_and(|r| in_project(r.project_id))
            }),
            custom_intents: filter_cloned(&self.custom_intents, |i| in_project(i.project_id)),
            adjacency: self
                .adjacency
                .get(&project_id)
                .map(|adjacency| (project_id, adjacency.clone()))
                .into_iter()
                .collect(),
        }
    }

    fn next_interface_name(&self, router_id: EntityId) -> String {
        let used: Vec<&str> = self
            .links_of_router(router_id)
            .filter_map(|c| c.interface_name.as_deref())
            .collect();
        (0..)
            .map(|n| format!("eth{n}"))
            .find(|name| !used.contains(&name.as_str()))
            .unwrap_or_default()
    }

    fn insert_connection(&mut self, connection: &Connection) -> Result<(), CoreError> {
        if self.find_connection(&connection.key()).is_some() {
            return Err(backend_error(format!("{} already exists", connection.key())));
        }
        match connection.clone() {
            Connection::RouterSwitch(mut c) => {
                if c.interface_name.is_none() {
                    c.interface_name = Some(self.next_interface_name(c.router_id));
                }
                self.router_switch.push(c);
            }
            Connection::SwitchSwitch(c) => self.switch_switch.push(c),
            Connection::SwitchHost(c) => self.switch_host.push(c),
        }
        Ok(())
    }

    fn remove_connection(&mut self, key: &ConnectionKey) -> Result<Connection, CoreError> {
        let removed = match key.kind {
            ConnectionKind::RouterSwitch => take_first(&mut self.router_switch, |c| {
                c.project_id == key.project_id && c.router_id == key.a && c.switch_id == key.b
            })
            .map(Connection::from),
            ConnectionKind::SwitchSwitch => take_first(&mut self.switch_switch, |c| {
                c.project_id == key.project_id
                    && c.switch_id_src == key.a
                    && c.switch_id_dst == key.b
            })
            .map(Connection::from),
            ConnectionKind::SwitchHost => take_first(&mut self.switch_host, |c| {
                c.project_id == key.project_id && c.switch_id == key.a && c.host_id == key.b
            })
            .map(Connection::from),
        };
        removed.ok_or_else(|| backend_error(format!("{key} not found")))
    }
}

fn filter_cloned<T: Clone>(items: &[T], keep: impl Fn(&T) -> bool) -> Vec<T> {
    items.iter().filter(|item| keep(item)).cloned().collect()
}

fn take_first<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> Option<T> {
    let pos = items.iter().position(matches)?;
    Some(items.remove(pos))
}

fn backend_error(message: String) -> CoreError {
    CoreError::Backend { message }
}

/// Applies commands in memory, so a snapshot file can stand in for the
/// inventory API.
impl Backend for TopologySnapshot {
    fn apply(&mut self, command: &Command) -> Result<(), CoreError> {
        debug!(op = command.verb(), target = %command.target(), "applying to snapshot");
        match command {
            Command::CreateConnection { connection } => self.insert_connection(connection)?,
            Command::UpdateConnection { old, new } => {
                let previous = self.remove_connection(&old.key())?;
                if let Err(e) = self.insert_connection(new) {
                    self.insert_connection(&previous)?;
                    return Err(e);
                }
            }
            Command::DeleteConnection { connection } => {
                self.remove_connection(&connection.key())?;
            }
            Command::SaveBgpConfig { config } => {
                match self.bgp.iter().position(|b| b.router_id == config.router_id) {
                    Some(pos) => self.bgp[pos] = config.clone(),
                    None => self.bgp.push(config.clone()),
                }
            }
            Command::SaveCustomIntent { intent } => {
                let pos = intent.config_id.and_then(|id| {
                    self.custom_intents
                        .iter()
                        .position(|i| i.config_id == Some(id))
                });
                match pos {
                    Some(pos) => self.custom_intents[pos] = intent.clone(),
                    None => self.custom_intents.push(intent.clone()),
                }
            }
        }
        // A project's stored adjacency is stale once its links change.
        let touched = match command {
            Command::CreateConnection { connection } | Command::DeleteConnection { connection } => {
                vec![connection.project_id()]
            }
            Command::UpdateConnection { old, new } => vec![old.project_id(), new.project_id()],
            Command::SaveBgpConfig { .. } | Command::SaveCustomIntent { .. } => Vec::new(),
        };
        for project in touched {
            self.adjacency.shift_remove(&project);
        }
        Ok(())
    }
}
