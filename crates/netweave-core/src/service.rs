// ── Topology Consistency Service ──
//
// One entry point over a borrowed snapshot. Every method is a pure check or
// plan; nothing here writes. Callers persist the returned batches through a
// `Backend` and build a fresh service from the re-fetched snapshot.

use std::borrow::Cow;

use tracing::debug;

use crate::allocator::{
    self, RouterInterface, RouterLinkRequest, plan_router_switch, router_interfaces,
};
use crate::command::{Command, CommandBatch};
use crate::error::CoreError;
use crate::mirror::{self, ConnectionPlan, MirrorIssue};
use crate::model::{
    BgpConfig, Connection, ConnectionKey, CustomIntent, EntityId, Host, Router,
    RouterConfiguration, Switch,
};
use crate::path::{self, Adjacency};
use crate::store::TopologySnapshot;

pub struct TopologyService<'a> {
    snapshot: &'a TopologySnapshot,
}

impl<'a> TopologyService<'a> {
    pub fn new(snapshot: &'a TopologySnapshot) -> Self {
        debug!(
            routers = snapshot.routers.len(),
            switches = snapshot.switches.len(),
            stored_adjacencies = snapshot.adjacency.len(),
            "topology service ready"
        );
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &TopologySnapshot {
        self.snapshot
    }

    /// Adjacency of one project: the snapshot's stored one when present,
    /// otherwise derived from that project's connection records.
    pub fn adjacency(&self, project_id: EntityId) -> Cow<'a, Adjacency> {
        match self.snapshot.adjacency.get(&project_id) {
            Some(adjacency) => Cow::Borrowed(adjacency),
            None => Cow::Owned(Adjacency::from_topology(self.snapshot, project_id)),
        }
    }

    /// The project owning the router or switch named `node`.
    ///
    /// Fails when no device has that name, or when it is taken in more
    /// than one project.
    pub fn project_of(&self, node: &str) -> Result<EntityId, CoreError> {
        let mut projects: Vec<EntityId> = self
            .snapshot
            .routers
            .iter()
            .filter(|r| r.name == node)
            .map(|r| r.project_id)
            .chain(
                self.snapshot
                    .switches
                    .iter()
                    .filter(|s| s.name == node)
                    .map(|s| s.project_id),
            )
            .collect();
        projects.sort_unstable();
        projects.dedup();

        match projects.as_slice() {
            [project] => Ok(*project),
            [] => Err(CoreError::validation(
                "node",
                format!("no router or switch named '{node}'"),
            )),
            many => Err(CoreError::validation(
                "project",
                format!(
                    "'{node}' exists in projects {}; select one",
                    many.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
                ),
            )),
        }
    }

    // ── Lookups ──

    pub fn router(&self, identifier: &str) -> Result<&'a Router, CoreError> {
        self.snapshot
            .routers
            .resolve(identifier)
            .ok_or_else(|| CoreError::validation("router", format!("no router '{identifier}'")))
    }

    pub fn switch(&self, identifier: &str) -> Result<&'a Switch, CoreError> {
        self.snapshot
            .switches
            .resolve(identifier)
            .ok_or_else(|| CoreError::validation("switch", format!("no switch '{identifier}'")))
    }

    pub fn host(&self, identifier: &str) -> Result<&'a Host, CoreError> {
        self.snapshot
            .hosts
            .resolve(identifier)
            .ok_or_else(|| CoreError::validation("host", format!("no host '{identifier}'")))
    }

    pub fn connection(&self, key: &ConnectionKey) -> Result<Connection, CoreError> {
        self.snapshot
            .find_connection(key)
            .ok_or_else(|| CoreError::validation("connection", format!("{key} does not exist")))
    }

    // ── Connections ──

    pub fn plan_create(&self, connection: &Connection) -> Result<ConnectionPlan, CoreError> {
        mirror::plan_create(connection, self.snapshot)
    }

    pub fn plan_update(&self, old: &Connection, new: &Connection) -> Result<ConnectionPlan, CoreError> {
        mirror::plan_update(old, new, self.snapshot)
    }

    pub fn plan_delete(&self, key: &ConnectionKey) -> Result<ConnectionPlan, CoreError> {
        mirror::plan_delete(&self.connection(key)?, self.snapshot)
    }

    pub fn audit(&self) -> Vec<MirrorIssue> {
        mirror::audit_mirrors(&self.snapshot.switch_switch, &self.snapshot.switches)
    }

    // ── Routers ──

    pub fn router_interfaces(&self, router_id: EntityId) -> Vec<RouterInterface> {
        router_interfaces(router_id, &self.snapshot.router_switch)
    }

    /// Re-check a stored router's users and routes against the interfaces
    /// it currently has.
    pub fn check_router(&self, router: &Router) -> Result<RouterConfiguration, CoreError> {
        let Some(router_id) = router.id else {
            return Err(CoreError::validation("routerid", "router is not persisted"));
        };
        let interfaces: Vec<String> = self
            .router_interfaces(router_id)
            .into_iter()
            .map(|i| i.name)
            .collect();
        allocator::validate_router_configuration(&router.configuration, &interfaces)
    }

    /// Plan a router-switch link from operator input: an update when the
    /// two devices are already linked, a create otherwise.
    pub fn plan_router_link(
        &self,
        router: &Router,
        switch: &Switch,
        request: &RouterLinkRequest,
    ) -> Result<ConnectionPlan, CoreError> {
        let existing = self
            .snapshot
            .router_switch
            .iter()
            .find(|l| Some(l.router_id) == router.id && Some(l.switch_id) == switch.id);
        let link = plan_router_switch(router, switch, request, existing)?;
        match existing {
            Some(stored) => self.plan_update(&stored.clone().into(), &link.into()),
            None => self.plan_create(&link.into()),
        }
    }

    pub fn check_host(&self, host: &Host) -> Result<Host, CoreError> {
        allocator::validate_host(host, &self.snapshot.routers)
    }

    // ── Services ──

    pub fn plan_bgp(&self, config: &BgpConfig) -> Result<CommandBatch, CoreError> {
        if !self.snapshot.routers.contains(config.router_id) {
            return Err(CoreError::validation(
                "routerid",
                format!("unknown router id {}", config.router_id),
            ));
        }
        let config = allocator::validate_bgp_config(config)?;
        Ok(CommandBatch::single(Command::SaveBgpConfig { config }))
    }

    /// Checked against the adjacency of the intent's own project.
    pub fn check_intent(&self, intent: &CustomIntent) -> Result<(), CoreError> {
        path::validate_custom_intent(intent, &self.adjacency(intent.project_id))
    }

    /// Validate an intent and attach it to its source router.
    pub fn plan_intent(&self, intent: &CustomIntent) -> Result<CommandBatch, CoreError> {
        self.check_intent(intent)?;
        let mut intent = intent.clone();
        if intent.router_id.is_none() {
            intent.router_id = path::source_router(&intent, self.snapshot);
        }
        Ok(CommandBatch::single(Command::SaveCustomIntent { intent }))
    }

    // ── Paths ──

    pub fn check_chain<S: AsRef<str>>(&self, project_id: EntityId, chain: &[S]) -> Result<(), CoreError> {
        path::validate_chain(chain, &self.adjacency(project_id))
    }

    pub fn next_hops<S: AsRef<str>>(&self, project_id: EntityId, chain: &[S]) -> Vec<String> {
        let adjacency = self.adjacency(project_id);
        path::candidate_next_hops(chain, &adjacency)
            .map(str::to_owned)
            .collect()
    }

    pub fn destinations<S: AsRef<str>>(&self, project_id: EntityId, chain: &[S]) -> Vec<String> {
        let adjacency = self.adjacency(project_id);
        path::candidate_destinations(chain, &adjacency)
            .map(str::to_owned)
            .collect()
    }

    pub fn paths(
        &self,
        project_id: EntityId,
        source: &str,
        destination: &str,
        max_hops: usize,
    ) -> Result<Vec<Vec<String>>, CoreError> {
        path::enumerate_paths(source, destination, &self.adjacency(project_id), max_hops)
    }
}
