// ── Path Resolver ──
//
// Validates and proposes custom-intent chains against an adjacency snapshot.
// Two directed views are kept: `source` holds hops a path may take on its
// way through the topology, `destination` holds the final hops into a node
// that can terminate a path.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{CustomIntent, EntityId};
use crate::store::TopologySnapshot;

/// `node → (next node → edge key)`, in insertion order.
pub type HopTable = IndexMap<String, IndexMap<String, String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacency {
    #[serde(default)]
    pub source: HopTable,
    #[serde(default)]
    pub destination: HopTable,
}

impl Adjacency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source_hop(&mut self, from: &str, to: &str, key: &str) {
        insert_hop(&mut self.source, from, to, key);
    }

    pub fn add_destination_hop(&mut self, from: &str, to: &str, key: &str) {
        insert_hop(&mut self.destination, from, to, key);
    }

    pub fn has_source_hop(&self, from: &str, to: &str) -> bool {
        has_hop(&self.source, from, to)
    }

    pub fn has_destination_hop(&self, from: &str, to: &str) -> bool {
        has_hop(&self.destination, from, to)
    }

    /// Derive both views for one project from its connection records.
    ///
    /// Device names are only unique inside a project, so records and
    /// devices of other projects are ignored. Router-switch links are
    /// walkable both ways and let a switch hand the path to the router as
    /// its destination. Switch-switch records are walkable in their stored
    /// direction, so a healthy mirrored pair gives both. Switch-host links
    /// are not part of the routed topology. The edge key is the record's
    /// portname.
    pub fn from_topology(snapshot: &TopologySnapshot, project_id: EntityId) -> Self {
        let router_name = |id: EntityId| {
            snapshot
                .routers
                .get(id)
                .filter(|r| r.project_id == project_id)
                .map(|r| r.name.as_str())
        };
        let switch_name = |id: EntityId| {
            snapshot
                .switches
                .get(id)
                .filter(|s| s.project_id == project_id)
                .map(|s| s.name.as_str())
        };
        let mut adjacency = Self::new();

        for link in snapshot.router_switch.iter().filter(|l| l.project_id == project_id) {
            let (Some(router), Some(switch)) = (router_name(link.router_id), switch_name(link.switch_id)) else {
                debug!(router = %link.router_id, switch = %link.switch_id, "skipping link to unknown device");
                continue;
            };
            adjacency.add_source_hop(router, switch, &link.portname);
            adjacency.add_source_hop(switch, router, &link.portname);
            adjacency.add_destination_hop(switch, router, &link.portname);
        }

        for link in snapshot.switch_switch.iter().filter(|l| l.project_id == project_id) {
            let (Some(src), Some(dst)) = (switch_name(link.switch_id_src), switch_name(link.switch_id_dst)) else {
                debug!(src = %link.switch_id_src, dst = %link.switch_id_dst, "skipping link to unknown switch");
                continue;
            };
            adjacency.add_source_hop(src, dst, &link.portname);
        }

        debug!(project = %project_id, nodes = adjacency.source.len(), "derived adjacency");
        adjacency
    }
}

fn insert_hop(table: &mut HopTable, from: &str, to: &str, key: &str) {
    table
        .entry(from.to_owned())
        .or_default()
        .insert(to.to_owned(), key.to_owned());
}

fn has_hop(table: &HopTable, from: &str, to: &str) -> bool {
    table.get(from).is_some_and(|hops| hops.contains_key(to))
}

// ── Chain validation ──

/// Check that `chain` is a simple path through `adjacency`.
///
/// Every hop but the last must be in the `source` view; the last hop, into
/// the destination, must be in the `destination` view. Duplicates are
/// reported before any edge is looked at.
pub fn validate_chain<S: AsRef<str>>(chain: &[S], adjacency: &Adjacency) -> Result<(), CoreError> {
    if chain.len() < 2 {
        return Err(CoreError::EmptyChain { len: chain.len() });
    }

    let mut seen = HashSet::with_capacity(chain.len());
    for node in chain {
        if !seen.insert(node.as_ref()) {
            return Err(CoreError::DuplicateNode {
                node: node.as_ref().to_owned(),
            });
        }
    }

    let last_hop = chain.len() - 2;
    for (i, pair) in chain.windows(2).enumerate() {
        let (from, to) = (pair[0].as_ref(), pair[1].as_ref());
        let present = if i == last_hop {
            adjacency.has_destination_hop(from, to)
        } else {
            adjacency.has_source_hop(from, to)
        };
        if !present {
            return Err(CoreError::UnreachableHop {
                from: from.to_owned(),
                to: to.to_owned(),
            });
        }
    }

    Ok(())
}

/// Chain check plus the intent's own required fields.
pub fn validate_custom_intent(intent: &CustomIntent, adjacency: &Adjacency) -> Result<(), CoreError> {
    if intent.source_key.trim().is_empty() {
        return Err(CoreError::validation("sourcekey", "must not be empty"));
    }
    if intent.dest_key.trim().is_empty() {
        return Err(CoreError::validation("destkey", "must not be empty"));
    }
    validate_chain(&intent.chain(), adjacency)
}

// ── Candidate enumeration ──

/// Legal next nodes from the end of a chain, skipping nodes already used.
///
/// Lazy and finite. Cloning restarts from the clone point.
pub struct Candidates<'a, S> {
    hops: Option<indexmap::map::Keys<'a, String, String>>,
    chain: &'a [S],
}

impl<S> Clone for Candidates<'_, S> {
    fn clone(&self) -> Self {
        Self {
            hops: self.hops.clone(),
            chain: self.chain,
        }
    }
}

impl<'a, S: AsRef<str>> Iterator for Candidates<'a, S> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let chain = self.chain;
        self.hops
            .as_mut()?
            .map(String::as_str)
            .find(|next| !chain.iter().any(|node| node.as_ref() == *next))
    }
}

fn candidates<'a, S: AsRef<str>>(table: &'a HopTable, chain: &'a [S]) -> Candidates<'a, S> {
    let hops = chain
        .last()
        .and_then(|last| table.get(last.as_ref()))
        .map(IndexMap::keys);
    Candidates { hops, chain }
}

/// Nodes that may follow the current chain as an intermediate hop.
///
/// The first chain element is the source; it is never proposed again.
pub fn candidate_next_hops<'a, S: AsRef<str>>(
    chain: &'a [S],
    adjacency: &'a Adjacency,
) -> Candidates<'a, S> {
    candidates(&adjacency.source, chain)
}

/// Nodes that may terminate the current chain.
///
/// Looked up under the chain's last node. With no intermediates yet that
/// is the source itself, so a direct source-to-destination hop is offered
/// only when the adjacency lists one; derived adjacencies never do, since
/// their destination view is keyed by switches.
pub fn candidate_destinations<'a, S: AsRef<str>>(
    chain: &'a [S],
    adjacency: &'a Adjacency,
) -> Candidates<'a, S> {
    candidates(&adjacency.destination, chain)
}

/// Every simple path from `source` to `destination` with at most
/// `max_hops` edges, shortest first within each branch.
pub fn enumerate_paths(
    source: &str,
    destination: &str,
    adjacency: &Adjacency,
    max_hops: usize,
) -> Result<Vec<Vec<String>>, CoreError> {
    if source.trim().is_empty() {
        return Err(CoreError::validation("source", "must not be empty"));
    }
    if destination.trim().is_empty() {
        return Err(CoreError::validation("destination", "must not be empty"));
    }
    if source == destination {
        return Err(CoreError::DuplicateNode {
            node: source.to_owned(),
        });
    }

    let mut paths = Vec::new();
    let mut chain = vec![source.to_owned()];
    walk(&mut chain, destination, adjacency, max_hops, &mut paths);
    debug!(source, destination, max_hops, found = paths.len(), "enumerated paths");
    Ok(paths)
}

fn walk(
    chain: &mut Vec<String>,
    destination: &str,
    adjacency: &Adjacency,
    max_hops: usize,
    paths: &mut Vec<Vec<String>>,
) {
    // Closing the path here adds one edge: chain.len() edges in total.
    if chain.len() > max_hops {
        return;
    }
    if candidate_destinations(chain.as_slice(), adjacency).any(|node| node == destination) {
        let mut path = chain.clone();
        path.push(destination.to_owned());
        paths.push(path);
    }
    if chain.len() == max_hops {
        return;
    }

    let next: Vec<String> = candidate_next_hops(chain.as_slice(), adjacency)
        .filter(|node| *node != destination)
        .map(str::to_owned)
        .collect();
    for node in next {
        chain.push(node);
        walk(chain, destination, adjacency, max_hops, paths);
        chain.pop();
    }
}

/// Router owning the source node of an intent, when the source is a
/// router of the intent's project.
pub fn source_router(intent: &CustomIntent, snapshot: &TopologySnapshot) -> Option<EntityId> {
    snapshot
        .routers
        .iter()
        .find(|r| r.project_id == intent.project_id && r.name == intent.source)
        .and_then(|r| r.id)
}
