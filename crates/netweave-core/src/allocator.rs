// ── Interface/Address Allocator ──
//
// Validation of router addressing: link interface configurations, static
// routes, local users, BGP peering and host addressing. Validators return
// their input unchanged on success, so running one twice is a no-op.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{
    BgpConfig, EntityId, Host, InterfaceConfiguration, Route, Router, RouterConfiguration,
    RouterSwitch, Switch,
};
use crate::store::Inventory;
use crate::subnet::SubnetMask;

const PRIVILEGE_RANGE: std::ops::RangeInclusive<u8> = 1..=15;

/// One address the operator assigns to an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceEntry {
    pub ip: String,
    /// Any mask notation the Subnet Table accepts.
    pub subnet: String,
}

impl InterfaceEntry {
    pub fn new(ip: impl Into<String>, subnet: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            subnet: subnet.into(),
        }
    }
}

/// Parses `10.0.0.1/30` or `10.0.0.1/255.255.255.252`.
impl FromStr for InterfaceEntry {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ip, subnet) = s.trim().split_once('/').ok_or_else(|| {
            CoreError::validation("interface", format!("'{s}' is not in ADDRESS/MASK form"))
        })?;
        Ok(Self::new(ip, subnet))
    }
}

fn parse_ipv4(field: &str, raw: &str) -> Result<Ipv4Addr, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::validation(field, format!("'{raw}' is not a valid IPv4 address")))
}

// ── Interface configuration ──

/// Build the `{ip → mask}` map for a router interface.
///
/// Masks are stored in dotted form whatever notation they were given in.
pub fn build_interface_configuration(
    entries: &[InterfaceEntry],
) -> Result<InterfaceConfiguration, CoreError> {
    if entries.is_empty() {
        return Err(CoreError::EmptyInterface);
    }

    let mut map = IndexMap::with_capacity(entries.len());
    for entry in entries {
        let ip: Ipv4Addr = entry.ip.trim().parse().map_err(|_| CoreError::Allocation {
            reason: format!("'{}' is not a valid IPv4 address", entry.ip),
        })?;
        let mask = SubnetMask::parse(&entry.subnet)?;
        if map.insert(ip.to_string(), mask.dotted().to_owned()).is_some() {
            return Err(CoreError::Allocation {
                reason: format!("address {ip} is assigned twice"),
            });
        }
    }

    Ok(InterfaceConfiguration::from_map(map))
}

/// Re-check a stored interface configuration.
///
/// Unlike [`build_interface_configuration`] this accepts dotted masks only,
/// since that is the stored form.
pub fn validate_interface_configuration(
    config: &InterfaceConfiguration,
) -> Result<InterfaceConfiguration, CoreError> {
    if config.is_empty() {
        return Err(CoreError::EmptyInterface);
    }
    for (ip, mask) in config.iter() {
        ip.parse::<Ipv4Addr>().map_err(|_| CoreError::Allocation {
            reason: format!("'{ip}' is not a valid IPv4 address"),
        })?;
        SubnetMask::from_dotted(mask)?;
    }
    Ok(config.clone())
}

// ── Router configuration ──

/// Check one static route against the interfaces its router has.
///
/// `exitGateway` and `metric` are free-form and pass through untouched.
pub fn validate_route<S: AsRef<str>>(route: &Route, known_interfaces: &[S]) -> Result<Route, CoreError> {
    parse_ipv4("route.prefix", &route.prefix)?;
    SubnetMask::parse(&route.mask)?;
    if let Some(exit) = &route.exit_interface {
        if !known_interfaces.iter().any(|i| i.as_ref() == exit.as_str()) {
            return Err(CoreError::validation(
                "exitInterface",
                format!("interface '{exit}' does not exist on this router"),
            ));
        }
    }
    Ok(route.clone())
}

pub fn validate_router_configuration<S: AsRef<str>>(
    config: &RouterConfiguration,
    known_interfaces: &[S],
) -> Result<RouterConfiguration, CoreError> {
    let mut seen = HashSet::with_capacity(config.users.len());
    for user in &config.users {
        if user.username.trim().is_empty() {
            return Err(CoreError::validation("username", "must not be empty"));
        }
        if !seen.insert(user.username.as_str()) {
            return Err(CoreError::validation(
                "username",
                format!("'{}' is defined twice", user.username),
            ));
        }
        if !PRIVILEGE_RANGE.contains(&user.privilege) {
            return Err(CoreError::validation(
                "privilege",
                format!(
                    "{} for user '{}' is outside 1-15",
                    user.privilege, user.username
                ),
            ));
        }
    }
    for route in &config.routes {
        validate_route(route, known_interfaces)?;
    }
    Ok(config.clone())
}

/// An interface a router has through one of its switch links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterInterface {
    pub name: String,
    pub address: Option<String>,
    pub switch_id: EntityId,
}

/// Interfaces of `router_id`, in link order. Links the backend has not
/// named yet carry no interface and are skipped.
pub fn router_interfaces<'a>(
    router_id: EntityId,
    links: impl IntoIterator<Item = &'a RouterSwitch>,
) -> Vec<RouterInterface> {
    links
        .into_iter()
        .filter(|link| link.router_id == router_id)
        .filter_map(|link| {
            Some(RouterInterface {
                name: link.interface_name.clone()?,
                address: link.configuration.primary_ip().map(str::to_owned),
                switch_id: link.switch_id,
            })
        })
        .collect()
}

// ── Router-switch links ──

/// Operator input for a router-switch link.
#[derive(Debug, Clone, Default)]
pub struct RouterLinkRequest {
    pub entries: Vec<InterfaceEntry>,
    pub peer: Option<String>,
}

/// Normalize a router-switch link.
///
/// The portname is regenerated from the device names. On edit (`existing`
/// is the stored record) the backend-assigned interface name is kept as
/// long as the router stays the same; a new or moved link has none until it
/// is persisted.
pub fn plan_router_switch(
    router: &Router,
    switch: &Switch,
    request: &RouterLinkRequest,
    existing: Option<&RouterSwitch>,
) -> Result<RouterSwitch, CoreError> {
    let router_id = router
        .id
        .ok_or_else(|| CoreError::validation("routerid", format!("router '{}' is not persisted", router.name)))?;
    let switch_id = switch
        .id
        .ok_or_else(|| CoreError::validation("switchid", format!("switch '{}' is not persisted", switch.name)))?;
    if router.project_id != switch.project_id {
        return Err(CoreError::validation(
            "switchid",
            format!(
                "router '{}' and switch '{}' belong to different projects",
                router.name, switch.name
            ),
        ));
    }
    if let Some(peer) = &request.peer {
        parse_ipv4("peer", peer)?;
    }

    let configuration = build_interface_configuration(&request.entries)?;
    let interface_name = existing
        .filter(|e| e.router_id == router_id)
        .and_then(|e| e.interface_name.clone());
    debug!(
        router = %router.name,
        switch = %switch.name,
        addresses = configuration.len(),
        interface = ?interface_name,
        "planned router-switch link"
    );

    Ok(RouterSwitch {
        project_id: router.project_id,
        router_id,
        switch_id,
        portname: format!("{}{}", router.name, switch.name),
        interface_name,
        configuration,
        peer: request.peer.clone(),
    })
}

// ── Services ──

pub fn validate_bgp_config(config: &BgpConfig) -> Result<BgpConfig, CoreError> {
    if config.as_number == 0 {
        return Err(CoreError::validation("asnumber", "AS number must be non-zero"));
    }
    if let Some(id) = &config.bgp_router_id {
        parse_ipv4("bgprouterid", id)?;
    }
    for neighbour in &config.neighbours {
        if let Some(id) = &neighbour.id {
            parse_ipv4("neighbour.id", id)?;
        }
        if neighbour.remote_as == Some(0) {
            return Err(CoreError::validation("neighbour.remoteas", "AS number must be non-zero"));
        }
    }
    for network in &config.networks {
        if let Some(ip) = &network.ip {
            parse_ipv4("network.ip", ip)?;
        }
        if let Some(mask) = &network.mask {
            SubnetMask::parse(mask)?;
        }
    }
    Ok(config.clone())
}

/// Check a host's addressing and that its gateway is a router of its own
/// project.
pub fn validate_host(host: &Host, routers: &Inventory<Router>) -> Result<Host, CoreError> {
    if let Some(ip) = &host.ip {
        parse_ipv4("ip", ip)?;
    }
    if let Some(subnet) = &host.subnet {
        SubnetMask::parse(subnet)?;
    }
    if let Some(gateway) = host.default_gateway {
        match routers.get(gateway) {
            Some(router) if router.project_id == host.project_id => {}
            Some(router) => {
                return Err(CoreError::validation(
                    "defaultgateway",
                    format!("router '{}' belongs to another project", router.name),
                ));
            }
            None => {
                return Err(CoreError::validation(
                    "defaultgateway",
                    format!("unknown router id {gateway}"),
                ));
            }
        }
    }
    Ok(host.clone())
}
