// ── Connection domain types ──
//
// Links between devices of one project. Connections never own the devices
// they reference; they carry identifier references only. The `kind` tag is
// set when a record is built, so no caller ever has to guess the variant
// from which fields happen to be present.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;

/// Which pair of device kinds a connection joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ConnectionKind {
    RouterSwitch,
    SwitchSwitch,
    SwitchHost,
}

impl ConnectionKind {
    /// Whether records of this kind must exist as a mirrored pair.
    pub fn is_mirrored(self) -> bool {
        matches!(self, Self::SwitchSwitch)
    }
}

/// IP address → dotted subnet mask, in the order the operator entered them.
///
/// Order only matters for display. Build one through
/// [`build_interface_configuration`](crate::allocator::build_interface_configuration)
/// to get the address and mask checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceConfiguration(IndexMap<String, String>);

impl InterfaceConfiguration {
    pub(crate) fn from_map(map: IndexMap<String, String>) -> Self {
        Self(map)
    }

    pub fn get(&self, ip: &str) -> Option<&str> {
        self.0.get(ip).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(ip, mask)| (ip.as_str(), mask.as_str()))
    }

    /// First address entered for the interface, used as its display address.
    pub fn primary_ip(&self) -> Option<&str> {
        self.0.keys().next().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for InterfaceConfiguration {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(ip, mask)| (ip.to_owned(), mask.to_owned()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterSwitch {
    #[serde(rename = "projectid")]
    pub project_id: EntityId,
    #[serde(rename = "routerid")]
    pub router_id: EntityId,
    #[serde(rename = "switchid")]
    pub switch_id: EntityId,
    #[serde(default)]
    pub portname: String,
    /// Router interface carrying the link. Assigned by the backend, never
    /// chosen by the operator; `None` until the link is persisted.
    #[serde(default, rename = "interfacename")]
    pub interface_name: Option<String>,
    #[serde(default)]
    pub configuration: InterfaceConfiguration,
    #[serde(default)]
    pub peer: Option<String>,
}

/// One direction of a switch-to-switch link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchSwitch {
    #[serde(rename = "projectid")]
    pub project_id: EntityId,
    #[serde(rename = "switchid_src")]
    pub switch_id_src: EntityId,
    #[serde(rename = "switchid_dst")]
    pub switch_id_dst: EntityId,
    #[serde(default)]
    pub portname: String,
}

impl SwitchSwitch {
    pub fn is_self_loop(&self) -> bool {
        self.switch_id_src == self.switch_id_dst
    }

    /// Whether `other` joins the same two switches in the opposite direction.
    pub fn is_reverse_of(&self, other: &Self) -> bool {
        self.project_id == other.project_id
            && self.switch_id_src == other.switch_id_dst
            && self.switch_id_dst == other.switch_id_src
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchHost {
    #[serde(rename = "projectid")]
    pub project_id: EntityId,
    #[serde(rename = "switchid")]
    pub switch_id: EntityId,
    #[serde(rename = "hostid")]
    pub host_id: EntityId,
    #[serde(default)]
    pub portname: String,
}

/// Any connection record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Connection {
    RouterSwitch(RouterSwitch),
    SwitchSwitch(SwitchSwitch),
    SwitchHost(SwitchHost),
}

/// Identity of a connection record: its kind, project and both endpoints.
///
/// This is what the backend addresses a connection by
/// (`/project/{kind}/{project}/{a}/{b}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionKey {
    pub kind: ConnectionKind,
    pub project_id: EntityId,
    pub a: EntityId,
    pub b: EntityId,
}

impl std::fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}/{}", self.kind, self.project_id, self.a, self.b)
    }
}

impl Connection {
    pub fn kind(&self) -> ConnectionKind {
        match self {
            Self::RouterSwitch(_) => ConnectionKind::RouterSwitch,
            Self::SwitchSwitch(_) => ConnectionKind::SwitchSwitch,
            Self::SwitchHost(_) => ConnectionKind::SwitchHost,
        }
    }

    pub fn project_id(&self) -> EntityId {
        match self {
            Self::RouterSwitch(c) => c.project_id,
            Self::SwitchSwitch(c) => c.project_id,
            Self::SwitchHost(c) => c.project_id,
        }
    }

    pub fn portname(&self) -> &str {
        match self {
            Self::RouterSwitch(c) => &c.portname,
            Self::SwitchSwitch(c) => &c.portname,
            Self::SwitchHost(c) => &c.portname,
        }
    }

    pub fn key(&self) -> ConnectionKey {
        let (a, b) = match self {
            Self::RouterSwitch(c) => (c.router_id, c.switch_id),
            Self::SwitchSwitch(c) => (c.switch_id_src, c.switch_id_dst),
            Self::SwitchHost(c) => (c.switch_id, c.host_id),
        };
        ConnectionKey {
            kind: self.kind(),
            project_id: self.project_id(),
            a,
            b,
        }
    }
}

impl From<RouterSwitch> for Connection {
    fn from(c: RouterSwitch) -> Self {
        Self::RouterSwitch(c)
    }
}

impl From<SwitchSwitch> for Connection {
    fn from(c: SwitchSwitch) -> Self {
        Self::SwitchSwitch(c)
    }
}

impl From<SwitchHost> for Connection {
    fn from(c: SwitchHost) -> Self {
        Self::SwitchHost(c)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn link(src: u64, dst: u64) -> SwitchSwitch {
        SwitchSwitch {
            project_id: EntityId::new(1),
            switch_id_src: EntityId::new(src),
            switch_id_dst: EntityId::new(dst),
            portname: String::new(),
        }
    }

    #[test]
    fn reverse_detection_needs_swapped_endpoints() {
        assert!(link(1, 2).is_reverse_of(&link(2, 1)));
        assert!(!link(1, 2).is_reverse_of(&link(1, 2)));
        assert!(link(3, 3).is_self_loop());
    }

    #[test]
    fn connection_tag_is_explicit() {
        let json = r#"{"kind": "switchSwitch", "projectid": 1, "switchid_src": 4, "switchid_dst": 5, "portname": "AB"}"#;
        let conn: Connection = serde_json::from_str(json).unwrap();
        assert_eq!(conn.kind(), ConnectionKind::SwitchSwitch);
        assert_eq!(conn.key().a, EntityId::new(4));
        assert_eq!(conn.key().to_string(), "switchSwitch/1/4/5");
    }

    #[test]
    fn interface_configuration_keeps_entry_order() {
        let json = r#"{"10.0.0.9": "255.255.255.252", "10.0.0.1": "255.255.255.0"}"#;
        let cfg: InterfaceConfiguration = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.primary_ip(), Some("10.0.0.9"));
        let ips: Vec<_> = cfg.iter().map(|(ip, _)| ip).collect();
        assert_eq!(ips, ["10.0.0.9", "10.0.0.1"]);
    }

    #[test]
    fn only_switch_links_mirror() {
        assert!(ConnectionKind::SwitchSwitch.is_mirrored());
        assert!(!ConnectionKind::RouterSwitch.is_mirrored());
        assert!(!ConnectionKind::SwitchHost.is_mirrored());
    }
}
