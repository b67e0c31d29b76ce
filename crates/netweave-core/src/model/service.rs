// ── Router service types ──
//
// BGP peering and custom traffic-steering intents attached to a router.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpConfig {
    #[serde(default, rename = "configid")]
    pub config_id: Option<EntityId>,
    #[serde(rename = "routerid")]
    pub router_id: EntityId,
    #[serde(rename = "asnumber")]
    pub as_number: u32,
    #[serde(default, rename = "bgprouterid", skip_serializing_if = "Option::is_none")]
    pub bgp_router_id: Option<String>,
    #[serde(default, rename = "neighbour")]
    pub neighbours: Vec<Neighbour>,
    #[serde(default, rename = "network")]
    pub networks: Vec<AdvertiseNetwork>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbour {
    /// Peer address.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "remoteas")]
    pub remote_as: Option<u32>,
    #[serde(default = "default_multihop", rename = "ebgpmultihop")]
    pub ebgp_multihop: bool,
}

fn default_multihop() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertiseNetwork {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub mask: Option<String>,
}

/// Frame type a custom intent matches on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum EtherType {
    #[serde(rename = "IPV4")]
    #[strum(serialize = "IPV4")]
    Ipv4,
    #[serde(rename = "IPV6")]
    #[strum(serialize = "IPV6")]
    Ipv6,
    #[serde(rename = "ARP")]
    #[strum(serialize = "ARP")]
    Arp,
    #[serde(rename = "BDDP")]
    #[strum(serialize = "BDDP")]
    Bddp,
    #[serde(rename = "EAPOL")]
    #[strum(serialize = "EAPOL")]
    Eapol,
    #[serde(rename = "LLDP")]
    #[strum(serialize = "LLDP")]
    Lldp,
    #[serde(rename = "MPLS_UNICAST")]
    #[strum(serialize = "MPLS_UNICAST")]
    MplsUnicast,
    #[serde(rename = "MPLS_MULTICAST")]
    #[strum(serialize = "MPLS_MULTICAST")]
    MplsMulticast,
    #[serde(rename = "QINQ")]
    #[strum(serialize = "QINQ")]
    Qinq,
    #[serde(rename = "RARP")]
    #[strum(serialize = "RARP")]
    Rarp,
    #[serde(rename = "VLAN")]
    #[strum(serialize = "VLAN")]
    Vlan,
}

/// IP protocol a custom intent matches on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum Protocol {
    #[serde(rename = "TCP")]
    #[strum(serialize = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    #[strum(serialize = "UDP")]
    Udp,
    #[serde(rename = "ICMP")]
    #[strum(serialize = "ICMP")]
    Icmp,
    #[serde(rename = "ICMP6")]
    #[strum(serialize = "ICMP6")]
    Icmp6,
}

/// An operator-chosen path a flow must follow, from a source router through
/// intermediate nodes to a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomIntent {
    #[serde(default, rename = "configid")]
    pub config_id: Option<EntityId>,
    #[serde(rename = "projectid")]
    pub project_id: EntityId,
    /// Router the intent is installed on (the source node's router).
    #[serde(default, rename = "routerid")]
    pub router_id: Option<EntityId>,
    pub source: String,
    #[serde(rename = "sourcekey")]
    pub source_key: String,
    #[serde(default)]
    pub intermediate: Vec<String>,
    pub destination: String,
    #[serde(rename = "destkey")]
    pub dest_key: String,
    pub ethertype: EtherType,
    #[serde(default)]
    pub protocol: Option<Protocol>,
}

impl CustomIntent {
    /// The full node chain `[source, ...intermediate, destination]`.
    pub fn chain(&self) -> Vec<&str> {
        std::iter::once(self.source.as_str())
            .chain(self.intermediate.iter().map(String::as_str))
            .chain(std::iter::once(self.destination.as_str()))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ethertype_wire_names() {
        let et: EtherType = serde_json::from_str(r#""MPLS_UNICAST""#).unwrap();
        assert_eq!(et, EtherType::MplsUnicast);
        assert_eq!(EtherType::Ipv4.to_string(), "IPV4");
        assert_eq!("QINQ".parse::<EtherType>().unwrap(), EtherType::Qinq);
    }

    #[test]
    fn protocol_wire_names() {
        let p: Protocol = serde_json::from_str(r#""ICMP6""#).unwrap();
        assert_eq!(p, Protocol::Icmp6);
    }

    #[test]
    fn intent_chain_spans_source_to_destination() {
        let json = r#"{
            "projectid": 1, "source": "R1", "sourcekey": "10.0.0.1",
            "intermediate": ["SW1", "SW2"], "destination": "R2",
            "destkey": "10.0.1.1", "ethertype": "IPV4", "protocol": null
        }"#;
        let intent: CustomIntent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.chain(), ["R1", "SW1", "SW2", "R2"]);
        assert!(intent.protocol.is_none());
    }

    #[test]
    fn neighbour_multihop_defaults_on() {
        let n: Neighbour = serde_json::from_str(r#"{"id": "10.0.0.2", "remoteas": 65001}"#).unwrap();
        assert!(n.ebgp_multihop);
    }
}
