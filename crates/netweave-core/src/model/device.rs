// ── Device domain types ──
//
// Wire field names follow the inventory API (`routerid`, `routername`,
// `projectid`, ...). Rust-side names are the readable ones.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::{Entity, EntityId};
use super::router::RouterConfiguration;

/// Which kind of device a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKind {
    Server,
    Router,
    Switch,
    Host,
}

/// Physical server hosting one or more projects. Not owned by a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    #[serde(rename = "serverid")]
    pub id: Option<EntityId>,
    #[serde(rename = "servername")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// User name of the root credential used to reach the server.
    #[serde(default, rename = "rootuser", skip_serializing_if = "Option::is_none")]
    pub root_user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Router {
    #[serde(rename = "routerid")]
    pub id: Option<EntityId>,
    #[serde(rename = "routername")]
    pub name: String,
    #[serde(rename = "projectid")]
    pub project_id: EntityId,
    /// Out-of-band management address.
    #[serde(default)]
    pub management: Option<String>,
    #[serde(default)]
    pub configuration: RouterConfiguration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switch {
    #[serde(rename = "switchid")]
    pub id: Option<EntityId>,
    #[serde(rename = "switchname")]
    pub name: String,
    #[serde(rename = "projectid")]
    pub project_id: EntityId,
    /// SDN controller address the switch reports to.
    #[serde(default)]
    pub controller: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    #[serde(rename = "hostid")]
    pub id: Option<EntityId>,
    #[serde(rename = "hostname")]
    pub name: String,
    #[serde(rename = "projectid")]
    pub project_id: EntityId,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub subnet: Option<String>,
    /// Router acting as this host's default gateway.
    #[serde(default, rename = "defaultgateway")]
    pub default_gateway: Option<EntityId>,
}

/// Any inventory device, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Device {
    Server(Server),
    Router(Router),
    Switch(Switch),
    Host(Host),
}

impl Device {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Server(_) => DeviceKind::Server,
            Self::Router(_) => DeviceKind::Router,
            Self::Switch(_) => DeviceKind::Switch,
            Self::Host(_) => DeviceKind::Host,
        }
    }

    /// Owning project. Servers own projects rather than belong to one.
    pub fn project_id(&self) -> Option<EntityId> {
        match self {
            Self::Server(_) => None,
            Self::Router(r) => Some(r.project_id),
            Self::Switch(s) => Some(s.project_id),
            Self::Host(h) => Some(h.project_id),
        }
    }
}

impl Entity for Device {
    fn id(&self) -> Option<EntityId> {
        match self {
            Self::Server(s) => s.id,
            Self::Router(r) => r.id,
            Self::Switch(s) => s.id,
            Self::Host(h) => h.id,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Server(s) => &s.name,
            Self::Router(r) => &r.name,
            Self::Switch(s) => &s.name,
            Self::Host(h) => &h.name,
        }
    }
}

macro_rules! impl_entity {
    ($($ty:ty),+) => {
        $(
            impl Entity for $ty {
                fn id(&self) -> Option<EntityId> {
                    self.id
                }

                fn name(&self) -> &str {
                    &self.name
                }
            }
        )+
    };
}

impl_entity!(Server, Router, Switch, Host);
