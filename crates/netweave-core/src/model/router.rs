// ── Router configuration types ──

use serde::{Deserialize, Serialize};

/// Local accounts and static routes owned by exactly one router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfiguration {
    #[serde(default)]
    pub users: Vec<RouterUser>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterUser {
    pub username: String,
    pub password: String,
    /// IOS-style privilege level, 1 through 15.
    pub privilege: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// A static route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub prefix: String,
    /// Prefix length (`/24`, `24`) or dotted mask (`255.255.255.0`).
    pub mask: String,
    #[serde(
        default,
        rename = "exitInterface",
        skip_serializing_if = "Option::is_none"
    )]
    pub exit_interface: Option<String>,
    #[serde(default, rename = "exitGateway", skip_serializing_if = "Option::is_none")]
    pub exit_gateway: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<u32>,
}
