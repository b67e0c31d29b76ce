// ── Domain model ──
//
// Inventory records as the backend exchanges them, with explicit tags on
// every polymorphic type.

pub mod connection;
pub mod device;
pub mod entity_id;
pub mod project;
pub mod router;
pub mod service;

pub use connection::{
    Connection, ConnectionKey, ConnectionKind, InterfaceConfiguration, RouterSwitch, SwitchHost,
    SwitchSwitch,
};
pub use device::{Device, DeviceKind, Host, Router, Server, Switch};
pub use entity_id::{Entity, EntityId};
pub use project::Project;
pub use router::{Route, RouterConfiguration, RouterUser};
pub use service::{AdvertiseNetwork, BgpConfig, CustomIntent, EtherType, Neighbour, Protocol};
