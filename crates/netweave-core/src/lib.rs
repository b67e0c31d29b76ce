// netweave-core: Topology consistency rules between the inventory backend and its consumers (CLI).

pub mod allocator;
pub mod command;
pub mod error;
pub mod mirror;
pub mod model;
pub mod path;
pub mod service;
pub mod store;
pub mod subnet;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Backend, BatchEntry, Command, CommandBatch, Direction, SubmitFailure, submit_batch};
pub use error::{CoreError, ErrorKind};
pub use service::TopologyService;
pub use store::{Inventory, TopologySnapshot};

pub use allocator::{InterfaceEntry, RouterInterface, RouterLinkRequest};
pub use mirror::{ConnectionPlan, MirrorIssue, MirroredDelete, MirroredPair, MirroredUpdate, ReverseUpdate};
pub use path::Adjacency;
pub use subnet::SubnetMask;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Devices
    Device, DeviceKind, Entity, EntityId, Host, Project, Router, Server, Switch,
    // Connections
    Connection, ConnectionKey, ConnectionKind, InterfaceConfiguration, RouterSwitch, SwitchHost,
    SwitchSwitch,
    // Router configuration
    Route, RouterConfiguration, RouterUser,
    // Services
    AdvertiseNetwork, BgpConfig, CustomIntent, EtherType, Neighbour, Protocol,
};
