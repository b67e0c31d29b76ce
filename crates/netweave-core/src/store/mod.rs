// ── Topology store ──

pub mod inventory;
pub mod snapshot;

pub use inventory::Inventory;
pub use snapshot::TopologySnapshot;
