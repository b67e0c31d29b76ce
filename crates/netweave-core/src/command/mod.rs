// ── Command API ──
//
// All writes the caller must send to the inventory backend are expressed as
// `Command`s. Planning functions never persist anything: they hand back a
// `CommandBatch` the caller submits as one unit.

pub mod batch;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::model::{BgpConfig, Connection, CustomIntent};

pub use batch::{Backend, BatchEntry, CommandBatch, SubmitFailure, submit_batch};

/// Which side of a link a command writes.
///
/// Non-mirrored links only ever produce `Forward` entries. For switch-switch
/// links, `Forward` is the record the operator acted on and `Reverse` is
/// the counterpart regenerated from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Forward,
    Reverse,
}

/// A single write against the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Command {
    CreateConnection {
        connection: Connection,
    },
    UpdateConnection {
        old: Connection,
        new: Connection,
    },
    /// Carries the whole record so the deletion can be undone.
    DeleteConnection {
        connection: Connection,
    },
    SaveBgpConfig {
        config: BgpConfig,
    },
    SaveCustomIntent {
        intent: CustomIntent,
    },
}

impl Command {
    /// Short verb for tables and logs.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::CreateConnection { .. } => "create",
            Self::UpdateConnection { .. } => "update",
            Self::DeleteConnection { .. } => "delete",
            Self::SaveBgpConfig { .. } | Self::SaveCustomIntent { .. } => "save",
        }
    }

    /// What the command writes, e.g. `switchSwitch/1/4/5`.
    pub fn target(&self) -> String {
        match self {
            Self::CreateConnection { connection } | Self::DeleteConnection { connection } => {
                connection.key().to_string()
            }
            Self::UpdateConnection { new, .. } => new.key().to_string(),
            Self::SaveBgpConfig { config } => format!("bgp/router/{}", config.router_id),
            Self::SaveCustomIntent { intent } => format!(
                "customIntent/{}/{}->{}",
                intent.project_id, intent.source, intent.destination
            ),
        }
    }

    /// The command that undoes this one once it has been applied.
    ///
    /// Saves of service configuration overwrite the previous value, which the
    /// command does not carry, so they have no compensation.
    pub fn compensation(&self) -> Option<Command> {
        match self {
            Self::CreateConnection { connection } => Some(Self::DeleteConnection {
                connection: connection.clone(),
            }),
            Self::UpdateConnection { old, new } => Some(Self::UpdateConnection {
                old: new.clone(),
                new: old.clone(),
            }),
            Self::DeleteConnection { connection } => Some(Self::CreateConnection {
                connection: connection.clone(),
            }),
            Self::SaveBgpConfig { .. } | Self::SaveCustomIntent { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityId, SwitchHost};

    fn host_link() -> Connection {
        Connection::SwitchHost(SwitchHost {
            project_id: EntityId::new(1),
            switch_id: EntityId::new(2),
            host_id: EntityId::new(3),
            portname: "sw1h1".into(),
        })
    }

    #[test]
    fn create_is_undone_by_delete() {
        let cmd = Command::CreateConnection {
            connection: host_link(),
        };
        assert_eq!(
            cmd.compensation(),
            Some(Command::DeleteConnection {
                connection: host_link()
            })
        );
        assert_eq!(cmd.target(), "switchHost/1/2/3");
    }

    #[test]
    fn update_is_undone_by_swapping_old_and_new() {
        let old = host_link();
        let mut new = host_link();
        if let Connection::SwitchHost(ref mut c) = new {
            c.host_id = EntityId::new(9);
        }
        let cmd = Command::UpdateConnection {
            old: old.clone(),
            new: new.clone(),
        };
        assert_eq!(
            cmd.compensation(),
            Some(Command::UpdateConnection { old: new, new: old })
        );
    }
}
