// ── Project domain type ──

use serde::{Deserialize, Serialize};

use super::entity_id::{Entity, EntityId};
use crate::error::CoreError;

/// A named grouping of devices living on one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "projectid")]
    pub id: Option<EntityId>,
    #[serde(rename = "projectname")]
    pub name: String,
    /// Operator account owning the project.
    #[serde(default)]
    pub username: String,
    #[serde(rename = "serverid")]
    pub server_id: EntityId,
    /// Hostfile has been produced. Never reverts to `false`.
    #[serde(default)]
    pub generated: bool,
    #[serde(default)]
    pub ready: bool,
}

impl Project {
    /// Record that the project's hostfile has been generated.
    ///
    /// Generation happens once; a second attempt is rejected.
    pub fn mark_generated(&mut self) -> Result<(), CoreError> {
        if self.generated {
            return Err(CoreError::validation(
                "generated",
                format!("project '{}' has already been generated", self.name),
            ));
        }
        self.generated = true;
        Ok(())
    }
}

impl Entity for Project {
    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
