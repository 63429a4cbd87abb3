// SPDX-License-Identifier: MIT
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Validate, ValidationError};

/// A created agent's authorization scope. Primary actors have no
/// `AgentPermissions` record at all and are unrestricted; only agents
/// mounted by the Provisioner carry one.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AgentPermissions {
    /// Allowed path prefixes, checked only if no deny prefix matches first.
    pub can_modify_fields: Vec<String>,
    /// Deny prefixes, checked before `can_modify_fields`.
    #[serde(default)]
    pub cannot_modify_fields: Vec<String>,
    /// Must be `false` for every created agent (enforced by `validate`).
    pub can_abort_episode: bool,
    /// Must be `false` for every created agent (enforced by `validate`).
    pub can_propose_resolution: bool,
    /// Must be `<= 3` for every created agent (enforced by `validate`).
    pub max_state_mutations_per_turn: u32,
}

impl AgentPermissions {
    /// `path` is admissible iff no deny prefix matches and some allow prefix
    /// matches (deny is checked first, per the mounting contract).
    pub fn allows(&self, path: &str) -> bool {
        if self.cannot_modify_fields.iter().any(|p| path.starts_with(p.as_str())) {
            return false;
        }
        self.can_modify_fields.iter().any(|p| path.starts_with(p.as_str()))
    }
}

impl Validate for AgentPermissions {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.can_abort_episode {
            return Err(ValidationError::new(
                "created agents must not have can_abort_episode = true",
            ));
        }
        if self.can_propose_resolution {
            return Err(ValidationError::new(
                "created agents must not have can_propose_resolution = true",
            ));
        }
        if self.max_state_mutations_per_turn > 3 {
            return Err(ValidationError::new(
                "created agents must have max_state_mutations_per_turn <= 3",
            ));
        }
        Ok(())
    }
}
