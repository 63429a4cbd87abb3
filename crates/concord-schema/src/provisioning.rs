// SPDX-License-Identifier: MIT
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Validate, ValidationError};
use crate::permissions::AgentPermissions;

/// The Provisioner's output specification for a dynamically minted
/// participant. `turn_injection_logic` is free text of the form
/// `"speak_every_N_turns"`; parsing it is the Environment's job (see
/// `concord-environment::mount`), defaulting to N=1 on parse failure.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewAgentProvisioning {
    pub agent_id: String,
    pub archetype: String,
    pub turn_injection_logic: String,
    pub system_prompt: String,
    pub core_goals: Vec<String>,
    pub permissions: AgentPermissions,
    pub design_rationale: String,
}

impl Validate for NewAgentProvisioning {
    /// Only shape-level constraints schemars can't express. The permission
    /// safety guardrails (`can_abort_episode`, `can_propose_resolution`,
    /// `max_state_mutations_per_turn`) are checked separately, after a
    /// provisioning spec has already passed this validation, and are fatal
    /// rather than retried (see `concord-metaagents::Provisioner`).
    fn validate(&self) -> Result<(), ValidationError> {
        if self.agent_id.trim().is_empty() {
            return Err(ValidationError::new("agent_id must not be empty"));
        }
        if self.system_prompt.trim().is_empty() {
            return Err(ValidationError::new("system_prompt must not be empty"));
        }
        Ok(())
    }
}
