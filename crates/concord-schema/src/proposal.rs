// SPDX-License-Identifier: MIT
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Validate, ValidationError};

/// `modify` updates an existing value in place (or no-ops if an intermediate
/// node is missing); `add` creates any missing intermediate mapping nodes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MutationAction {
    Modify,
    Add,
}

/// One edit to `StateObject::variables`. `path` is a dotted key path rooted
/// inside `variables` (e.g. `"concessions.y"`, never `"variables.concessions.y"`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct StateMutation {
    pub action: MutationAction,
    pub path: String,
    pub value: Value,
}

/// An actor's single-turn output, produced by the model and validated by
/// schema before the `Environment` honors any of it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ActionProposal {
    /// Private reasoning; never shown to other actors.
    pub internal_monologue: String,
    /// Visible statement; appears in the public transcript.
    pub public_dialogue: String,
    #[serde(default)]
    pub state_mutations: Vec<StateMutation>,
    #[serde(default)]
    pub propose_resolution: bool,
    #[serde(default)]
    pub abort_episode: bool,
}

impl Validate for ActionProposal {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.internal_monologue.trim().is_empty() {
            return Err(ValidationError::new("internal_monologue must not be empty"));
        }
        if self.public_dialogue.trim().is_empty() {
            return Err(ValidationError::new("public_dialogue must not be empty"));
        }
        for m in &self.state_mutations {
            if m.path.trim().is_empty() {
                return Err(ValidationError::new("state_mutations[].path must not be empty"));
            }
            if m.path.starts_with('.') || m.path.ends_with('.') || m.path.contains("..") {
                return Err(ValidationError::new(format!(
                    "state_mutations[].path {:?} is not a well-formed dotted path",
                    m.path
                )));
            }
        }
        Ok(())
    }
}
