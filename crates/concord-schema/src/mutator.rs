// SPDX-License-Identifier: MIT
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Validate, ValidationError};

/// Sampling hyperparameters carried by an `ActorSeed` or produced fresh by a
/// `MutationVariant`. Lives here rather than in the config crate because both
/// a scenario file and a model-produced mutation variant need the exact same
/// shape, and the config crate depends on this one, not the other way round.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Hyperparameters {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub frequency_penalty: f64,
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self { temperature: default_temperature(), frequency_penalty: 0.0 }
    }
}

/// One candidate rewrite of an agent's Layer-2 mutable strategy, plus the
/// hyperparameters it should be shadow-trialed with.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MutationVariant {
    pub variant_id: String,
    pub strategy_text: String,
    #[serde(default)]
    pub hyperparameters: Hyperparameters,
}

/// The Mutator's full output for one agent: one or more candidate variants
/// to run through shadow trials (§4.6 Phase A).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MutatorProposal {
    pub agent_id: String,
    pub variants: Vec<MutationVariant>,
}

impl Validate for MutatorProposal {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.variants.is_empty() {
            return Err(ValidationError::new("mutator proposal must contain at least one variant"));
        }
        for v in &self.variants {
            if v.strategy_text.trim().is_empty() {
                return Err(ValidationError::new(format!(
                    "variant {:?} has empty strategy_text",
                    v.variant_id
                )));
            }
        }
        Ok(())
    }
}
