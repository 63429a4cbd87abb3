// SPDX-License-Identifier: MIT
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Validate, ValidationError};
use crate::log::Severity;

/// The Information Disruptor's injected external event: a headline plus
/// enough severity to let the Environment decide how hard it should land.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct InformationDisruptorOutput {
    pub headline: String,
    pub severity: Severity,
    /// Dotted `StateObject::variables` paths the headline should be allowed
    /// to justify further mutation against; advisory only, the Environment
    /// does not auto-apply anything from a disruptor turn.
    #[serde(default)]
    pub relevant_state_paths: Vec<String>,
}

impl Validate for InformationDisruptorOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.headline.trim().is_empty() {
            return Err(ValidationError::new("headline must not be empty"));
        }
        Ok(())
    }
}

/// The Tension Disruptor's adjustment to `variables.global_tension_level`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TensionDisruptorOutput {
    pub new_tension_level: u8,
    pub rationale: String,
}

impl Validate for TensionDisruptorOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=10).contains(&self.new_tension_level) {
            return Err(ValidationError::new(format!(
                "new_tension_level {} out of range [1, 10]",
                self.new_tension_level
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn information_output_requires_headline() {
        let o = InformationDisruptorOutput {
            headline: "".into(),
            severity: Severity::Low,
            relevant_state_paths: vec![],
        };
        assert!(o.validate().is_err());
    }

    #[test]
    fn tension_output_in_range_validates() {
        let o = TensionDisruptorOutput { new_tension_level: 6, rationale: "deadline looms".into() };
        assert!(o.validate().is_ok());
    }

    #[test]
    fn tension_output_out_of_range_fails() {
        let o = TensionDisruptorOutput { new_tension_level: 11, rationale: "".into() };
        assert!(o.validate().is_err());
    }
}
