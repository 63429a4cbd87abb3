// SPDX-License-Identifier: MIT
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Validate, ValidationError};

/// The Capitalizer's per-turn scan of every other actor's monologue,
/// looking for an exploitable mismatch between stated private intent and
/// public dialogue.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CapitalizerOutput {
    pub overlap_detected: bool,
    /// 1 (guess) .. 10 (certain); only meaningful when `overlap_detected`.
    pub confidence_score: u8,
    /// Redacted hint surfaced to the benefiting actor; never the raw
    /// monologue text it was derived from.
    pub strategic_hint: String,
    pub rationale: String,
}

impl Validate for CapitalizerOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=10).contains(&self.confidence_score) {
            return Err(ValidationError::new(format!(
                "confidence_score {} out of range [1, 10]",
                self.confidence_score
            )));
        }
        if self.overlap_detected && self.strategic_hint.trim().is_empty() {
            return Err(ValidationError::new(
                "strategic_hint must not be empty when overlap_detected is true",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(overlap: bool, confidence: u8, hint: &str) -> CapitalizerOutput {
        CapitalizerOutput {
            overlap_detected: overlap,
            confidence_score: confidence,
            strategic_hint: hint.into(),
            rationale: "monologues converge on price floor".into(),
        }
    }

    #[test]
    fn in_range_with_hint_validates() {
        assert!(output(true, 7, "they will not go below 60").validate().is_ok());
    }

    #[test]
    fn confidence_out_of_range_fails() {
        assert!(output(true, 11, "x").validate().is_err());
    }

    #[test]
    fn overlap_without_hint_fails() {
        assert!(output(true, 5, "").validate().is_err());
    }

    #[test]
    fn no_overlap_permits_empty_hint() {
        assert!(output(false, 1, "").validate().is_ok());
    }
}
