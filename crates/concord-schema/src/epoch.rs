// SPDX-License-Identifier: MIT
use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Validate, ValidationError};
use crate::state::StateObject;

/// Why an episode's `Environment::run_episode` loop stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    AbortEpisode,
    Agreement,
    Timeout,
    TokenLimit,
    Corrupted,
}

/// One agent's score plus the Critic's reasoning for it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CriticScore {
    pub agent_id: String,
    /// Integer in `[-5, 5]`; integer-discrete to avoid model-generated
    /// continuous arithmetic, which tends to drift.
    pub score: i8,
    pub rationale: String,
}

impl Validate for CriticScore {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(-5..=5).contains(&self.score) {
            return Err(ValidationError::new(format!(
                "score {} out of range [-5, 5]",
                self.score
            )));
        }
        Ok(())
    }
}

/// The Critic's full verdict for one episode: a score per agent.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CriticVerdict {
    pub scores: Vec<CriticScore>,
}

impl Validate for CriticVerdict {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.scores.is_empty() {
            return Err(ValidationError::new("critic verdict must score at least one agent"));
        }
        for s in &self.scores {
            s.validate()?;
        }
        Ok(())
    }
}

/// Final-state snapshot, per-agent scores, and termination reason for one
/// completed episode. Produced by the Critic; consumed by the Mutator and
/// Provisioner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpochResult {
    pub final_state: StateObject,
    pub scores: HashMap<String, i8>,
    pub termination_reason: TerminationReason,
}

impl EpochResult {
    pub fn score_for(&self, agent_id: &str) -> Option<i8> {
        self.scores.get(agent_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_in_range_validates() {
        let s = CriticScore { agent_id: "a".into(), score: 5, rationale: "good".into() };
        assert!(s.validate().is_ok());
    }

    #[test]
    fn score_out_of_range_fails() {
        let s = CriticScore { agent_id: "a".into(), score: 6, rationale: "".into() };
        assert!(s.validate().is_err());
    }

    #[test]
    fn verdict_requires_at_least_one_score() {
        let v = CriticVerdict { scores: vec![] };
        assert!(v.validate().is_err());
    }
}
