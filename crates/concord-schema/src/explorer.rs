// SPDX-License-Identifier: MIT
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Validate, ValidationError};

/// One candidate building-block the Explorer thinks might unlock a
/// convergence path the current roster has not tried.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Ingredient {
    pub name: String,
    pub description: String,
    /// 1 (speculative) .. 10 (near-certain payoff); used only to rank
    /// hypotheses for injection, never to gate them outright.
    pub novelty_score: u8,
}

/// The Explorer's scouted hypothesis for why agreement has stalled and what
/// might break the deadlock, surfaced into `StateObject::scout_hypotheses`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ConvergenceHypothesis {
    pub title: String,
    pub ingredients: Vec<Ingredient>,
    /// 1 (barely feasible) .. 10 (trivially feasible).
    pub feasibility_score: u8,
    pub disruption_target: String,
}

impl Validate for ConvergenceHypothesis {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.ingredients.is_empty() {
            return Err(ValidationError::new("convergence hypothesis must list at least one ingredient"));
        }
        if !(1..=10).contains(&self.feasibility_score) {
            return Err(ValidationError::new(format!(
                "feasibility_score {} out of range [1, 10]",
                self.feasibility_score
            )));
        }
        for i in &self.ingredients {
            if !(1..=10).contains(&i.novelty_score) {
                return Err(ValidationError::new(format!(
                    "ingredient {:?} novelty_score {} out of range [1, 10]",
                    i.name, i.novelty_score
                )));
            }
        }
        Ok(())
    }
}

/// The Explorer's full scan output: a batch of hypotheses produced in one
/// structured-generation call rather than one call per hypothesis.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ExplorerProposal {
    pub hypotheses: Vec<ConvergenceHypothesis>,
}

impl Validate for ExplorerProposal {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.hypotheses.is_empty() {
            return Err(ValidationError::new("explorer proposal must contain at least one hypothesis"));
        }
        for h in &self.hypotheses {
            h.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hypothesis() -> ConvergenceHypothesis {
        ConvergenceHypothesis {
            title: "staged buyback".into(),
            ingredients: vec![Ingredient {
                name: "deferred payment schedule".into(),
                description: "split the concession across two fiscal years".into(),
                novelty_score: 6,
            }],
            feasibility_score: 7,
            disruption_target: "concessions.schedule".into(),
        }
    }

    #[test]
    fn well_formed_hypothesis_validates() {
        assert!(hypothesis().validate().is_ok());
    }

    #[test]
    fn empty_ingredients_fails() {
        let mut h = hypothesis();
        h.ingredients.clear();
        assert!(h.validate().is_err());
    }

    #[test]
    fn feasibility_out_of_range_fails() {
        let mut h = hypothesis();
        h.feasibility_score = 0;
        assert!(h.validate().is_err());
    }

    #[test]
    fn proposal_requires_at_least_one_hypothesis() {
        let p = ExplorerProposal { hypotheses: vec![] };
        assert!(p.validate().is_err());
    }

    #[test]
    fn proposal_with_hypothesis_validates() {
        let p = ExplorerProposal { hypotheses: vec![hypothesis()] };
        assert!(p.validate().is_ok());
    }
}
