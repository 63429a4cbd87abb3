// SPDX-License-Identifier: MIT
//! The Explorer: scans a pool of candidate ingredients for one or more
//! convergence hypotheses to inject into `StateObject::scout_hypotheses`.
//! Unlike every other meta-agent, a failed scan is not fatal to its caller
//! (§4.8): the Orchestrator always gets *something* to inject, even if the
//! model never produces a valid batch within the retry budget.
use concord_gateway::ModelGateway;
use concord_schema::{ConvergenceHypothesis, ExplorerProposal, Ingredient};

use crate::retry::generate_validated;

const AGENT: &str = "explorer";

pub struct Explorer {
    temperature: f64,
    max_retries: u32,
}

impl Default for Explorer {
    fn default() -> Self {
        Self { temperature: 0.9, max_retries: 2 }
    }
}

impl Explorer {
    pub fn new(temperature: f64, max_retries: u32) -> Self {
        Self { temperature, max_retries }
    }

    /// Returns the model's scouted hypotheses, or the deterministic
    /// single-hypothesis fallback if generation never produces a valid
    /// batch. This method does not fail.
    pub async fn scan(&self, gateway: &ModelGateway, ingredients: &[Ingredient]) -> ExplorerProposal {
        let system = "You are the Explorer. Given the ingredient pool below, propose one or more \
                      convergence hypotheses for breaking the current deadlock, each grounded in \
                      at least one listed ingredient.";
        let user = format!(
            "Ingredient pool:\n{}",
            ingredients
                .iter()
                .map(|i| format!("- {} (novelty {}): {}", i.name, i.novelty_score, i.description))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        match generate_validated::<ExplorerProposal>(
            AGENT,
            gateway,
            system,
            &user,
            "explorer_proposal",
            self.temperature,
            self.max_retries,
        )
        .await
        {
            Ok(proposal) => proposal,
            Err(_) => deterministic_fallback(ingredients),
        }
    }
}

/// A single, always-valid hypothesis built with no model call at all: the
/// highest-novelty ingredient available, or a bare placeholder if the pool
/// is itself empty.
fn deterministic_fallback(ingredients: &[Ingredient]) -> ExplorerProposal {
    let ingredient = ingredients
        .iter()
        .max_by_key(|i| i.novelty_score)
        .cloned()
        .unwrap_or(Ingredient {
            name: "status quo".into(),
            description: "no ingredient pool was available; fall back to the current terms".into(),
            novelty_score: 1,
        });
    ExplorerProposal {
        hypotheses: vec![ConvergenceHypothesis {
            title: format!("fallback: lean on {}", ingredient.name),
            ingredients: vec![ingredient],
            feasibility_score: 5,
            disruption_target: "unresolved".into(),
        }],
    }
}
