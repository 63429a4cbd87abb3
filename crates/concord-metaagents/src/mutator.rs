// SPDX-License-Identifier: MIT
//! The Mutator: batch-mode per generation, per primary actor. Phase A asks
//! the model for candidate strategy rewrites; Phase B (successive-halving
//! shadow trials) is the Orchestrator's fan-out, not this crate's concern;
//! Phase C (the acceptance gate) is pure statistics over the trial scores
//! the Orchestrator collects, so it lives here as a plain function.
use concord_gateway::ModelGateway;
use concord_schema::{EpochResult, Hyperparameters, MutationVariant, MutatorProposal};

use crate::error::MetaAgentError;
use crate::retry::generate_validated;

const AGENT: &str = "mutator";

/// Phase C's verdict for one surviving variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceVerdict {
    pub accepted: bool,
    pub lower_confidence_bound: f64,
    pub baseline_mean: f64,
    pub p_value: f64,
}

pub struct Mutator {
    temperature: f64,
    max_retries: u32,
    plateau_counter: u32,
}

impl Default for Mutator {
    fn default() -> Self {
        Self { temperature: 0.9, max_retries: 2, plateau_counter: 0 }
    }
}

impl Mutator {
    pub fn new(temperature: f64, max_retries: u32) -> Self {
        Self { temperature, max_retries, plateau_counter: 0 }
    }

    /// Phase A: sort the agent's episodes ascending by score, take the
    /// worst 20% (ceiling, at least one), and ask the model for exactly
    /// `variant_count` candidate rewrites against that failing slice.
    pub async fn propose_variants(
        &self,
        gateway: &ModelGateway,
        agent_id: &str,
        current_strategy: &str,
        epoch_results: &[EpochResult],
        variant_count: usize,
    ) -> Result<MutatorProposal, MetaAgentError> {
        let failing = worst_episodes(epoch_results, agent_id);
        let system = format!(
            "You are the Mutator. Agent {agent_id}'s current strategy underperformed in its \
             worst episodes this generation. Propose exactly {variant_count} candidate rewrites \
             of the strategy text, each with its own sampling hyperparameters."
        );
        let user = format!(
            "Current strategy:\n{current_strategy}\n\nFailing episodes (final state + score):\n{}",
            failing
                .iter()
                .map(|r| format!(
                    "score={:?} state={}",
                    r.score_for(agent_id),
                    serde_json::to_string(&r.final_state).unwrap_or_default()
                ))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        generate_validated(AGENT, gateway, &system, &user, "mutator_proposal", self.temperature, self.max_retries)
            .await
    }

    /// Phase C: accept the best-LCB surviving variant iff its LCB clears
    /// the baseline mean by `improvement_margin` AND a two-sample
    /// Mann-Whitney U test against the baseline scores yields
    /// `p < p_value_threshold` (§4.6 Phase C, §8 invariant 7).
    pub fn evaluate_acceptance(
        &mut self,
        shadow_scores: &[f64],
        baseline_scores: &[f64],
        lambda: f64,
        improvement_margin: f64,
        p_value_threshold: f64,
    ) -> AcceptanceVerdict {
        let lcb = concord_stats::lower_confidence_bound(shadow_scores, lambda);
        let baseline_mean = concord_stats::mean(baseline_scores);
        let p_value = concord_stats::mann_whitney_u_test(shadow_scores, baseline_scores);
        let accepted = lcb > baseline_mean + improvement_margin && p_value < p_value_threshold;

        if accepted {
            self.plateau_counter = 0;
        } else {
            self.plateau_counter += 1;
        }

        AcceptanceVerdict { accepted, lower_confidence_bound: lcb, baseline_mean, p_value }
    }

    pub fn is_plateaued(&self, patience: u32) -> bool {
        self.plateau_counter >= patience
    }

    pub fn plateau_count(&self) -> u32 {
        self.plateau_counter
    }
}

/// Select the worst 20% (ceiling, minimum one) of `results` by `agent_id`'s
/// score, ascending. An episode the agent didn't participate in (no score
/// entry) sorts last and is excluded from the failing slice.
fn worst_episodes<'a>(results: &'a [EpochResult], agent_id: &str) -> Vec<&'a EpochResult> {
    let mut scored: Vec<&EpochResult> = results.iter().filter(|r| r.score_for(agent_id).is_some()).collect();
    if scored.is_empty() {
        return scored;
    }
    scored.sort_by_key(|r| r.score_for(agent_id).unwrap());
    let take = (((scored.len() as f64) * 0.2).ceil() as usize).clamp(1, scored.len());
    scored.into_iter().take(take).collect()
}

/// Build a single variant, convenience for callers constructing proposals
/// outside the model path (tests, deterministic fallbacks).
pub fn variant(id: impl Into<String>, strategy_text: impl Into<String>, hyperparameters: Hyperparameters) -> MutationVariant {
    MutationVariant { variant_id: id.into(), strategy_text: strategy_text.into(), hyperparameters }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use concord_gateway::{ModelGateway, ScriptedMockProvider};
    use concord_schema::{StateObject, TerminationReason};
    use serde_json::Map;

    use super::*;

    fn result_with_score(agent_id: &str, score: i8) -> EpochResult {
        let mut scores = HashMap::new();
        scores.insert(agent_id.to_string(), score);
        EpochResult { final_state: StateObject::new(Map::new()), scores, termination_reason: TerminationReason::Timeout }
    }

    #[tokio::test]
    async fn propose_variants_returns_parsed_proposal() {
        let reply = serde_json::json!({
            "agent_id": "buyer",
            "variants": [
                {"variant_id": "v1", "strategy_text": "open firmer", "hyperparameters": {"temperature": 0.7, "frequency_penalty": 0.0}},
            ]
        })
        .to_string();
        let gw = ModelGateway::new(Arc::new(ScriptedMockProvider::always(reply)));
        let mutator = Mutator::default();
        let results = vec![result_with_score("buyer", -3)];
        let proposal = mutator.propose_variants(&gw, "buyer", "open low", &results, 1).await.unwrap();
        assert_eq!(proposal.variants.len(), 1);
    }

    #[test]
    fn acceptance_gate_accepts_clearly_better_variant() {
        let mut mutator = Mutator::default();
        let shadow = vec![5.0, 5.0, 4.0, 5.0, 4.0];
        let baseline = vec![-1.0, -2.0, 0.0, -1.0, -1.0];
        let verdict = mutator.evaluate_acceptance(&shadow, &baseline, 1.0, 0.5, 0.05);
        assert!(verdict.accepted);
        assert_eq!(mutator.plateau_count(), 0);
    }

    #[test]
    fn acceptance_gate_rejects_indistinguishable_variant_and_increments_plateau() {
        let mut mutator = Mutator::default();
        let shadow = vec![1.0, 2.0, 1.0, 2.0, 1.0];
        let baseline = vec![1.0, 2.0, 1.0, 2.0, 1.0];
        let verdict = mutator.evaluate_acceptance(&shadow, &baseline, 1.0, 0.5, 0.05);
        assert!(!verdict.accepted);
        assert_eq!(mutator.plateau_count(), 1);
    }

    #[test]
    fn is_plateaued_once_patience_is_reached() {
        let mut mutator = Mutator::default();
        for _ in 0..3 {
            mutator.evaluate_acceptance(&[1.0, 1.0], &[1.0, 1.0], 1.0, 0.5, 0.05);
        }
        assert!(mutator.is_plateaued(3));
        assert!(!mutator.is_plateaued(4));
    }

    #[test]
    fn worst_episodes_takes_ceiling_of_twenty_percent() {
        let results: Vec<EpochResult> = (0..10).map(|i| result_with_score("buyer", i as i8)).collect();
        let worst = worst_episodes(&results, "buyer");
        assert_eq!(worst.len(), 2);
        assert_eq!(worst[0].score_for("buyer"), Some(0));
    }
}
