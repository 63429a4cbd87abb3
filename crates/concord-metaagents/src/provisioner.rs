// SPDX-License-Identifier: MIT
//! The Provisioner: triggered once the Mutator has plateaued. Produces a
//! free-text deadlock analysis, then a structured `NewAgentProvisioning`
//! spec, then applies the §4.7 safety guardrails the schema itself cannot
//! express — a violation here is fatal to the creation attempt, not
//! retried the way a validation failure is.
use concord_gateway::ModelGateway;
use concord_schema::{EpochResult, NewAgentProvisioning, StateObject, Validate};

use crate::error::MetaAgentError;
use crate::retry::generate_validated;

const AGENT: &str = "provisioner";

pub struct Provisioner {
    temperature: f64,
    max_retries: u32,
}

impl Default for Provisioner {
    fn default() -> Self {
        Self { temperature: 0.8, max_retries: 2 }
    }
}

impl Provisioner {
    pub fn new(temperature: f64, max_retries: u32) -> Self {
        Self { temperature, max_retries }
    }

    pub async fn design(
        &self,
        gateway: &ModelGateway,
        initial_state: &StateObject,
        epoch_results: &[EpochResult],
        failed_archetypes: &[String],
    ) -> Result<NewAgentProvisioning, MetaAgentError> {
        let analysis_system = "You are the Provisioner. The negotiation roster has plateaued: no \
                                strategy rewrite has improved any agent's standing recently. \
                                Diagnose why in a short paragraph before proposing anything.";
        let analysis_user = format!(
            "Initial state:\n{}\n\nEpoch scores:\n{}\n\nArchetypes already tried and rejected: {}",
            serde_json::to_string_pretty(initial_state).unwrap_or_default(),
            epoch_results
                .iter()
                .map(|r| format!("{:?}", r.scores))
                .collect::<Vec<_>>()
                .join("\n"),
            if failed_archetypes.is_empty() { "none".to_string() } else { failed_archetypes.join(", ") },
        );
        let (analysis, _usage) = gateway
            .generate_text(analysis_system, &analysis_user, self.temperature)
            .await
            .map_err(|source| match source {
                concord_gateway::GatewayError::Transport(source) => MetaAgentError::Transport { agent: AGENT, source },
                other => MetaAgentError::RetryBudgetExhausted { agent: AGENT, source: other },
            })?;

        let spec_system = "You are the Provisioner. Based on your deadlock analysis, design one \
                            new participant to mount into the negotiation. It must never be able \
                            to abort the episode or propose a resolution, and must never touch \
                            more than 3 state mutations per turn.";
        let spec_user = format!("Deadlock analysis:\n{analysis}");
        let spec: NewAgentProvisioning = generate_validated(
            AGENT,
            gateway,
            spec_system,
            &spec_user,
            "new_agent_provisioning",
            self.temperature,
            self.max_retries,
        )
        .await?;

        enforce_safety_guardrails(&spec)?;
        Ok(spec)
    }
}

/// Reuses `AgentPermissions::validate` (the same guardrail check applied
/// when `concord-environment` mounts an agent from any other source) but
/// treats a failure as fatal rather than feeding it back into the retry
/// loop: a model that designs an over-privileged agent after being told
/// the contract should be rejected outright, not coached into trying again.
fn enforce_safety_guardrails(spec: &NewAgentProvisioning) -> Result<(), MetaAgentError> {
    spec.permissions.validate().map_err(|error| MetaAgentError::UnsafeAgentDesign {
        reason: format!("{}: {error}", spec.agent_id),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use concord_gateway::{ModelGateway, ScriptedMockProvider};
    use concord_schema::AgentPermissions;
    use serde_json::Map;

    use super::*;

    fn safe_spec_json() -> String {
        serde_json::json!({
            "agent_id": "mediator-1",
            "archetype": "mediator",
            "turn_injection_logic": "speak_every_3_turns",
            "system_prompt": "You mediate.",
            "core_goals": ["de-escalate"],
            "permissions": {
                "can_modify_fields": ["tension"],
                "cannot_modify_fields": [],
                "can_abort_episode": false,
                "can_propose_resolution": false,
                "max_state_mutations_per_turn": 1
            },
            "design_rationale": "plateau reached"
        })
        .to_string()
    }

    #[tokio::test]
    async fn design_returns_safe_spec() {
        let gw = ModelGateway::new(Arc::new(ScriptedMockProvider::new(vec![
            "the parties have exhausted easy concessions".to_string(),
            safe_spec_json(),
        ])));
        let provisioner = Provisioner::default();
        let state = StateObject::new(Map::new());
        let spec = provisioner.design(&gw, &state, &[], &[]).await.unwrap();
        assert_eq!(spec.agent_id, "mediator-1");
    }

    #[tokio::test]
    async fn design_rejects_unsafe_abort_permission() {
        let mut unsafe_spec: serde_json::Value = serde_json::from_str(&safe_spec_json()).unwrap();
        unsafe_spec["permissions"]["can_abort_episode"] = serde_json::Value::Bool(true);
        let gw = ModelGateway::new(Arc::new(ScriptedMockProvider::new(vec![
            "analysis".to_string(),
            unsafe_spec.to_string(),
        ])));
        let provisioner = Provisioner::default();
        let state = StateObject::new(Map::new());
        let result = provisioner.design(&gw, &state, &[], &[]).await;
        assert!(matches!(result, Err(MetaAgentError::UnsafeAgentDesign { .. })));
    }

    #[test]
    fn enforce_safety_guardrails_rejects_excess_mutation_cap() {
        let mut spec: NewAgentProvisioning = serde_json::from_str(&safe_spec_json()).unwrap();
        spec.permissions = AgentPermissions { max_state_mutations_per_turn: 4, ..spec.permissions };
        assert!(enforce_safety_guardrails(&spec).is_err());
    }
}
