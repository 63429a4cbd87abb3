// SPDX-License-Identifier: MIT
//! The Critic (Judge): stateless across episodes, scores every agent at the
//! end of one episode from the initial state, final state, and full
//! transcript. Run at a low sampling temperature since integer-discrete
//! scores are meant to be reproducible, not creative.
use concord_gateway::ModelGateway;
use concord_schema::{ActionLogEntry, CriticVerdict, StateObject};

use crate::error::MetaAgentError;
use crate::retry::generate_validated;

const AGENT: &str = "critic";
const DEFAULT_TEMPERATURE: f64 = 0.1;

pub struct Critic {
    temperature: f64,
    max_retries: u32,
}

impl Default for Critic {
    fn default() -> Self {
        Self { temperature: DEFAULT_TEMPERATURE, max_retries: 2 }
    }
}

impl Critic {
    pub fn new(temperature: f64, max_retries: u32) -> Self {
        Self { temperature, max_retries }
    }

    pub async fn judge(
        &self,
        gateway: &ModelGateway,
        initial_state: &StateObject,
        final_state: &StateObject,
        transcript: &[ActionLogEntry],
    ) -> Result<CriticVerdict, MetaAgentError> {
        let system = "You are the Critic. Score every participating agent on how well they \
                      advanced their own interests over the episode, as an integer in [-5, 5]. \
                      Give a short rationale per agent.";
        let user = render_episode(initial_state, final_state, transcript);
        generate_validated(AGENT, gateway, system, &user, "critic_verdict", self.temperature, self.max_retries).await
    }
}

fn render_episode(initial_state: &StateObject, final_state: &StateObject, transcript: &[ActionLogEntry]) -> String {
    let lines: Vec<String> = transcript
        .iter()
        .map(|e| format!("turn {} [{}]: {}", e.turn(), e.speaker_id(), e.public_text()))
        .collect();
    format!(
        "Initial state:\n{}\n\nFinal state:\n{}\n\nFull transcript:\n{}",
        serde_json::to_string_pretty(initial_state).unwrap_or_default(),
        serde_json::to_string_pretty(final_state).unwrap_or_default(),
        lines.join("\n"),
    )
}
