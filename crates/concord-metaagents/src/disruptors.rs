// SPDX-License-Identifier: MIT
//! The two disruptors: Information (injects an external headline into the
//! transcript on a cadence) and Tension (rewrites the global tension level
//! from the running log and state).
use concord_gateway::ModelGateway;
use concord_schema::{ActionLogEntry, InformationDisruptorOutput, StateObject, TensionDisruptorOutput};

use crate::error::MetaAgentError;
use crate::retry::generate_validated;

pub struct InformationDisruptor {
    temperature: f64,
    max_retries: u32,
}

impl Default for InformationDisruptor {
    fn default() -> Self {
        Self { temperature: 0.8, max_retries: 2 }
    }
}

impl InformationDisruptor {
    pub fn new(temperature: f64, max_retries: u32) -> Self {
        Self { temperature, max_retries }
    }

    pub async fn observe(
        &self,
        gateway: &ModelGateway,
        recent_entries: &[ActionLogEntry],
    ) -> Result<InformationDisruptorOutput, MetaAgentError> {
        let system = "You are the Information Disruptor. Invent one plausible external event \
                      relevant to the ongoing negotiation and report it as a brief headline.";
        let lines: Vec<String> = recent_entries
            .iter()
            .map(|e| format!("turn {} [{}]: {}", e.turn(), e.speaker_id(), e.public_text()))
            .collect();
        let user = format!("Recent transcript:\n{}", lines.join("\n"));
        generate_validated(
            "information_disruptor",
            gateway,
            system,
            &user,
            "information_disruptor_output",
            self.temperature,
            self.max_retries,
        )
        .await
    }
}

pub struct TensionDisruptor {
    temperature: f64,
    max_retries: u32,
}

impl Default for TensionDisruptor {
    fn default() -> Self {
        Self { temperature: 0.3, max_retries: 2 }
    }
}

impl TensionDisruptor {
    pub fn new(temperature: f64, max_retries: u32) -> Self {
        Self { temperature, max_retries }
    }

    pub async fn assess(
        &self,
        gateway: &ModelGateway,
        state: &StateObject,
        recent_entries: &[ActionLogEntry],
    ) -> Result<TensionDisruptorOutput, MetaAgentError> {
        let system = "You are the Tension Disruptor. Read the negotiation so far and decide the \
                      new global tension level, an integer in [1, 10].";
        let lines: Vec<String> = recent_entries.iter().map(|e| e.public_text().to_string()).collect();
        let user = format!(
            "Current tension: {}\nRecent transcript:\n{}",
            state.global_tension_level(),
            lines.join("\n"),
        );
        generate_validated(
            "tension_disruptor",
            gateway,
            system,
            &user,
            "tension_disruptor_output",
            self.temperature,
            self.max_retries,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use concord_gateway::{ModelGateway, ScriptedMockProvider};
    use serde_json::Map;

    use super::*;

    #[tokio::test]
    async fn information_disruptor_returns_headline() {
        let reply = serde_json::json!({
            "headline": "Markets shift overnight",
            "severity": "high",
            "relevant_state_paths": ["concessions"],
        })
        .to_string();
        let gw = ModelGateway::new(Arc::new(ScriptedMockProvider::always(reply)));
        let disruptor = InformationDisruptor::default();
        let out = disruptor.observe(&gw, &[]).await.unwrap();
        assert_eq!(out.headline, "Markets shift overnight");
    }

    #[tokio::test]
    async fn tension_disruptor_returns_new_level() {
        let reply = serde_json::json!({"new_tension_level": 7, "rationale": "deadline looms"}).to_string();
        let gw = ModelGateway::new(Arc::new(ScriptedMockProvider::always(reply)));
        let disruptor = TensionDisruptor::default();
        let state = StateObject::new(Map::new());
        let out = disruptor.assess(&gw, &state, &[]).await.unwrap();
        assert_eq!(out.new_tension_level, 7);
    }
}
