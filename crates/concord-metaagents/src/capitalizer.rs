// SPDX-License-Identifier: MIT
//! The Capitalizer: scans the last few log entries (including private
//! monologues) for an exploitable mismatch between an actor's stated
//! private intent and its public dialogue. Leak-redaction against the raw
//! monologue text is the Environment's job (§4.1 step 2); this agent only
//! produces the raw candidate output.
use concord_gateway::ModelGateway;
use concord_schema::{ActionLogEntry, CapitalizerOutput, StateObject};

use crate::error::MetaAgentError;
use crate::retry::generate_validated;

const AGENT: &str = "capitalizer";

pub struct Capitalizer {
    temperature: f64,
    max_retries: u32,
}

impl Default for Capitalizer {
    fn default() -> Self {
        Self { temperature: 0.5, max_retries: 2 }
    }
}

impl Capitalizer {
    pub fn new(temperature: f64, max_retries: u32) -> Self {
        Self { temperature, max_retries }
    }

    pub async fn analyze(
        &self,
        gateway: &ModelGateway,
        state: &StateObject,
        recent_entries: &[ActionLogEntry],
    ) -> Result<CapitalizerOutput, MetaAgentError> {
        let system = "You are the Capitalizer. Compare every actor's private monologue against \
                      its public dialogue in the recent turns and decide whether one actor's \
                      stated intent gives another an exploitable opening. Never quote monologue \
                      text verbatim in strategic_hint; paraphrase only.";
        let user = render_recent(state, recent_entries);
        generate_validated(AGENT, gateway, system, &user, "capitalizer_output", self.temperature, self.max_retries)
            .await
    }
}

fn render_recent(state: &StateObject, entries: &[ActionLogEntry]) -> String {
    let lines: Vec<String> = entries
        .iter()
        .filter_map(|e| e.monologue().map(|m| format!("{} (private): {}", e.speaker_id(), m)))
        .collect();
    format!(
        "Current state:\n{}\n\nRecent private monologues:\n{}",
        serde_json::to_string_pretty(state).unwrap_or_default(),
        lines.join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use concord_gateway::{ModelGateway, ScriptedMockProvider};
    use serde_json::Map;

    use super::*;

    #[tokio::test]
    async fn analyze_returns_parsed_output() {
        let reply = serde_json::json!({
            "overlap_detected": true,
            "confidence_score": 8,
            "strategic_hint": "they are close to their floor",
            "rationale": "monologue mentions running out of room to concede",
        })
        .to_string();
        let gw = ModelGateway::new(Arc::new(ScriptedMockProvider::always(reply)));
        let cap = Capitalizer::default();
        let state = StateObject::new(Map::new());
        let out = cap.analyze(&gw, &state, &[]).await.unwrap();
        assert!(out.overlap_detected);
        assert_eq!(out.confidence_score, 8);
    }
}
