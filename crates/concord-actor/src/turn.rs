// SPDX-License-Identifier: Apache-2.0
use serde_json::{Map, Value};

/// Layer-3 of the three-layer prompt: the current turn's view of the world,
/// assembled by the `Environment` (§4.1 step 3) and rendered as the actor's
/// user message.
#[derive(Debug, Clone)]
pub struct TurnPayload {
    pub turn_number: u32,
    pub max_turns: u32,
    pub current_speaker_id: String,
    /// Dialogue for actor entries, headline for information-disruptor
    /// entries, in chronological order, already pruned to the context
    /// window the Environment currently exposes.
    pub public_transcript: Vec<String>,
    pub variables: Map<String, Value>,
    pub global_tension_level: u8,
    pub capitalizer_hint: Option<String>,
}

impl TurnPayload {
    pub fn render(&self) -> String {
        let transcript = if self.public_transcript.is_empty() {
            "(no prior turns)".to_string()
        } else {
            self.public_transcript.join("\n")
        };

        let variables = serde_json::to_string_pretty(&self.variables).unwrap_or_default();

        let mut out = format!(
            "Turn {turn} of {max}. You are speaking now as {speaker}.\n\n\
             Transcript so far:\n{transcript}\n\n\
             Current state variables:\n{variables}\n\n\
             Global tension level: {tension}",
            turn = self.turn_number,
            max = self.max_turns,
            speaker = self.current_speaker_id,
            tension = self.global_tension_level,
        );

        if let Some(hint) = &self.capitalizer_hint {
            out.push_str(&format!("\n\nStrategic hint: {hint}"));
        }

        out
    }
}
