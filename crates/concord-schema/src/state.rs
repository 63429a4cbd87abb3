// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single scouted hypothesis injected by the Explorer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoutHypothesis {
    pub title: String,
    /// 1 (barely feasible) .. 10 (trivially feasible).
    pub feasibility_score: u8,
    pub disruption_target: String,
}

/// Optional cross-turn injections surfaced to actors, currently limited to
/// the Capitalizer's redacted strategic hint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Injections {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capitalizer_hint: Option<String>,
}

/// The living document agents negotiate over.
///
/// Owned exclusively by one `Environment` for the lifetime of one episode;
/// created by deep-copying a scenario's initial state and destroyed when the
/// episode returns (only a snapshot of its final value escapes).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateObject {
    pub turn_number: u32,
    pub current_speaker_id: String,
    pub is_terminal: bool,
    /// Open, domain-specific payload. Mutations traverse dotted paths rooted
    /// here (`concessions.y`, never `variables.concessions.y`).
    pub variables: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injections: Option<Injections>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scout_hypotheses: Option<Vec<ScoutHypothesis>>,
}

impl StateObject {
    /// Construct the episode's initial state: turn zero, nobody speaking yet,
    /// running.
    pub fn new(variables: Map<String, Value>) -> Self {
        Self {
            turn_number: 0,
            current_speaker_id: String::new(),
            is_terminal: false,
            variables,
            injections: None,
            scout_hypotheses: None,
        }
    }

    /// Deep-copy. `serde_json::Value` is already a deep, owned tree, so a
    /// `Clone` is a deep copy — called out explicitly at every site that
    /// must not alias episode state (new `Environment`, applying a
    /// mutation's value) per the deep-copy discipline in the design notes.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Read `variables.global_tension_level` as an integer, defaulting to 1
    /// (minimum tension) when absent or not a number.
    pub fn global_tension_level(&self) -> u8 {
        self.variables
            .get("global_tension_level")
            .and_then(Value::as_u64)
            .map(|v| v as u8)
            .unwrap_or(1)
    }

    pub fn set_global_tension_level(&mut self, level: u8) {
        self.variables
            .insert("global_tension_level".to_string(), Value::from(level));
    }

    pub fn capitalizer_hint(&self) -> Option<&str> {
        self.injections.as_ref().and_then(|i| i.capitalizer_hint.as_deref())
    }

    pub fn set_capitalizer_hint(&mut self, hint: String) {
        self.injections.get_or_insert_with(Injections::default).capitalizer_hint = Some(hint);
    }
}
