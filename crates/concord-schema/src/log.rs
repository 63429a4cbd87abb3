// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

use crate::proposal::StateMutation;

/// Severity a disruptor attaches to an information event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, schemars::JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One turn's audit record. Actor turns carry the full proposal contents;
/// disruptor turns carry a headline/severity instead. Append-only within an
/// episode; pruned in-place (oldest-first) by context management.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionLogEntry {
    Actor {
        turn: u32,
        speaker_id: String,
        internal_monologue: String,
        public_dialogue: String,
        state_mutations: Vec<StateMutation>,
        propose_resolution: bool,
        abort_episode: bool,
    },
    Disruptor {
        turn: u32,
        speaker_id: String,
        headline: String,
        severity: Severity,
    },
}

impl ActionLogEntry {
    pub fn turn(&self) -> u32 {
        match self {
            ActionLogEntry::Actor { turn, .. } => *turn,
            ActionLogEntry::Disruptor { turn, .. } => *turn,
        }
    }

    pub fn speaker_id(&self) -> &str {
        match self {
            ActionLogEntry::Actor { speaker_id, .. } => speaker_id,
            ActionLogEntry::Disruptor { speaker_id, .. } => speaker_id,
        }
    }

    /// Text shown to subsequent actors building their transcript view:
    /// dialogue for actors, headline for information-disruptor entries.
    pub fn public_text(&self) -> &str {
        match self {
            ActionLogEntry::Actor { public_dialogue, .. } => public_dialogue,
            ActionLogEntry::Disruptor { headline, .. } => headline,
        }
    }

    /// Private monologue text, if any — only actor entries carry one. Used
    /// by the Capitalizer leak-detection scan, which must see every other
    /// actor's monologue, never its own.
    pub fn monologue(&self) -> Option<&str> {
        match self {
            ActionLogEntry::Actor { internal_monologue, .. } => Some(internal_monologue),
            ActionLogEntry::Disruptor { .. } => None,
        }
    }
}
