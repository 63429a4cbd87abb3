// SPDX-License-Identifier: MIT
use concord_schema::{ActionProposal, NewAgentProvisioning, StateObject, TerminationReason};

/// The Environment's event surface (§6). Consumers (the orchestrator, a CLI
/// progress reporter) subscribe via the `tokio::sync::mpsc::Sender` passed
/// to `Environment::new`; a dropped receiver is not an error, a send is
/// simply best-effort.
#[derive(Debug, Clone)]
pub enum EnvironmentEvent {
    EpisodeStart,
    TurnComplete { speaker_id: String, proposal: ActionProposal },
    TurnPenalty { speaker_id: String, retries: u32 },
    /// Distinct from `TurnPenalty` per the REDESIGN FLAGS note: pruning is
    /// routine housekeeping, not a turn failure.
    ContextPruned { before: usize, after: usize },
    EpisodeComplete { final_state: StateObject, reason: TerminationReason },
    AgentCreated { spec: NewAgentProvisioning },
}
