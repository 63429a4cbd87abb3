// SPDX-License-Identifier: MIT
use thiserror::Error;

/// The two failure modes an `Environment` surfaces to its caller rather
/// than absorbing locally. Every other condition in §7's taxonomy
/// (`ValidationFailure`, `ForcedConcession`, `EpisodeCorrupted`,
/// `CostLimitExceeded`) is recovered locally and shows up as a
/// `TerminationReason` or a `turn:penalty` event instead of an `Err`.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("{speaker_id} attempted to mutate {path:?}, which it has no permission to touch")]
    PermissionViolation { speaker_id: String, path: String },

    #[error("cannot mount a new agent: {count} created agents already active (max {max})")]
    MaxAgentsExceeded { count: u32, max: u32 },

    /// Defense in depth for invariant 5: `mount_agent` re-checks the same
    /// guardrails `concord-metaagents::Provisioner` already applied, since a
    /// spec can reach `mount_agent` from a config/resumed source that never
    /// passed through a Provisioner at all.
    #[error("refusing to mount {agent_id}: {reason}")]
    UnsafeAgentDesign { agent_id: String, reason: String },
}
