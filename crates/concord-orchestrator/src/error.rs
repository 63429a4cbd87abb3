// SPDX-License-Identifier: MIT
use thiserror::Error;

use concord_environment::EnvironmentError;
use concord_memory::MemoryError;
use concord_metaagents::MetaAgentError;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("episode failed: {0}")]
    Environment(#[from] EnvironmentError),

    #[error("meta-agent call failed: {0}")]
    MetaAgent(#[from] MetaAgentError),

    #[error("persistence error: {0}")]
    Memory(#[from] MemoryError),

    #[error("no primary actors are mounted; cannot run a generation")]
    EmptyRoster,
}
