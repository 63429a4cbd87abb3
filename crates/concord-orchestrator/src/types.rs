// SPDX-License-Identifier: MIT
//! What one `Orchestrator::run_generation` call produced, for callers (the
//! CLI's report, tests) to inspect without reaching into orchestrator state.
use concord_schema::EpochResult;
use serde::Serialize;

/// Outcome of the Creation phase (§4.9 step 3).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationOutcome {
    Accepted { agent_id: String, archetype: String },
    Rejected { archetype: String },
    Skipped,
}

/// Outcome of the Mutation phase (§4.9 step 2) for one primary actor.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub agent_id: String,
    pub accepted_variant_id: Option<String>,
}

/// Everything one generation produced.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub generation: u32,
    pub epoch_results: Vec<EpochResult>,
    pub agreement_short_circuit: bool,
    pub mutations: Vec<MutationOutcome>,
    pub creation: CreationOutcome,
    pub explorer_ran: bool,
}
