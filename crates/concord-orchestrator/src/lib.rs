// SPDX-License-Identifier: MIT
pub mod error;
pub mod orchestrator;
pub mod types;

pub use error::OrchestratorError;
pub use orchestrator::{Orchestrator, OrchestratorWiring};
pub use types::{CreationOutcome, GenerationOutcome, MutationOutcome};
