// SPDX-License-Identifier: MIT

//! Structured wire contracts exchanged between the environment, the primary
//! actors, and every meta-agent. Every type here is what gets handed to a
//! model as a JSON Schema and what comes back out of it; `Validate` carries
//! the constraints `schemars` cannot express on its own.

pub mod capitalizer;
pub mod disruptor;
pub mod epoch;
pub mod error;
pub mod explorer;
pub mod log;
pub mod mutator;
pub mod permissions;
pub mod proposal;
pub mod provisioning;
pub mod state;

pub use capitalizer::CapitalizerOutput;
pub use disruptor::{InformationDisruptorOutput, TensionDisruptorOutput};
pub use epoch::{CriticScore, CriticVerdict, EpochResult, TerminationReason};
pub use error::{Validate, ValidationError};
pub use explorer::{ConvergenceHypothesis, ExplorerProposal, Ingredient};
pub use log::{ActionLogEntry, Severity};
pub use mutator::{Hyperparameters, MutationVariant, MutatorProposal};
pub use permissions::AgentPermissions;
pub use proposal::{ActionProposal, MutationAction, StateMutation};
pub use provisioning::NewAgentProvisioning;
pub use state::{Injections, ScoutHypothesis, StateObject};
