// SPDX-License-Identifier: MIT

//! The meta-agents: model-backed participants that observe and reshape an
//! episode or a generation from the outside, never as a negotiating party
//! in their own right. Each wraps a `concord_gateway::ModelGateway` and the
//! same validation-retry discipline (`retry::generate_validated`); callers
//! live in `concord-environment` (Capitalizer, disruptors, Critic) and
//! `concord-orchestrator` (Mutator, Provisioner, Explorer).

pub mod capitalizer;
pub mod critic;
pub mod disruptors;
pub mod error;
pub mod explorer;
pub mod mutator;
pub mod provisioner;
pub mod retry;

pub use capitalizer::Capitalizer;
pub use critic::Critic;
pub use disruptors::{InformationDisruptor, TensionDisruptor};
pub use error::MetaAgentError;
pub use explorer::Explorer;
pub use mutator::{AcceptanceVerdict, Mutator};
pub use provisioner::Provisioner;
pub use retry::generate_validated;
