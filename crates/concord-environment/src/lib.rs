// SPDX-License-Identifier: MIT

//! The execution-loop state machine: turn sequencing, permission
//! enforcement, mutation application, termination detection, and the
//! mounting contract for agents minted mid-episode by the Provisioner.

pub mod environment;
pub mod error;
pub mod events;
pub mod mount;
pub mod mutation;
pub mod redact;

pub use environment::{Environment, EnvironmentWiring, EpisodeOutcome};
pub use error::EnvironmentError;
pub use events::EnvironmentEvent;
