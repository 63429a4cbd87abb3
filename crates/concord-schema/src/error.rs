// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Semantic validation failure for a structured payload that *parsed*
/// correctly (serde accepted the JSON shape) but violates a constraint the
/// wire schema cannot express by itself (numeric ranges, non-empty
/// sequences, cross-field invariants).
///
/// `Environment::step` catches exactly this error variant and feeds
/// `message` back into the actor's retry context (see `concord-environment`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Implemented by every structured contract that carries constraints beyond
/// what `serde` + `schemars` encode in the JSON Schema sent to the model.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}
