// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetaAgentError {
    /// The model never produced a schema-valid reply within the retry
    /// budget; `source` is the last attempt's failure.
    #[error("{agent} exhausted its retry budget: {source}")]
    RetryBudgetExhausted {
        agent: &'static str,
        #[source]
        source: concord_gateway::GatewayError,
    },

    /// A transport-level failure that is not subject to the validation
    /// retry loop at all (§7: "model/network errors outside validation are
    /// not caught by the retry loop").
    #[error("{agent} call failed: {source}")]
    Transport { agent: &'static str, #[source] source: anyhow::Error },

    /// A Provisioner output violated one of the permission guardrails in
    /// §4.7 and was rejected before it ever reached the Environment.
    #[error("unsafe agent design rejected: {reason}")]
    UnsafeAgentDesign { reason: String },
}
