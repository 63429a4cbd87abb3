// SPDX-License-Identifier: MIT
//! Shared validation-retry loop for every meta-agent, the same shape as
//! `concord_actor::PrimaryActor::propose` but surfaced as a `Result` rather
//! than an `Option` — a meta-agent that never produces a valid payload is a
//! hard failure for its caller (the Orchestrator), not a recoverable turn
//! penalty the way an actor's failed proposal is.
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use concord_gateway::{GatewayError, ModelGateway};
use concord_schema::Validate;

use crate::error::MetaAgentError;

pub async fn generate_validated<T>(
    agent: &'static str,
    gateway: &ModelGateway,
    system: &str,
    user: &str,
    schema_name: &str,
    temperature: f64,
    max_retries: u32,
) -> Result<T, MetaAgentError>
where
    T: DeserializeOwned + JsonSchema + Validate,
{
    let mut retry_note: Option<String> = None;
    let mut last_err: Option<GatewayError> = None;

    for _attempt in 0..=max_retries {
        let attempt_system = match &retry_note {
            Some(note) => format!("{system}\n\nYour previous response was rejected: {note}\nCorrect it and respond again."),
            None => system.to_string(),
        };
        match gateway.generate_structured::<T>(&attempt_system, user, schema_name, temperature).await {
            Ok((value, _usage)) => return Ok(value),
            Err(GatewayError::Transport(source)) => {
                return Err(MetaAgentError::Transport { agent, source });
            }
            Err(err) => {
                retry_note = Some(err.to_string());
                last_err = Some(err);
            }
        }
    }

    Err(MetaAgentError::RetryBudgetExhausted {
        agent,
        source: last_err.expect("loop runs at least once"),
    })
}
