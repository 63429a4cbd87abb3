// SPDX-License-Identifier: Apache-2.0
use concord_gateway::{GatewayError, ModelGateway, TokenUsage};
use concord_schema::{ActionProposal, Hyperparameters};

use crate::turn::TurnPayload;

/// A stateless turn-taker. Its identity and Layer-1 immutable core never
/// change; its Layer-2 mutable strategy and hyperparameters are swapped out
/// wholesale by `with_mutated_strategy`, never edited in place — the
/// Mutator has no API that reaches the immutable core.
#[derive(Debug, Clone)]
pub struct PrimaryActor {
    pub agent_id: String,
    immutable_core: String,
    mutable_strategy: String,
    hyperparameters: Hyperparameters,
}

impl PrimaryActor {
    pub fn new(
        agent_id: impl Into<String>,
        immutable_core: impl Into<String>,
        initial_strategy: impl Into<String>,
        hyperparameters: Hyperparameters,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            immutable_core: immutable_core.into(),
            mutable_strategy: initial_strategy.into(),
            hyperparameters,
        }
    }

    /// A fresh actor carrying the same id and immutable core, with a
    /// replaced Layer-2 strategy and sampling settings. The only way a
    /// Mutator-accepted variant becomes "the" actor going forward.
    pub fn with_mutated_strategy(&self, new_strategy: String, new_hyperparameters: Hyperparameters) -> Self {
        Self {
            agent_id: self.agent_id.clone(),
            immutable_core: self.immutable_core.clone(),
            mutable_strategy: new_strategy,
            hyperparameters: new_hyperparameters,
        }
    }

    pub fn strategy(&self) -> &str {
        &self.mutable_strategy
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    fn system_content(&self, retry_note: Option<&str>) -> String {
        let mut content = format!("{}\n\n{}", self.immutable_core, self.mutable_strategy);
        if let Some(note) = retry_note {
            content.push_str("\n\nYour previous response was rejected: ");
            content.push_str(note);
            content.push_str("\nCorrect it and respond again.");
        }
        content
    }

    /// Obtain one schema-validated `ActionProposal`, retrying up to
    /// `max_retries` additional times on validation failure with the
    /// validator's message folded into the next attempt's system content
    /// (§4.1 step 4). Returns `None` only once every attempt is exhausted;
    /// the caller (the `Environment`) is responsible for the resulting
    /// penalty bookkeeping (§4.1 step 5). Token usage is summed across every
    /// attempt, successful or not.
    pub async fn propose(
        &self,
        gateway: &ModelGateway,
        payload: &TurnPayload,
        max_retries: u32,
    ) -> (Option<ActionProposal>, TokenUsage) {
        let mut total = TokenUsage::default();
        let mut retry_note: Option<String> = None;
        let user = payload.render();

        for _attempt in 0..=max_retries {
            let system = self.system_content(retry_note.as_deref());
            match gateway
                .generate_structured::<ActionProposal>(&system, &user, "action_proposal", self.hyperparameters.temperature)
                .await
            {
                Ok((proposal, usage)) => {
                    total += usage;
                    return (Some(proposal), total);
                }
                Err(err) => {
                    total += err.usage();
                    match err {
                        GatewayError::Validation { error, .. } => retry_note = Some(error.to_string()),
                        GatewayError::MalformedJson { source, .. } => {
                            retry_note = Some(format!("response was not valid JSON: {source}"))
                        }
                        GatewayError::EmptyResponse { .. } => {
                            retry_note = Some("response was empty".to_string())
                        }
                        GatewayError::Transport(_) => break,
                    }
                }
            }
        }

        (None, total)
    }
}
