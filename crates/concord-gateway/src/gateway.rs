// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use concord_schema::Validate;

use crate::error::GatewayError;
use crate::types::{GenerationRequest, Message, TokenUsage};
use crate::ModelProvider;

/// The single entry point every actor and meta-agent calls through. Wraps
/// one `ModelProvider` seat; attaches a JSON schema when the caller wants a
/// structured object back, parses and validates the result, and always
/// reports the tokens spent.
pub struct ModelGateway {
    provider: Arc<dyn ModelProvider>,
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    /// Request a schema-validated structured object. `T` must derive both
    /// `schemars::JsonSchema` (so the model sees the contract) and
    /// implement `concord_schema::Validate` (so constraints schemars cannot
    /// express are still enforced). Returns `GatewayError::Validation` on a
    /// constraint failure and `GatewayError::MalformedJson` when the
    /// response does not even parse as `T`'s shape — both are the caller's
    /// cue to retry with the error folded into the next prompt.
    pub async fn generate_structured<T>(
        &self,
        system: &str,
        user: &str,
        schema_name: &str,
        temperature: f64,
    ) -> Result<(T, TokenUsage), GatewayError>
    where
        T: DeserializeOwned + JsonSchema + Validate,
    {
        let schema = serde_json::to_value(schemars::schema_for!(T))
            .map_err(|e| GatewayError::Transport(anyhow::anyhow!(e)))?;
        let req = GenerationRequest::structured(
            vec![Message::system(system), Message::user(user)],
            schema_name,
            schema,
            temperature,
        );
        let (raw, usage) = self.provider.complete(&req).await?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GatewayError::EmptyResponse { usage });
        }
        let value: T = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(source) => return Err(GatewayError::MalformedJson { raw: raw.clone(), source, usage }),
        };
        if let Err(error) = value.validate() {
            return Err(GatewayError::Validation { error, usage });
        }
        Ok((value, usage))
    }

    /// Request free text, no schema attached — used for the Provisioner's
    /// deadlock analysis and the Mutator's failing-episode summary.
    pub async fn generate_text(
        &self,
        system: &str,
        user: &str,
        temperature: f64,
    ) -> Result<(String, TokenUsage), GatewayError> {
        let req = GenerationRequest::text(vec![Message::system(system), Message::user(user)], temperature);
        self.provider.complete(&req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockProvider, ScriptedMockProvider};
    use concord_schema::ActionProposal;

    #[tokio::test]
    async fn generate_structured_parses_and_validates_mock_reply() {
        let gw = ModelGateway::new(Arc::new(MockProvider));
        let (proposal, usage): (ActionProposal, TokenUsage) = gw
            .generate_structured("you are an actor", "state: ...", "action_proposal", 0.5)
            .await
            .unwrap();
        assert!(!proposal.public_dialogue.is_empty());
        assert!(usage.total() > 0);
    }

    #[tokio::test]
    async fn generate_structured_rejects_invalid_json() {
        let gw = ModelGateway::new(Arc::new(ScriptedMockProvider::always("not json")));
        let result: Result<(ActionProposal, TokenUsage), GatewayError> =
            gw.generate_structured("sys", "usr", "action_proposal", 0.0).await;
        let err = result.unwrap_err();
        assert!(matches!(err, GatewayError::MalformedJson { .. }));
        assert!(err.usage().total() > 0);
    }

    #[tokio::test]
    async fn generate_structured_rejects_validation_failure() {
        let bad = serde_json::json!({
            "internal_monologue": "",
            "public_dialogue": "hi",
            "state_mutations": [],
            "propose_resolution": false,
            "abort_episode": false,
        })
        .to_string();
        let gw = ModelGateway::new(Arc::new(ScriptedMockProvider::always(bad)));
        let result: Result<(ActionProposal, TokenUsage), GatewayError> =
            gw.generate_structured("sys", "usr", "action_proposal", 0.0).await;
        assert!(matches!(result, Err(GatewayError::Validation { .. })));
    }

    #[tokio::test]
    async fn generate_text_bypasses_schema() {
        let gw = ModelGateway::new(Arc::new(ScriptedMockProvider::always("free text reply")));
        let (text, _) = gw.generate_text("sys", "usr", 0.2).await.unwrap();
        assert_eq!(text, "free text reply");
    }
}
