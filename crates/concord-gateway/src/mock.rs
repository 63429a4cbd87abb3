// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::error::GatewayError;
use crate::types::{GenerationRequest, TokenUsage};
use crate::ModelProvider;

/// Deterministic mock provider for tests that need no network access. When
/// the request carries a schema it returns a minimal well-formed stand-in
/// for `ActionProposal`-shaped payloads; callers validating a different
/// schema should use `ScriptedMockProvider` instead.
#[derive(Default)]
pub struct MockProvider;

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }
    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, req: &GenerationRequest) -> Result<(String, TokenUsage), GatewayError> {
        let last_user = req
            .messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, crate::Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("[no input]");

        let body = if req.schema.is_some() {
            json!({
                "internal_monologue": format!("mock reasoning over: {last_user}"),
                "public_dialogue": format!("MOCK: {last_user}"),
                "state_mutations": [],
                "propose_resolution": false,
                "abort_episode": false,
            })
            .to_string()
        } else {
            format!("MOCK: {last_user}")
        };

        Ok((body, TokenUsage { input_tokens: 10, output_tokens: 10 }))
    }
}

/// A pre-scripted mock provider. Each call to `complete` pops the next raw
/// response string from the front of the queue, letting tests specify exact
/// model outputs (including deliberately invalid ones, to exercise retry
/// logic) without network access.
pub struct ScriptedMockProvider {
    scripts: Arc<Mutex<Vec<String>>>,
    name: String,
    /// The last `GenerationRequest` seen by this provider, for assertions.
    pub last_request: Arc<Mutex<Option<GenerationRequest>>>,
}

impl ScriptedMockProvider {
    pub fn new(scripts: Vec<String>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            name: "scripted-mock".into(),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Convenience: provider that always returns the same raw text.
    pub fn always(reply: impl Into<String>) -> Self {
        Self::new(vec![reply.into()])
    }
}

#[async_trait]
impl ModelProvider for ScriptedMockProvider {
    fn name(&self) -> &str {
        &self.name
    }
    fn model_name(&self) -> &str {
        "scripted-mock-model"
    }

    async fn complete(&self, req: &GenerationRequest) -> Result<(String, TokenUsage), GatewayError> {
        *self.last_request.lock().unwrap() = Some(req.clone());
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.is_empty() {
            return Ok(("[no more scripts]".to_string(), TokenUsage::default()));
        }
        let body = scripts.remove(0);
        Ok((body, TokenUsage { input_tokens: 5, output_tokens: 5 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    fn empty_req() -> GenerationRequest {
        GenerationRequest::text(vec![Message::user("hi")], 0.0)
    }

    #[tokio::test]
    async fn mock_echoes_last_user_message_as_text() {
        let p = MockProvider;
        let (body, usage) = p.complete(&empty_req()).await.unwrap();
        assert!(body.contains("MOCK: hi"));
        assert_eq!(usage.total(), 20);
    }

    #[tokio::test]
    async fn mock_wraps_structured_replies_as_action_proposal_shape() {
        let p = MockProvider;
        let req = GenerationRequest::structured(
            vec![Message::user("offer 80")],
            "action_proposal",
            serde_json::json!({"type": "object"}),
            0.0,
        );
        let (body, _) = p.complete(&req).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(parsed.get("internal_monologue").is_some());
    }

    #[tokio::test]
    async fn scripted_returns_each_script_once_then_falls_back() {
        let p = ScriptedMockProvider::new(vec!["first".into(), "second".into()]);
        let (a, _) = p.complete(&empty_req()).await.unwrap();
        let (b, _) = p.complete(&empty_req()).await.unwrap();
        let (c, _) = p.complete(&empty_req()).await.unwrap();
        assert_eq!(a, "first");
        assert_eq!(b, "second");
        assert_eq!(c, "[no more scripts]");
    }

    #[tokio::test]
    async fn scripted_records_last_request() {
        let p = ScriptedMockProvider::always("x");
        let _ = p.complete(&empty_req()).await.unwrap();
        assert!(p.last_request.lock().unwrap().is_some());
    }
}
