// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! A single provider implementation speaking the OpenAI-compatible
//! `/chat/completions` wire format in non-streaming, JSON-mode form. Most
//! hosted and self-hosted providers (OpenAI, Groq, OpenRouter, vLLM,
//! llama.cpp's server, Ollama's OpenAI shim) accept this exact request
//! shape, so one driver covers all of them; only the base URL, model name,
//! and auth style vary per seat.
use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::GatewayError;
use crate::types::{GenerationRequest, Role, TokenUsage};
use crate::ModelProvider;

/// How to send the API key in HTTP requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>` — standard for most providers.
    Bearer,
    /// `api-key: <key>` — Azure OpenAI style.
    ApiKeyHeader,
    /// No authentication header — local servers (Ollama, vLLM, llama.cpp).
    None,
}

pub struct HttpJsonProvider {
    driver_name: String,
    model: String,
    api_key: Option<String>,
    chat_url: String,
    auth_style: AuthStyle,
    client: reqwest::Client,
}

impl HttpJsonProvider {
    /// `base_url` ends before `/chat/completions`, e.g.
    /// `https://api.groq.com/openai/v1`.
    pub fn new(
        driver_name: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        base_url: &str,
        auth_style: AuthStyle,
    ) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            driver_name: driver_name.into(),
            model: model.into(),
            api_key,
            chat_url: format!("{base}/chat/completions"),
            auth_style,
            client: reqwest::Client::new(),
        }
    }

    fn build_body(&self, req: &GenerationRequest) -> Value {
        let messages: Vec<Value> = req
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                json!({ "role": role, "content": m.content })
            })
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": req.temperature,
            "frequency_penalty": req.frequency_penalty,
            "stream": false,
        });

        if let (Some(name), Some(schema)) = (&req.schema_name, &req.schema) {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": { "name": name, "schema": schema, "strict": true },
            });
        }

        body
    }
}

#[async_trait]
impl ModelProvider for HttpJsonProvider {
    fn name(&self) -> &str {
        &self.driver_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, req: &GenerationRequest) -> Result<(String, TokenUsage), GatewayError> {
        let body = self.build_body(req);

        let mut http_req = self.client.post(&self.chat_url).json(&body);
        http_req = match (&self.auth_style, &self.api_key) {
            (AuthStyle::Bearer, Some(key)) => http_req.bearer_auth(key),
            (AuthStyle::ApiKeyHeader, Some(key)) => http_req.header("api-key", key),
            _ => http_req,
        };

        let resp = http_req
            .send()
            .await
            .with_context(|| format!("{} request failed", self.driver_name))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Transport(anyhow::anyhow!(
                "{} returned {status}: {text}",
                self.driver_name
            )));
        }

        let parsed: Value = resp
            .json()
            .await
            .with_context(|| format!("{} returned a non-JSON body", self.driver_name))?;

        debug!(provider = %self.driver_name, model = %self.model, "completion received");

        let usage = TokenUsage {
            input_tokens: parsed["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: parsed["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        };

        let content = parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(GatewayError::EmptyResponse { usage })?;

        Ok((content, usage))
    }
}
