// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Tokens consumed by one gateway call. Accumulated by the `Environment`
/// across validation retries to produce one step's total usage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

impl std::ops::Add for TokenUsage {
    type Output = TokenUsage;
    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens + rhs.input_tokens,
            output_tokens: self.output_tokens + rhs.output_tokens,
        }
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        *self = *self + rhs;
    }
}

/// One call to a model, already carrying any JSON schema it must honor.
/// `schema` is `None` for free-text generation (the Provisioner's deadlock
/// analysis, the Mutator's summarization step).
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub messages: Vec<Message>,
    pub schema_name: Option<String>,
    pub schema: Option<Value>,
    pub temperature: f64,
    pub frequency_penalty: f64,
}

impl GenerationRequest {
    pub fn text(messages: Vec<Message>, temperature: f64) -> Self {
        Self { messages, schema_name: None, schema: None, temperature, frequency_penalty: 0.0 }
    }

    pub fn structured(
        messages: Vec<Message>,
        schema_name: impl Into<String>,
        schema: Value,
        temperature: f64,
    ) -> Self {
        Self {
            messages,
            schema_name: Some(schema_name.into()),
            schema: Some(schema),
            temperature,
            frequency_penalty: 0.0,
        }
    }
}
