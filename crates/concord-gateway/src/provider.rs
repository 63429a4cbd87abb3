// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{GenerationRequest, TokenUsage};

/// One driver capable of turning a `GenerationRequest` into raw model text.
/// Schema validation and deserialization happen one layer up, in
/// `ModelGateway`; a provider's only job is to speak the wire format.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Human-readable provider name for status display and logging.
    fn name(&self) -> &str;

    /// Model identifier as reported to users.
    fn model_name(&self) -> &str;

    /// Send a generation request and return the raw text response plus the
    /// tokens it consumed.
    async fn complete(&self, req: &GenerationRequest) -> Result<(String, TokenUsage), GatewayError>;
}
