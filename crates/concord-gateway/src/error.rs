// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

use concord_schema::ValidationError;

use crate::types::TokenUsage;

/// Every failure mode a `ModelGateway` call can produce. Transport errors
/// carry no usage (the call never completed); the others carry whatever
/// usage the provider reported before the failure was detected, since the
/// Environment's per-step token accounting (§4.1 step 11) sums usage across
/// every validation retry, including the failed ones.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("provider returned an empty response")]
    EmptyResponse { usage: TokenUsage },
    #[error("response was not valid JSON: {source}\nraw response: {raw}")]
    MalformedJson {
        raw: String,
        #[source]
        source: serde_json::Error,
        usage: TokenUsage,
    },
    #[error("{error}")]
    Validation { error: ValidationError, usage: TokenUsage },
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl GatewayError {
    /// Tokens spent on the attempt that produced this error, `0` for a
    /// transport failure that never reached the provider response.
    pub fn usage(&self) -> TokenUsage {
        match self {
            GatewayError::EmptyResponse { usage } => *usage,
            GatewayError::MalformedJson { usage, .. } => *usage,
            GatewayError::Validation { usage, .. } => *usage,
            GatewayError::Transport(_) => TokenUsage::default(),
        }
    }
}
