// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
pub mod error;
pub mod gateway;
pub mod http;
pub mod mock;
pub mod provider;
pub mod registry;
pub mod types;

pub use error::GatewayError;
pub use gateway::ModelGateway;
pub use http::{AuthStyle, HttpJsonProvider};
pub use mock::{MockProvider, ScriptedMockProvider};
pub use provider::ModelProvider;
pub use registry::ProviderRegistry;
pub use types::{GenerationRequest, Message, Role, TokenUsage};
