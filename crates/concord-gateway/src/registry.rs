// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::HashMap;
use std::sync::Arc;

use concord_config::{Config, ModelConfig};

use crate::http::{AuthStyle, HttpJsonProvider};
use crate::mock::MockProvider;
use crate::ModelProvider;

/// Builds one `ModelProvider` per role ("critic", "mutator", "capitalizer",
/// ...) from a resolved `Config`, falling back to the default model seat for
/// any role the config does not name explicitly.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ModelProvider>>,
    default: Arc<dyn ModelProvider>,
}

impl ProviderRegistry {
    pub fn from_config(cfg: &Config) -> Self {
        let default = build_provider(&cfg.model);
        let providers = cfg
            .providers
            .iter()
            .map(|(role, model_cfg)| (role.clone(), build_provider(model_cfg)))
            .collect();
        Self { providers, default }
    }

    pub fn for_role(&self, role: &str) -> Arc<dyn ModelProvider> {
        self.providers.get(role).cloned().unwrap_or_else(|| self.default.clone())
    }
}

fn build_provider(cfg: &ModelConfig) -> Arc<dyn ModelProvider> {
    if cfg.provider == "mock" {
        return Arc::new(MockProvider);
    }

    let api_key = cfg
        .api_key
        .clone()
        .or_else(|| cfg.api_key_env.as_ref().and_then(|name| std::env::var(name).ok()));

    let base_url = cfg.base_url.clone().unwrap_or_else(|| default_base_url(&cfg.provider));
    let auth_style = if cfg.provider == "azure" { AuthStyle::ApiKeyHeader } else { AuthStyle::Bearer };

    Arc::new(HttpJsonProvider::new(cfg.provider.clone(), cfg.name.clone(), api_key, &base_url, auth_style))
}

fn default_base_url(provider: &str) -> String {
    match provider {
        "openai" => "https://api.openai.com/v1".to_string(),
        "groq" => "https://api.groq.com/openai/v1".to_string(),
        "openrouter" => "https://openrouter.ai/api/v1".to_string(),
        other => format!("http://localhost:11434/{other}"),
    }
}
