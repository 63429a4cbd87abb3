// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use concord_schema::Hyperparameters;

fn default_true() -> bool {
    true
}

/// Every tunable of the simulation core (§6 of the design doc).
///
/// Deserialized from YAML layers the same way the model/provider config is;
/// every field carries a `#[serde(default = ...)]` so a partial config file
/// (or none at all) still produces a usable `EngineConfig`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_max_turns_per_episode")]
    pub max_turns_per_episode: u32,
    #[serde(default = "default_max_episode_tokens")]
    pub max_episode_tokens: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_epoch_size")]
    pub epoch_size: usize,
    #[serde(default = "default_mutation_variants")]
    pub mutation_variants: usize,
    #[serde(default = "default_shadow_trial_count")]
    pub shadow_trial_count: usize,
    #[serde(default = "default_improvement_margin")]
    pub improvement_margin: f64,
    #[serde(default = "default_acceptance_lcb_lambda")]
    pub acceptance_lcb_lambda: f64,
    #[serde(default = "default_acceptance_p_value_threshold")]
    pub acceptance_p_value_threshold: f64,
    #[serde(default = "default_creation_patience")]
    pub creation_patience: u32,
    #[serde(default = "default_max_active_created_agents")]
    pub max_active_created_agents: u32,
    #[serde(default = "default_creation_cooldown_generations")]
    pub creation_cooldown_generations: u32,
    #[serde(default = "default_true")]
    pub require_human_approval_for_creation: bool,
    #[serde(default = "default_max_validation_retries")]
    pub max_validation_retries: u32,
    #[serde(default = "default_forced_concession_threshold")]
    pub forced_concession_threshold: u32,
    #[serde(default = "default_scout_sweep_interval_generations")]
    pub scout_sweep_interval_generations: u32,
    #[serde(default = "default_info_disruptor_frequency")]
    pub info_disruptor_frequency: u32,
    #[serde(default = "default_summarization_frequency")]
    pub summarization_frequency: u32,
    #[serde(default = "default_max_generations")]
    pub max_generations: u32,
}

fn default_max_turns_per_episode() -> u32 { 20 }
fn default_max_episode_tokens() -> u64 { 50_000 }
fn default_max_concurrency() -> usize { 5 }
fn default_epoch_size() -> usize { 10 }
fn default_mutation_variants() -> usize { 3 }
fn default_shadow_trial_count() -> usize { 10 }
fn default_improvement_margin() -> f64 { 0.5 }
fn default_acceptance_lcb_lambda() -> f64 { 1.0 }
fn default_acceptance_p_value_threshold() -> f64 { 0.05 }
fn default_creation_patience() -> u32 { 5 }
fn default_max_active_created_agents() -> u32 { 3 }
fn default_creation_cooldown_generations() -> u32 { 3 }
fn default_max_validation_retries() -> u32 { 3 }
fn default_forced_concession_threshold() -> u32 { 2 }
fn default_scout_sweep_interval_generations() -> u32 { 5 }
fn default_info_disruptor_frequency() -> u32 { 3 }
fn default_summarization_frequency() -> u32 { 5 }
fn default_max_generations() -> u32 { 100 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_turns_per_episode: default_max_turns_per_episode(),
            max_episode_tokens: default_max_episode_tokens(),
            max_concurrency: default_max_concurrency(),
            epoch_size: default_epoch_size(),
            mutation_variants: default_mutation_variants(),
            shadow_trial_count: default_shadow_trial_count(),
            improvement_margin: default_improvement_margin(),
            acceptance_lcb_lambda: default_acceptance_lcb_lambda(),
            acceptance_p_value_threshold: default_acceptance_p_value_threshold(),
            creation_patience: default_creation_patience(),
            max_active_created_agents: default_max_active_created_agents(),
            creation_cooldown_generations: default_creation_cooldown_generations(),
            require_human_approval_for_creation: true,
            max_validation_retries: default_max_validation_retries(),
            forced_concession_threshold: default_forced_concession_threshold(),
            scout_sweep_interval_generations: default_scout_sweep_interval_generations(),
            info_disruptor_frequency: default_info_disruptor_frequency(),
            summarization_frequency: default_summarization_frequency(),
            max_generations: default_max_generations(),
        }
    }
}

/// Model/provider configuration for a single gateway seat (one per agent
/// role, or a shared one for all primary actors).
///
/// Mirrors the teacher's provider config: `provider` selects the driver,
/// `api_key_env` is preferred over `api_key` so secrets never land in a
/// checked-in config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Provider identifier: "openai" | "anthropic" | "mock" | ...
    pub provider: String,
    /// Model name forwarded to the provider API.
    pub name: String,
    /// Environment variable that holds the API key (read at runtime).
    pub api_key_env: Option<String>,
    /// Explicit API key; prefer `api_key_env` in checked-in config files.
    pub api_key: Option<String>,
    /// Base URL override (local proxies, self-hosted gateways).
    pub base_url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            name: "mock-model".to_string(),
            api_key_env: None,
            api_key: None,
            base_url: None,
            temperature: None,
        }
    }
}

/// One primary actor's starting configuration, as declared by a scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSeed {
    pub agent_id: String,
    /// Layer-1 immutable core system prompt.
    pub immutable_core: String,
    /// Layer-2 initial mutable strategy.
    pub initial_strategy: String,
    #[serde(default)]
    pub hyperparameters: Hyperparameters,
}

/// A scenario: the initial `StateObject::variables` payload, the roster of
/// primary actors, and which meta-agents are wired in.  Scenario *loading*
/// (the file format, CLI flags) is out of this core's scope per §1 — this
/// struct is the shape the core consumes once a caller has produced one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default)]
    pub initial_variables: serde_json::Map<String, serde_json::Value>,
    pub actors: Vec<ActorSeed>,
    #[serde(default = "default_true")]
    pub capitalizer_enabled: bool,
    #[serde(default = "default_true")]
    pub tension_disruptor_enabled: bool,
    #[serde(default = "default_true")]
    pub info_disruptor_enabled: bool,
    #[serde(default)]
    pub explorer_enabled: bool,
}

/// Top-level configuration merged from all layered config files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub model: ModelConfig,
    /// Named provider seats, keyed by role ("critic", "mutator", ...); any
    /// role absent from this map falls back to `model`.
    #[serde(default)]
    pub providers: HashMap<String, ModelConfig>,
}

impl Config {
    /// Resolve the model seat for a given role, falling back to the default.
    pub fn model_for(&self, role: &str) -> &ModelConfig {
        self.providers.get(role).unwrap_or(&self.model)
    }
}
