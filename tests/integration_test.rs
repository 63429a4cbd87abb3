// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
/// End-to-end tests that exercise the whole stack together: a scenario file
/// on disk, the layered config loader, the provider registry, and a full
/// orchestrator generation — rather than any one crate in isolation.
use std::io::Write;
use std::sync::Arc;

use concord_config::{Config, ModelConfig};
use concord_gateway::{ModelGateway, ProviderRegistry, ScriptedMockProvider};
use concord_orchestrator::{CreationOutcome, Orchestrator, OrchestratorWiring};
use serde_json::json;

fn neutral_reply() -> String {
    json!({
        "internal_monologue": "holding steady",
        "public_dialogue": "let's keep talking",
        "state_mutations": [],
        "propose_resolution": false,
        "abort_episode": false,
    })
    .to_string()
}

fn resolution_reply() -> String {
    json!({
        "internal_monologue": "I think we're done",
        "public_dialogue": "I accept these terms",
        "state_mutations": [],
        "propose_resolution": true,
        "abort_episode": false,
    })
    .to_string()
}

fn critic_reply() -> String {
    json!({
        "scores": [
            {"agent_id": "buyer", "score": 2, "rationale": "steady"},
            {"agent_id": "seller", "score": 1, "rationale": "steady"},
        ]
    })
    .to_string()
}

fn write_scenario_file() -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        f,
        "name: trade-talks\n\
         actors:\n\
         \x20\x20- agent_id: buyer\n\
         \x20\x20\x20\x20immutable_core: You are the buyer.\n\
         \x20\x20\x20\x20initial_strategy: Open low.\n\
         \x20\x20- agent_id: seller\n\
         \x20\x20\x20\x20immutable_core: You are the seller.\n\
         \x20\x20\x20\x20initial_strategy: Open high.\n\
         capitalizer_enabled: false\n\
         tension_disruptor_enabled: false\n\
         info_disruptor_enabled: false\n\
         explorer_enabled: false\n"
    )
    .unwrap();
    f
}

#[tokio::test]
async fn scenario_file_loads_and_runs_a_full_generation() {
    let scenario_file = write_scenario_file();
    let scenario = concord_config::load_scenario(scenario_file.path()).unwrap();
    assert_eq!(scenario.actors.len(), 2);

    // Both actors propose resolution on their first turn, reaching agreement
    // after turn 2; the critic call that follows needs a well-formed verdict.
    let scripts = vec![resolution_reply(), resolution_reply(), critic_reply()];
    let gateway = Arc::new(ModelGateway::new(Arc::new(ScriptedMockProvider::new(scripts))));
    let wiring = OrchestratorWiring {
        episode_gateway: gateway.clone(),
        critic_gateway: gateway.clone(),
        mutator_gateway: gateway.clone(),
        provisioner_gateway: gateway.clone(),
        explorer_gateway: gateway,
    };

    let mut config = concord_config::load(None).unwrap();
    config.engine.epoch_size = 1;
    config.engine.max_turns_per_episode = 4;

    let mut orchestrator =
        Orchestrator::new(Arc::new(config.engine), wiring, &scenario, Vec::new(), Box::new(|_| true), None);

    let outcome = orchestrator.run_generation().await.unwrap();
    assert_eq!(outcome.generation, 1);
    assert_eq!(outcome.epoch_results.len(), 1);
    assert!(outcome.agreement_short_circuit);
    assert!(outcome.mutations.is_empty());
    assert_eq!(outcome.creation, CreationOutcome::Skipped);
}

#[tokio::test]
async fn a_stalled_episode_still_produces_a_scored_result() {
    let scenario_file = write_scenario_file();
    let scenario = concord_config::load_scenario(scenario_file.path()).unwrap();

    // Neither actor ever proposes resolution, so the episode runs out the
    // clock at max_turns_per_episode and terminates by timeout instead.
    let scripts = vec![neutral_reply(), neutral_reply(), critic_reply()];
    let gateway = Arc::new(ModelGateway::new(Arc::new(ScriptedMockProvider::new(scripts))));
    let wiring = OrchestratorWiring {
        episode_gateway: gateway.clone(),
        critic_gateway: gateway.clone(),
        mutator_gateway: gateway.clone(),
        provisioner_gateway: gateway.clone(),
        explorer_gateway: gateway,
    };

    let mut config = concord_config::load(None).unwrap();
    config.engine.epoch_size = 1;
    config.engine.max_turns_per_episode = 2;

    let mut orchestrator =
        Orchestrator::new(Arc::new(config.engine), wiring, &scenario, Vec::new(), Box::new(|_| true), None);

    let outcome = orchestrator.run_generation().await.unwrap();
    assert!(!outcome.agreement_short_circuit);
    assert_eq!(outcome.epoch_results.len(), 1);
    assert_eq!(outcome.epoch_results[0].score_for("buyer"), Some(2));
}

#[test]
fn provider_registry_resolves_named_seats_loaded_from_config() {
    let mut config = Config::default();
    config.model = ModelConfig { provider: "openai".into(), name: "gpt-4o".into(), ..ModelConfig::default() };
    config.providers.insert(
        "critic".into(),
        ModelConfig { provider: "anthropic".into(), name: "claude".into(), ..ModelConfig::default() },
    );

    let registry = ProviderRegistry::from_config(&config);
    assert_eq!(registry.for_role("critic").name(), "anthropic");
    // Roles with no seat configured fall back to the default model.
    assert_eq!(registry.for_role("mutator").name(), "openai");
}
