// SPDX-License-Identifier: MIT
//! End-to-end episode scenarios, one per testable property called out in
//! the design notes: a mutation landing, the three termination paths that
//! originate inside a single `step`, the two mounting-contract rejections,
//! the forced-concession path, and the token circuit breaker.
use std::sync::Arc;

use concord_actor::PrimaryActor;
use concord_config::EngineConfig;
use concord_environment::{Environment, EnvironmentError, EnvironmentWiring};
use concord_gateway::{ModelGateway, ScriptedMockProvider};
use concord_schema::{AgentPermissions, Hyperparameters, NewAgentProvisioning, StateObject, TerminationReason};
use serde_json::{json, Map};

fn actor(id: &str) -> PrimaryActor {
    PrimaryActor::new(id, format!("You are {id}."), "Negotiate in good faith.", Hyperparameters::default())
}

fn wiring(gateway: ModelGateway, config: EngineConfig) -> EnvironmentWiring {
    EnvironmentWiring {
        gateway: Arc::new(gateway),
        config: Arc::new(config),
        capitalizer: None,
        tension_disruptor: None,
        info_disruptor: None,
        events: None,
    }
}

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

#[tokio::test]
async fn s1_mutation_is_applied_and_turn_advances() {
    let reply = json!({
        "internal_monologue": "opening firm",
        "public_dialogue": "I can offer a small concession",
        "state_mutations": [{"action": "add", "path": "concessions.y", "value": 65}],
        "propose_resolution": false,
        "abort_episode": false,
    })
    .to_string();
    let gateway = ModelGateway::new(Arc::new(ScriptedMockProvider::always(reply)));
    let mut env = Environment::new(
        StateObject::new(Map::new()),
        vec![actor("actor-a")],
        wiring(gateway, EngineConfig::default()),
    );

    env.step().await.unwrap();

    assert_eq!(env.state().variables["concessions"]["y"], json!(65));
    assert_eq!(env.state().turn_number, 1);
    assert!(!env.state().is_terminal);
}

#[tokio::test]
async fn s2_abort_ends_the_episode_immediately() {
    let reply = json!({
        "internal_monologue": "this deal is dead",
        "public_dialogue": "I'm walking away",
        "state_mutations": [],
        "propose_resolution": false,
        "abort_episode": true,
    })
    .to_string();
    let gateway = ModelGateway::new(Arc::new(ScriptedMockProvider::always(reply)));
    let mut env = Environment::new(
        StateObject::new(Map::new()),
        vec![actor("actor-a")],
        wiring(gateway, EngineConfig::default()),
    );

    env.step().await.unwrap();

    assert!(env.state().is_terminal);
    assert_eq!(env.termination_reason(), Some(TerminationReason::AbortEpisode));
}

#[tokio::test]
async fn s3_agreement_requires_two_consecutive_resolutions() {
    let resolution = json!({
        "internal_monologue": "I think we're done",
        "public_dialogue": "I accept these terms",
        "state_mutations": [],
        "propose_resolution": true,
        "abort_episode": false,
    })
    .to_string();
    let gateway = ModelGateway::new(Arc::new(ScriptedMockProvider::new(vec![resolution.clone(), resolution])));
    let mut env = Environment::new(
        StateObject::new(Map::new()),
        vec![actor("actor-a"), actor("actor-b")],
        wiring(gateway, EngineConfig::default()),
    );

    env.step().await.unwrap();
    assert!(!env.state().is_terminal, "a single resolution proposal must not end the episode");

    env.step().await.unwrap();
    assert!(env.state().is_terminal);
    assert_eq!(env.termination_reason(), Some(TerminationReason::Agreement));
}

#[tokio::test]
async fn s4_timeout_stops_at_the_turn_cap() {
    let scripts = std::iter::repeat(neutral_reply()).take(4).collect();
    let gateway = ModelGateway::new(Arc::new(ScriptedMockProvider::new(scripts)));
    let config = EngineConfig { max_turns_per_episode: 4, ..EngineConfig::default() };
    let mut env = Environment::new(
        StateObject::new(Map::new()),
        vec![actor("actor-a"), actor("actor-b")],
        wiring(gateway, config),
    );

    let outcome = env.run_episode().await.unwrap();

    assert_eq!(outcome.final_state.turn_number, 4);
    assert_eq!(outcome.action_log.len(), 4);
    assert_eq!(outcome.termination_reason, TerminationReason::Timeout);
}

#[tokio::test]
async fn s5_permission_violation_is_rejected() {
    let primary_reply = neutral_reply();
    let violation = json!({
        "internal_monologue": "I'll touch what I shouldn't",
        "public_dialogue": "adjusting concessions",
        "state_mutations": [{"action": "modify", "path": "concessions.y", "value": 10}],
        "propose_resolution": false,
        "abort_episode": false,
    })
    .to_string();
    let gateway = ModelGateway::new(Arc::new(ScriptedMockProvider::new(vec![primary_reply, violation])));
    let mut env = Environment::new(
        StateObject::new(Map::new()),
        vec![actor("primary")],
        wiring(gateway, EngineConfig::default()),
    );
    let spec = NewAgentProvisioning {
        agent_id: "mediator".into(),
        archetype: "mediator".into(),
        turn_injection_logic: "speak_every_1_turns".into(),
        system_prompt: "You mediate.".into(),
        core_goals: vec!["de-escalate".into()],
        permissions: AgentPermissions {
            can_modify_fields: vec!["subsidies".into()],
            cannot_modify_fields: vec!["concessions".into()],
            can_abort_episode: false,
            can_propose_resolution: false,
            max_state_mutations_per_turn: 1,
        },
        design_rationale: "plateau".into(),
    };
    env.mount_agent(spec, 3).await.unwrap();

    env.step().await.unwrap(); // primary's turn, harmless
    let result = env.step().await; // mediator's turn, disallowed mutation

    assert!(matches!(result, Err(EnvironmentError::PermissionViolation { .. })));
}

#[tokio::test]
async fn s6_spawn_cap_rejects_the_second_mount() {
    let gateway = ModelGateway::new(Arc::new(ScriptedMockProvider::always(neutral_reply())));
    let mut env = Environment::new(
        StateObject::new(Map::new()),
        vec![actor("primary")],
        wiring(gateway, EngineConfig::default()),
    );
    let spec = |id: &str| NewAgentProvisioning {
        agent_id: id.into(),
        archetype: "mediator".into(),
        turn_injection_logic: "speak_every_1_turns".into(),
        system_prompt: "You mediate.".into(),
        core_goals: vec!["de-escalate".into()],
        permissions: AgentPermissions {
            can_modify_fields: vec!["subsidies".into()],
            cannot_modify_fields: vec![],
            can_abort_episode: false,
            can_propose_resolution: false,
            max_state_mutations_per_turn: 1,
        },
        design_rationale: "plateau".into(),
    };

    env.mount_agent(spec("mediator-1"), 1).await.unwrap();
    let result = env.mount_agent(spec("mediator-2"), 1).await;

    assert!(matches!(result, Err(EnvironmentError::MaxAgentsExceeded { count: 1, max: 1 })));
}

#[tokio::test]
async fn s7_corruption_ends_after_forced_concession_threshold_skips() {
    let gateway = ModelGateway::new(Arc::new(ScriptedMockProvider::always("not json")));
    let config = EngineConfig { forced_concession_threshold: 2, ..EngineConfig::default() };
    let mut env = Environment::new(
        StateObject::new(Map::new()),
        vec![actor("actor-a")],
        wiring(gateway, config),
    );

    env.step().await.unwrap();
    assert!(!env.state().is_terminal);
    env.step().await.unwrap();

    assert!(env.state().is_terminal);
    assert_eq!(env.termination_reason(), Some(TerminationReason::Corrupted));
    assert_eq!(env.state().turn_number, 2);
}

#[tokio::test]
async fn s8_token_limit_breaker_fires_on_the_turn_after_crossing_the_budget() {
    let gateway = ModelGateway::new(Arc::new(ScriptedMockProvider::always(neutral_reply())));
    let config = EngineConfig { max_episode_tokens: 5, ..EngineConfig::default() };
    let mut env = Environment::new(
        StateObject::new(Map::new()),
        vec![actor("actor-a")],
        wiring(gateway, config),
    );

    env.step().await.unwrap();
    assert_eq!(env.state().turn_number, 1);
    assert!(!env.state().is_terminal);

    env.step().await.unwrap();

    assert!(env.state().is_terminal);
    assert_eq!(env.termination_reason(), Some(TerminationReason::TokenLimit));
    assert_eq!(env.state().turn_number, 1);
}
