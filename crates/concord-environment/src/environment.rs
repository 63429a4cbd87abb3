// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use concord_actor::{PrimaryActor, TurnPayload};
use concord_config::EngineConfig;
use concord_gateway::{ModelGateway, TokenUsage};
use concord_metaagents::{Capitalizer, InformationDisruptor, TensionDisruptor};
use concord_schema::{
    ActionLogEntry, AgentPermissions, NewAgentProvisioning, StateObject, TerminationReason, Validate,
};

use crate::error::EnvironmentError;
use crate::events::EnvironmentEvent;
use crate::mount::{extend_turn_order, parse_injection_frequency};
use crate::mutation::{apply_mutation, permission_allows};
use crate::redact::redact_leaks;

/// What one call to `run_episode` yields. `action_log` is the full,
/// unpruned record — the Critic always sees everything, even if
/// subsequent actors within the episode saw a pruned transcript view.
#[derive(Debug, Clone)]
pub struct EpisodeOutcome {
    pub final_state: StateObject,
    pub action_log: Vec<ActionLogEntry>,
    pub termination_reason: TerminationReason,
}

/// Everything one episode needs that isn't the initial state or actor
/// roster: the shared gateway, tunables, and which meta-agents are wired.
pub struct EnvironmentWiring {
    pub gateway: Arc<ModelGateway>,
    pub config: Arc<EngineConfig>,
    pub capitalizer: Option<Capitalizer>,
    pub tension_disruptor: Option<TensionDisruptor>,
    pub info_disruptor: Option<InformationDisruptor>,
    pub events: Option<mpsc::Sender<EnvironmentEvent>>,
}

/// The execution-loop state machine. Owns one episode's `StateObject` and
/// action log exclusively for the episode's lifetime; never shares them
/// with another `Environment` instance (deep-copy discipline, §9).
pub struct Environment {
    state: StateObject,
    termination_reason: Option<TerminationReason>,
    actors: HashMap<String, PrimaryActor>,
    permissions: HashMap<String, AgentPermissions>,
    turn_order: Vec<String>,
    action_log: Vec<ActionLogEntry>,
    /// Start index of the window subsequent actors' transcripts are built
    /// from; advanced (never the log itself truncated) by context pruning,
    /// since the Critic still needs the full log from `action_log[0..]`.
    visible_from: usize,
    penalty_count: HashMap<String, u32>,
    last_proposal_was_final: bool,
    cumulative_tokens: TokenUsage,
    created_agent_count: u32,
    wiring: EnvironmentWiring,
}

impl Environment {
    pub fn new(initial_state: StateObject, actors: Vec<PrimaryActor>, wiring: EnvironmentWiring) -> Self {
        let turn_order = actors.iter().map(|a| a.agent_id.clone()).collect();
        let actors = actors.into_iter().map(|a| (a.agent_id.clone(), a)).collect();
        Self {
            state: initial_state.deep_copy(),
            termination_reason: None,
            actors,
            permissions: HashMap::new(),
            turn_order,
            action_log: Vec::new(),
            visible_from: 0,
            penalty_count: HashMap::new(),
            last_proposal_was_final: false,
            cumulative_tokens: TokenUsage::default(),
            created_agent_count: 0,
            wiring,
        }
    }

    pub fn state(&self) -> &StateObject {
        &self.state
    }

    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.termination_reason
    }

    pub fn action_log(&self) -> &[ActionLogEntry] {
        &self.action_log
    }

    /// Mount a Provisioner-designed (or otherwise externally supplied)
    /// agent: enforce the spawn cap and permission guardrails, parse its
    /// injection cadence, and extend the turn order (§4.1 "Mounting
    /// contract", invariants 4 and 5).
    pub async fn mount_agent(&mut self, spec: NewAgentProvisioning, max_active_created_agents: u32) -> Result<(), EnvironmentError> {
        if self.created_agent_count >= max_active_created_agents {
            return Err(EnvironmentError::MaxAgentsExceeded {
                count: self.created_agent_count,
                max: max_active_created_agents,
            });
        }
        if let Err(error) = spec.permissions.validate() {
            return Err(EnvironmentError::UnsafeAgentDesign { agent_id: spec.agent_id, reason: error.to_string() });
        }

        let frequency = parse_injection_frequency(&spec.turn_injection_logic);
        let strategy = format!("Core goals: {}", spec.core_goals.join(", "));
        let actor = PrimaryActor::new(spec.agent_id.clone(), spec.system_prompt.clone(), strategy, Default::default());

        extend_turn_order(&mut self.turn_order, &spec.agent_id, frequency);
        self.permissions.insert(spec.agent_id.clone(), spec.permissions.clone());
        self.actors.insert(spec.agent_id.clone(), actor);
        self.created_agent_count += 1;

        info!(agent_id = %spec.agent_id, frequency, "mounted created agent");
        self.emit(EnvironmentEvent::AgentCreated { spec }).await;
        Ok(())
    }

    /// Drive the episode to completion: repeatedly `step` until terminal,
    /// the turn cap is reached, or the cost circuit breaker fires.
    pub async fn run_episode(&mut self) -> Result<EpisodeOutcome, EnvironmentError> {
        self.emit(EnvironmentEvent::EpisodeStart).await;

        while !self.state.is_terminal && self.state.turn_number < self.wiring.config.max_turns_per_episode {
            self.step().await?;

            if self.state.turn_number % self.wiring.config.summarization_frequency.max(1) == 0 {
                self.prune_context().await;
            }
        }

        if !self.state.is_terminal {
            self.state.is_terminal = true;
            self.termination_reason = Some(TerminationReason::Timeout);
        }
        let reason = self.termination_reason.unwrap_or(TerminationReason::Timeout);

        self.emit(EnvironmentEvent::EpisodeComplete { final_state: self.state.deep_copy(), reason }).await;

        Ok(EpisodeOutcome {
            final_state: self.state.deep_copy(),
            action_log: self.action_log.clone(),
            termination_reason: reason,
        })
    }

    /// Execute a single tick for the agent whose turn it is (§4.1, the
    /// 11-step per-step contract).
    pub async fn step(&mut self) -> Result<(), EnvironmentError> {
        if self.cumulative_tokens.total() as u64 > self.wiring.config.max_episode_tokens {
            self.state.is_terminal = true;
            self.termination_reason = Some(TerminationReason::TokenLimit);
            return Ok(());
        }

        // Step 1: resolve the speaker.
        let idx = (self.state.turn_number as usize) % self.turn_order.len();
        let speaker_id = self.turn_order[idx].clone();
        self.state.current_speaker_id = speaker_id.clone();

        // Step 2: Capitalizer.
        if let Some(capitalizer) = &self.wiring.capitalizer {
            let recent = self.visible_window(4);
            match capitalizer.analyze(&self.wiring.gateway, &self.state, &recent).await {
                Ok(output) if output.overlap_detected => {
                    let hint = redact_leaks(&output.strategic_hint, &recent);
                    self.state.set_capitalizer_hint(hint);
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "capitalizer call failed; skipping hint for this turn"),
            }
        }

        // Step 3: build the actor's payload from the live (possibly pruned) transcript.
        let payload = TurnPayload {
            turn_number: self.state.turn_number,
            max_turns: self.wiring.config.max_turns_per_episode,
            current_speaker_id: speaker_id.clone(),
            public_transcript: self.visible_window(usize::MAX).iter().map(|e| e.public_text().to_string()).collect(),
            variables: self.state.variables.clone(),
            global_tension_level: self.state.global_tension_level(),
            capitalizer_hint: self.state.capitalizer_hint().map(str::to_string),
        };

        // Step 4: call the actor (retry loop lives inside `PrimaryActor::propose`).
        let actor = self.actors.get(&speaker_id).expect("turn_order only names mounted actors");
        let (proposal, usage) = actor.propose(&self.wiring.gateway, &payload, self.wiring.config.max_validation_retries).await;
        self.cumulative_tokens += usage;

        let Some(proposal) = proposal else {
            // Step 5: retry budget exhausted, apply the turn penalty.
            let retries = {
                let count = self.penalty_count.entry(speaker_id.clone()).or_insert(0);
                *count += 1;
                *count
            };
            if retries >= self.wiring.config.forced_concession_threshold {
                self.state.is_terminal = true;
                self.termination_reason = Some(TerminationReason::Corrupted);
            } else {
                self.emit(EnvironmentEvent::TurnPenalty { speaker_id, retries }).await;
            }
            self.state.turn_number += 1;
            return Ok(());
        };

        // Step 6: permission check, before any mutation is applied.
        let permissions = self.permissions.get(&speaker_id);
        for mutation in &proposal.state_mutations {
            if !permission_allows(permissions, &mutation.path) {
                return Err(EnvironmentError::PermissionViolation { speaker_id, path: mutation.path.clone() });
            }
        }

        // Step 7: apply mutations in order.
        for mutation in &proposal.state_mutations {
            apply_mutation(&mut self.state.variables, mutation);
        }

        // Step 8: termination checks.
        if proposal.abort_episode {
            self.state.is_terminal = true;
            self.termination_reason = Some(TerminationReason::AbortEpisode);
        } else if proposal.propose_resolution && self.last_proposal_was_final {
            self.state.is_terminal = true;
            self.termination_reason = Some(TerminationReason::Agreement);
        }
        self.last_proposal_was_final = proposal.propose_resolution;

        // Step 9: append the log entry, emit turn:complete.
        self.action_log.push(ActionLogEntry::Actor {
            turn: self.state.turn_number,
            speaker_id: speaker_id.clone(),
            internal_monologue: proposal.internal_monologue.clone(),
            public_dialogue: proposal.public_dialogue.clone(),
            state_mutations: proposal.state_mutations.clone(),
            propose_resolution: proposal.propose_resolution,
            abort_episode: proposal.abort_episode,
        });
        self.emit(EnvironmentEvent::TurnComplete { speaker_id: speaker_id.clone(), proposal: proposal.clone() }).await;

        // Step 10: disruptor cadence, skipped once the episode just ended.
        if !self.state.is_terminal {
            if let Some(tension) = &self.wiring.tension_disruptor {
                let recent = self.visible_window(8);
                match tension.assess(&self.wiring.gateway, &self.state, &recent).await {
                    Ok(out) => self.state.set_global_tension_level(out.new_tension_level),
                    Err(err) => warn!(error = %err, "tension disruptor call failed; tension unchanged"),
                }
            }
            let frequency = self.wiring.config.info_disruptor_frequency.max(1);
            if self.wiring.info_disruptor.is_some() && self.state.turn_number % frequency == 0 {
                let recent = self.visible_window(8);
                match self.wiring.info_disruptor.as_ref().unwrap().observe(&self.wiring.gateway, &recent).await {
                    Ok(out) => self.action_log.push(ActionLogEntry::Disruptor {
                        turn: self.state.turn_number,
                        speaker_id: "disruptor_info".to_string(),
                        headline: out.headline,
                        severity: out.severity,
                    }),
                    Err(err) => warn!(error = %err, "information disruptor call failed; no headline injected"),
                }
            }
        }

        // Step 11: advance the clock.
        self.state.turn_number += 1;
        Ok(())
    }

    fn visible_window(&self, last_n: usize) -> Vec<ActionLogEntry> {
        let visible = &self.action_log[self.visible_from..];
        let start = visible.len().saturating_sub(last_n);
        visible[start..].to_vec()
    }

    /// §4.1 "Context pruning": drop everything but the last
    /// `2 * summarization_frequency` entries from what actors can see. The
    /// underlying `action_log` is never truncated, only the visible window
    /// advances, so the Critic still gets the full record.
    async fn prune_context(&mut self) {
        let window = 2 * self.wiring.config.summarization_frequency.max(1) as usize;
        let visible_len = self.action_log.len() - self.visible_from;
        if visible_len > window {
            let before = visible_len;
            self.visible_from = self.action_log.len() - window;
            let after = self.action_log.len() - self.visible_from;
            debug!(before, after, "pruned context window");
            self.emit(EnvironmentEvent::ContextPruned { before, after }).await;
        }
    }

    async fn emit(&self, event: EnvironmentEvent) {
        if let Some(tx) = &self.wiring.events {
            let _ = tx.send(event).await;
        }
    }
}
