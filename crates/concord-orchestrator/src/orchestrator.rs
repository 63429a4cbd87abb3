// SPDX-License-Identifier: MIT
//! The generation loop: fans episodes out under the bounded-parallelism
//! limiter, judges them with the Critic, evolves the roster through the
//! Mutator and Provisioner, and periodically sweeps the Explorer.
use std::sync::Arc;

use tracing::{info, warn};

use concord_actor::PrimaryActor;
use concord_config::{EngineConfig, ScenarioConfig};
use concord_environment::{Environment, EnvironmentWiring};
use concord_gateway::ModelGateway;
use concord_memory::RelationalStore;
use concord_metaagents::{Critic, Explorer, Mutator, Provisioner};
use concord_metaagents::{Capitalizer, InformationDisruptor, TensionDisruptor};
use concord_schema::{
    EpochResult, Hyperparameters, Ingredient, MutationVariant, NewAgentProvisioning, ScoutHypothesis, StateObject,
    TerminationReason,
};
use concord_scheduler::Scheduler;

use crate::error::OrchestratorError;
use crate::types::{CreationOutcome, GenerationOutcome, MutationOutcome};

/// One `ModelGateway` seat per meta-agent role, plus the seat shared by
/// every primary actor and meta-agent called from inside an `Environment`
/// (the Capitalizer and disruptors use the same seat the actors do, since
/// `EnvironmentWiring` carries only one gateway per episode).
pub struct OrchestratorWiring {
    pub episode_gateway: Arc<ModelGateway>,
    pub critic_gateway: Arc<ModelGateway>,
    pub mutator_gateway: Arc<ModelGateway>,
    pub provisioner_gateway: Arc<ModelGateway>,
    pub explorer_gateway: Arc<ModelGateway>,
}

/// Everything one episode or shadow trial needs to build a fresh
/// `Environment` from scratch, cheap enough to clone once per fan-out task.
#[derive(Clone)]
struct EpisodeRunner {
    initial_state: StateObject,
    actors: Vec<PrimaryActor>,
    created_agents: Vec<NewAgentProvisioning>,
    config: Arc<EngineConfig>,
    episode_gateway: Arc<ModelGateway>,
    critic_gateway: Arc<ModelGateway>,
    critic: Arc<Critic>,
    capitalizer_enabled: bool,
    tension_disruptor_enabled: bool,
    info_disruptor_enabled: bool,
}

impl EpisodeRunner {
    async fn build_environment(&self) -> Result<Environment, OrchestratorError> {
        let wiring = EnvironmentWiring {
            gateway: self.episode_gateway.clone(),
            config: self.config.clone(),
            capitalizer: self.capitalizer_enabled.then(Capitalizer::default),
            tension_disruptor: self.tension_disruptor_enabled.then(TensionDisruptor::default),
            info_disruptor: self.info_disruptor_enabled.then(InformationDisruptor::default),
            events: None,
        };
        let mut env = Environment::new(self.initial_state.deep_copy(), self.actors.clone(), wiring);
        for spec in &self.created_agents {
            env.mount_agent(spec.clone(), self.config.max_active_created_agents).await?;
        }
        Ok(env)
    }

    /// Run one full episode and judge it with the Critic. A failure at
    /// either stage drops this fan-out slot (logged) rather than failing
    /// the whole epoch, matching the scheduler's own panic-drops-a-slot
    /// discipline.
    async fn run_episode(&self) -> Option<EpochResult> {
        let mut env = match self.build_environment().await {
            Ok(env) => env,
            Err(err) => {
                warn!(error = %err, "failed to construct episode; dropping this slot");
                return None;
            }
        };
        let initial_state = env.state().deep_copy();
        let outcome = match env.run_episode().await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "episode failed mid-run; dropping this slot");
                return None;
            }
        };
        match self.critic.judge(&self.critic_gateway, &initial_state, &outcome.final_state, &outcome.action_log).await {
            Ok(verdict) => Some(EpochResult {
                final_state: outcome.final_state,
                scores: verdict.scores.into_iter().map(|s| (s.agent_id, s.score)).collect(),
                termination_reason: outcome.termination_reason,
            }),
            Err(err) => {
                warn!(error = %err, "critic failed to judge episode; dropping this slot");
                None
            }
        }
    }

    /// Same as `run_episode`, but one actor's roster slot is replaced with
    /// `substitute` first and `turn_cap`, if given, overrides
    /// `max_turns_per_episode` for the fast-prune trial.
    async fn run_episode_with_substitute(&self, substitute: &PrimaryActor, turn_cap: Option<u32>) -> Option<EpochResult> {
        let mut runner = self.clone();
        match runner.actors.iter_mut().find(|a| a.agent_id == substitute.agent_id) {
            Some(slot) => *slot = substitute.clone(),
            None => runner.actors.push(substitute.clone()),
        }
        if let Some(cap) = turn_cap {
            runner.config = Arc::new(EngineConfig { max_turns_per_episode: cap, ..(*runner.config).clone() });
        }
        runner.run_episode().await
    }
}

fn mean_score_for(result: &EpochResult, agent_id: &str) -> f64 {
    result.score_for(agent_id).unwrap_or(0) as f64
}

fn mean_roster_score(result: &EpochResult, actors: &[PrimaryActor]) -> f64 {
    let scores: Vec<f64> = actors.iter().filter_map(|a| result.score_for(&a.agent_id)).map(|s| s as f64).collect();
    concord_stats::mean(&scores)
}

struct ActorMutationTrial {
    agent_id: String,
    variant: MutationVariant,
    shadow_scores: Vec<f64>,
}

/// Phase A (propose) + Phase B (successive-halving shadow trials) for one
/// primary actor. Runs entirely against a cloned `EpisodeRunner`, so it is
/// safe to drive many of these concurrently under the orchestrator's
/// scheduler — only Phase C (the acceptance gate, which touches the
/// per-actor `Mutator`'s plateau counter) happens back on the main task
/// after every actor's trial has finished.
async fn run_mutation_trial(
    base_actor: PrimaryActor,
    epoch_results: Vec<EpochResult>,
    runner: EpisodeRunner,
    mutator_gateway: Arc<ModelGateway>,
    variant_count: usize,
    shadow_trial_count: usize,
    lambda: f64,
) -> Option<ActorMutationTrial> {
    let agent_id = base_actor.agent_id.clone();
    let scout = Mutator::default();
    let proposal = match scout
        .propose_variants(&mutator_gateway, &agent_id, base_actor.strategy(), &epoch_results, variant_count)
        .await
    {
        Ok(p) => p,
        Err(err) => {
            warn!(agent_id = %agent_id, error = %err, "mutator failed to propose variants; no rewrite attempted this generation");
            return None;
        }
    };

    // Phase B, fast prune: 3 episodes capped at 3 turns, keep the top half by mean score.
    let mut pruned: Vec<(MutationVariant, f64)> = Vec::with_capacity(proposal.variants.len());
    for variant in &proposal.variants {
        let candidate = base_actor.with_mutated_strategy(variant.strategy_text.clone(), variant.hyperparameters.clone());
        let mut scores = Vec::new();
        for _ in 0..3 {
            if let Some(result) = runner.run_episode_with_substitute(&candidate, Some(3)).await {
                scores.push(mean_score_for(&result, &agent_id));
            }
        }
        pruned.push((variant.clone(), concord_stats::mean(&scores)));
    }
    pruned.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let keep = ((pruned.len() as f64) / 2.0).ceil().max(1.0) as usize;
    let survivors: Vec<MutationVariant> = pruned.into_iter().take(keep).map(|(v, _)| v).collect();

    // Full shadow trials for survivors; select the highest-LCB variant.
    let mut best: Option<(MutationVariant, Vec<f64>, f64)> = None;
    for variant in survivors {
        let candidate = base_actor.with_mutated_strategy(variant.strategy_text.clone(), variant.hyperparameters.clone());
        let mut scores = Vec::new();
        for _ in 0..shadow_trial_count {
            if let Some(result) = runner.run_episode_with_substitute(&candidate, None).await {
                scores.push(mean_score_for(&result, &agent_id));
            }
        }
        let lcb = concord_stats::lower_confidence_bound(&scores, lambda);
        let better = best.as_ref().map(|(_, _, b)| lcb > *b).unwrap_or(true);
        if better {
            best = Some((variant, scores, lcb));
        }
    }

    best.map(|(variant, shadow_scores, _)| ActorMutationTrial { agent_id, variant, shadow_scores })
}

/// The generation loop (§4.9). Owns the current roster, the per-actor
/// Mutators (so plateau counters never race — each actor's is written only
/// by its own Mutator instance), and the durable Creation record.
pub struct Orchestrator {
    config: Arc<EngineConfig>,
    wiring: OrchestratorWiring,
    scheduler: Scheduler,
    critic: Arc<Critic>,
    provisioner: Provisioner,
    explorer: Option<Explorer>,
    mutators: std::collections::HashMap<String, Mutator>,
    capitalizer_enabled: bool,
    tension_disruptor_enabled: bool,
    info_disruptor_enabled: bool,
    initial_state: StateObject,
    primary_actors: Vec<PrimaryActor>,
    created_agents: Vec<NewAgentProvisioning>,
    failed_archetypes: Vec<String>,
    ingredient_pool: Vec<Ingredient>,
    /// `require_human_approval_for_creation` gate. The core has no notion of
    /// a terminal prompt; callers inject one (an interactive CLI prompt, a
    /// scripted always-true/always-false closure in tests).
    approval_gate: Box<dyn Fn(&NewAgentProvisioning) -> bool + Send + Sync>,
    store: Option<RelationalStore>,
    generation: u32,
    /// Generation number the last *attempted* creation ran at (accepted or
    /// rejected), so `creation_cooldown_generations` can space out repeat
    /// Provisioner calls even while every actor stays plateaued.
    last_creation_generation: Option<u32>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<EngineConfig>,
        wiring: OrchestratorWiring,
        scenario: &ScenarioConfig,
        ingredient_pool: Vec<Ingredient>,
        approval_gate: Box<dyn Fn(&NewAgentProvisioning) -> bool + Send + Sync>,
        store: Option<RelationalStore>,
    ) -> Self {
        let primary_actors: Vec<PrimaryActor> = scenario
            .actors
            .iter()
            .map(|seed| {
                PrimaryActor::new(
                    seed.agent_id.clone(),
                    seed.immutable_core.clone(),
                    seed.initial_strategy.clone(),
                    seed.hyperparameters.clone(),
                )
            })
            .collect();
        let mutators = scenario.actors.iter().map(|seed| (seed.agent_id.clone(), Mutator::default())).collect();
        let explorer = scenario.explorer_enabled.then(Explorer::default);

        Self {
            scheduler: Scheduler::new(config.max_concurrency),
            critic: Arc::new(Critic::default()),
            provisioner: Provisioner::default(),
            explorer,
            mutators,
            capitalizer_enabled: scenario.capitalizer_enabled,
            tension_disruptor_enabled: scenario.tension_disruptor_enabled,
            info_disruptor_enabled: scenario.info_disruptor_enabled,
            initial_state: StateObject::new(scenario.initial_variables.clone()),
            primary_actors,
            created_agents: Vec::new(),
            failed_archetypes: Vec::new(),
            ingredient_pool,
            approval_gate,
            store,
            generation: 0,
            last_creation_generation: None,
            config,
            wiring,
        }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn state(&self) -> &StateObject {
        &self.initial_state
    }

    fn episode_runner(&self) -> EpisodeRunner {
        EpisodeRunner {
            initial_state: self.initial_state.deep_copy(),
            actors: self.primary_actors.clone(),
            created_agents: self.created_agents.clone(),
            config: self.config.clone(),
            episode_gateway: self.wiring.episode_gateway.clone(),
            critic_gateway: self.wiring.critic_gateway.clone(),
            critic: self.critic.clone(),
            capitalizer_enabled: self.capitalizer_enabled,
            tension_disruptor_enabled: self.tension_disruptor_enabled,
            info_disruptor_enabled: self.info_disruptor_enabled,
        }
    }

    /// Run one generation: Execution, Mutation, Creation, Explorer sweep
    /// (§4.9). Each phase can short-circuit the ones after it, per spec.
    pub async fn run_generation(&mut self) -> Result<GenerationOutcome, OrchestratorError> {
        if self.primary_actors.is_empty() {
            return Err(OrchestratorError::EmptyRoster);
        }
        self.generation += 1;
        info!(generation = self.generation, "starting generation");

        let epoch_results = self.run_epoch().await?;
        let agreement_short_circuit = !epoch_results.is_empty()
            && epoch_results.iter().all(|r| r.termination_reason == TerminationReason::Agreement);

        if let Some(store) = &self.store {
            let all_scores: Vec<f64> =
                epoch_results.iter().map(|r| mean_roster_score(r, &self.primary_actors)).collect();
            let baseline_mean = concord_stats::mean(&all_scores);
            let generation_id = store.record_generation(self.generation as i64, Some(baseline_mean), None)?;
            self.persist_episodes(store, generation_id, &epoch_results)?;
        }

        if agreement_short_circuit {
            info!(generation = self.generation, "every episode reached agreement; skipping mutation and creation");
            let explorer_ran = self.maybe_run_explorer().await;
            return Ok(GenerationOutcome {
                generation: self.generation,
                epoch_results,
                agreement_short_circuit: true,
                mutations: Vec::new(),
                creation: CreationOutcome::Skipped,
                explorer_ran,
            });
        }

        let mutations = self.run_mutation_phase(&epoch_results).await?;
        let any_accepted = mutations.iter().any(|m| m.accepted_variant_id.is_some());

        let creation = if any_accepted {
            CreationOutcome::Skipped
        } else {
            self.run_creation_phase(&epoch_results).await?
        };

        let explorer_ran = self.maybe_run_explorer().await;

        Ok(GenerationOutcome {
            generation: self.generation,
            epoch_results,
            agreement_short_circuit: false,
            mutations,
            creation,
            explorer_ran,
        })
    }

    /// §4.9 step 1: fan out `epoch_size` episodes under `max_concurrency`.
    async fn run_epoch(&self) -> Result<Vec<EpochResult>, OrchestratorError> {
        let runner = self.episode_runner();
        let tasks: Vec<_> = (0..self.config.epoch_size)
            .map(|_| {
                let runner = runner.clone();
                move || async move { runner.run_episode().await }
            })
            .collect();
        let results = self.scheduler.run_all(tasks).await;
        Ok(results.into_iter().flatten().collect())
    }

    /// §4.9 step 2: one Mutator trial per primary actor, in parallel; Phase
    /// C's acceptance gate runs sequentially afterward since it mutates
    /// each actor's plateau counter.
    async fn run_mutation_phase(&mut self, epoch_results: &[EpochResult]) -> Result<Vec<MutationOutcome>, OrchestratorError> {
        let runner = self.episode_runner();
        let variant_count = self.config.mutation_variants;
        let shadow_trial_count = self.config.shadow_trial_count;
        let lambda = self.config.acceptance_lcb_lambda;
        let mutator_gateway = self.wiring.mutator_gateway.clone();

        let tasks: Vec<_> = self
            .primary_actors
            .iter()
            .cloned()
            .map(|actor| {
                let runner = runner.clone();
                let epoch_results = epoch_results.to_vec();
                let mutator_gateway = mutator_gateway.clone();
                move || async move {
                    run_mutation_trial(actor, epoch_results, runner, mutator_gateway, variant_count, shadow_trial_count, lambda).await
                }
            })
            .collect();
        let trials = self.scheduler.run_all(tasks).await;

        let mut outcomes = Vec::with_capacity(trials.len());
        for trial in trials.into_iter().flatten() {
            let baseline: Vec<f64> = epoch_results.iter().filter_map(|r| r.score_for(&trial.agent_id)).map(|s| s as f64).collect();
            let mutator = self.mutators.get_mut(&trial.agent_id).expect("mutator exists for every mounted primary actor");
            let verdict = mutator.evaluate_acceptance(
                &trial.shadow_scores,
                &baseline,
                lambda,
                self.config.improvement_margin,
                self.config.acceptance_p_value_threshold,
            );

            if verdict.accepted {
                if let Some(slot) = self.primary_actors.iter_mut().find(|a| a.agent_id == trial.agent_id) {
                    *slot = slot.with_mutated_strategy(trial.variant.strategy_text.clone(), trial.variant.hyperparameters.clone());
                }
                if let Some(store) = &self.store {
                    store.upsert_agent_profile(
                        &trial.agent_id,
                        "primary",
                        &trial.variant.strategy_text,
                        &trial.variant.hyperparameters,
                        false,
                    )?;
                    store.record_generation(self.generation as i64, None, Some(trial.variant.variant_id.as_str()))?;
                }
                info!(agent_id = %trial.agent_id, variant_id = %trial.variant.variant_id, lcb = verdict.lower_confidence_bound, "mutation accepted");
                outcomes.push(MutationOutcome { agent_id: trial.agent_id, accepted_variant_id: Some(trial.variant.variant_id) });
            } else {
                outcomes.push(MutationOutcome { agent_id: trial.agent_id, accepted_variant_id: None });
            }
        }
        Ok(outcomes)
    }

    /// §4.9 step 3: triggered only once every primary actor's Mutator has
    /// plateaued. Gated on human approval, then shadow-tested the same way
    /// a mutation variant is, but against per-episode roster-mean scores
    /// rather than one actor's per-trial scores (a different baseline
    /// shape, so this computes its own LCB/Mann-Whitney pair directly
    /// instead of routing through `Mutator::evaluate_acceptance`).
    async fn run_creation_phase(&mut self, epoch_results: &[EpochResult]) -> Result<CreationOutcome, OrchestratorError> {
        let all_plateaued = self.mutators.values().all(|m| m.is_plateaued(self.config.creation_patience));
        if !all_plateaued {
            return Ok(CreationOutcome::Skipped);
        }
        if let Some(last) = self.last_creation_generation {
            if self.generation.saturating_sub(last) < self.config.creation_cooldown_generations {
                return Ok(CreationOutcome::Skipped);
            }
        }
        self.last_creation_generation = Some(self.generation);

        let spec = self
            .provisioner
            .design(&self.wiring.provisioner_gateway, &self.initial_state, epoch_results, &self.failed_archetypes)
            .await?;

        if self.config.require_human_approval_for_creation && !(self.approval_gate)(&spec) {
            info!(agent_id = %spec.agent_id, "creation rejected by approval gate");
            self.failed_archetypes.push(spec.archetype.clone());
            return Ok(CreationOutcome::Rejected { archetype: spec.archetype });
        }

        let mut trial_runner = self.episode_runner();
        trial_runner.created_agents.push(spec.clone());

        let mut shadow_scores = Vec::with_capacity(self.config.shadow_trial_count);
        for _ in 0..self.config.shadow_trial_count {
            if let Some(result) = trial_runner.run_episode().await {
                shadow_scores.push(mean_roster_score(&result, &self.primary_actors));
            }
        }
        let baseline: Vec<f64> = epoch_results.iter().map(|r| mean_roster_score(r, &self.primary_actors)).collect();
        let lcb = concord_stats::lower_confidence_bound(&shadow_scores, self.config.acceptance_lcb_lambda);
        let baseline_mean = concord_stats::mean(&baseline);
        let p_value = concord_stats::mann_whitney_u_test(&shadow_scores, &baseline);
        let accepted = lcb > baseline_mean + self.config.improvement_margin && p_value < self.config.acceptance_p_value_threshold;

        if accepted {
            self.created_agents.push(spec.clone());
            if let Some(store) = &self.store {
                store.record_created_agent(self.generation as i64, &spec)?;
            }
            info!(agent_id = %spec.agent_id, archetype = %spec.archetype, lcb, p_value, "new agent accepted and mounted");
            Ok(CreationOutcome::Accepted { agent_id: spec.agent_id, archetype: spec.archetype })
        } else {
            self.failed_archetypes.push(spec.archetype.clone());
            info!(archetype = %spec.archetype, lcb, p_value, "new agent rejected; archetype recorded as failed");
            Ok(CreationOutcome::Rejected { archetype: spec.archetype })
        }
    }

    /// §4.9 step 4, on the configured generation cadence.
    async fn maybe_run_explorer(&mut self) -> bool {
        let Some(explorer) = &self.explorer else {
            return false;
        };
        let interval = self.config.scout_sweep_interval_generations.max(1);
        if self.generation % interval != 0 {
            return false;
        }
        let proposal = explorer.scan(&self.wiring.explorer_gateway, &self.ingredient_pool).await;
        self.initial_state.scout_hypotheses = Some(
            proposal
                .hypotheses
                .into_iter()
                .map(|h| ScoutHypothesis {
                    title: h.title,
                    feasibility_score: h.feasibility_score,
                    disruption_target: h.disruption_target,
                })
                .collect(),
        );
        info!(generation = self.generation, "explorer sweep overwrote scout hypotheses");
        true
    }

    fn persist_episodes(&self, store: &RelationalStore, generation_id: i64, epoch_results: &[EpochResult]) -> Result<(), OrchestratorError> {
        let agent_a = self.primary_actors.first().map(|a| a.agent_id.clone()).unwrap_or_default();
        let agent_b = self.primary_actors.get(1).map(|a| a.agent_id.clone()).unwrap_or_else(|| agent_a.clone());
        for (index, result) in epoch_results.iter().enumerate() {
            let episode_id = format!("gen{}-ep{}", self.generation, index);
            store.record_episode(&episode_id, generation_id, &agent_a, &agent_b, result)?;
        }
        Ok(())
    }
}

/// Convenience for callers building a `NewAgentProvisioning`-shaped actor
/// outside the Provisioner's own path (not currently used internally, kept
/// for test fixtures that want a created-agent `PrimaryActor` without going
/// through `Environment::mount_agent`).
#[cfg(test)]
fn actor_from_provisioning(spec: &NewAgentProvisioning) -> PrimaryActor {
    PrimaryActor::new(spec.agent_id.clone(), spec.system_prompt.clone(), format!("Core goals: {}", spec.core_goals.join(", ")), Hyperparameters::default())
}
