// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands, ReportFormatArg};
use concord_gateway::{ModelGateway, ProviderRegistry};
use concord_memory::RelationalStore;
use concord_orchestrator::{CreationOutcome, GenerationOutcome, Orchestrator, OrchestratorWiring};
use concord_schema::NewAgentProvisioning;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(cmd) = &cli.command {
        match cmd {
            Commands::Completions { shell } => {
                cli::print_completions(*shell);
                return Ok(());
            }
            Commands::ShowConfig => {
                let config = concord_config::load(cli.config.as_deref())?;
                println!("{}", serde_yaml::to_string(&config).unwrap_or_default());
                return Ok(());
            }
            Commands::ValidateScenario { file } => {
                return validate_scenario(file);
            }
        }
    }

    let scenario_path = cli
        .scenario
        .as_ref()
        .context("a scenario file is required (pass it as the first argument, or use a subcommand)")?;
    run(cli.clone_for_run(), scenario_path).await
}

impl Cli {
    /// Extracted fields the run path needs, so `main` doesn't borrow `cli`
    /// across the subcommand match and the run call.
    fn clone_for_run(&self) -> RunArgs {
        RunArgs {
            config: self.config.clone(),
            generations: self.generations,
            store: self.store.clone(),
            auto_approve_creation: self.auto_approve_creation,
            report_format: self.report_format,
        }
    }
}

struct RunArgs {
    config: Option<std::path::PathBuf>,
    generations: Option<u32>,
    store: Option<std::path::PathBuf>,
    auto_approve_creation: bool,
    report_format: ReportFormatArg,
}

async fn run(args: RunArgs, scenario_path: &std::path::Path) -> anyhow::Result<()> {
    let config = concord_config::load(args.config.as_deref())?;
    let scenario = concord_config::load_scenario(scenario_path)?;

    let mut engine = config.engine.clone();
    if let Some(generations) = args.generations {
        engine.max_generations = generations;
    }
    let engine = Arc::new(engine);

    let registry = ProviderRegistry::from_config(&config);
    let wiring = OrchestratorWiring {
        episode_gateway: Arc::new(ModelGateway::new(registry.for_role("episode"))),
        critic_gateway: Arc::new(ModelGateway::new(registry.for_role("critic"))),
        mutator_gateway: Arc::new(ModelGateway::new(registry.for_role("mutator"))),
        provisioner_gateway: Arc::new(ModelGateway::new(registry.for_role("provisioner"))),
        explorer_gateway: Arc::new(ModelGateway::new(registry.for_role("explorer"))),
    };

    let store = match &args.store {
        Some(path) => Some(RelationalStore::open(path).with_context(|| format!("opening store {}", path.display()))?),
        None => None,
    };

    let approval_gate: Box<dyn Fn(&NewAgentProvisioning) -> bool + Send + Sync> = if args.auto_approve_creation {
        Box::new(|_| true)
    } else {
        Box::new(prompt_approval)
    };

    let mut orchestrator = Orchestrator::new(engine.clone(), wiring, &scenario, Vec::new(), approval_gate, store);

    info!(scenario = %scenario.name, generations = engine.max_generations, "starting run");

    for _ in 0..engine.max_generations {
        let outcome = orchestrator.run_generation().await?;
        print_report(&outcome, args.report_format);
    }

    Ok(())
}

/// Prompt the operator on stdin before mounting a Provisioner-designed
/// agent. Defaults to rejecting on a non-interactive terminal or any input
/// read failure, since silently admitting a new participant is the more
/// dangerous failure mode.
fn prompt_approval(spec: &NewAgentProvisioning) -> bool {
    println!("\nProvisioner proposes a new agent:");
    println!("  id:        {}", spec.agent_id);
    println!("  archetype: {}", spec.archetype);
    println!("  rationale: {}", spec.design_rationale);
    println!("  goals:     {}", spec.core_goals.join(", "));
    print!("Mount this agent? [y/N] ");
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        warn!("failed to read approval prompt; rejecting by default");
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_report(outcome: &GenerationOutcome, format: ReportFormatArg) {
    match format {
        ReportFormatArg::Text => {
            println!(
                "generation {}: {} episodes, agreement_short_circuit={}, mutations_accepted={}/{}, creation={:?}, explorer_ran={}",
                outcome.generation,
                outcome.epoch_results.len(),
                outcome.agreement_short_circuit,
                outcome.mutations.iter().filter(|m| m.accepted_variant_id.is_some()).count(),
                outcome.mutations.len(),
                outcome.creation,
                outcome.explorer_ran,
            );
        }
        ReportFormatArg::Jsonl => {
            #[derive(serde::Serialize)]
            struct Report<'a> {
                generation: u32,
                episode_count: usize,
                agreement_short_circuit: bool,
                mutations_accepted: usize,
                mutations_total: usize,
                explorer_ran: bool,
                creation: &'a CreationOutcome,
            }
            let report = Report {
                generation: outcome.generation,
                episode_count: outcome.epoch_results.len(),
                agreement_short_circuit: outcome.agreement_short_circuit,
                mutations_accepted: outcome.mutations.iter().filter(|m| m.accepted_variant_id.is_some()).count(),
                mutations_total: outcome.mutations.len(),
                explorer_ran: outcome.explorer_ran,
                creation: &outcome.creation,
            };
            println!("{}", serde_json::to_string(&report).unwrap_or_default());
        }
    }
}

/// Parse and validate a scenario file without running anything.
fn validate_scenario(file: &std::path::Path) -> anyhow::Result<()> {
    let scenario = concord_config::load_scenario(file)?;
    println!("Scenario: {}", scenario.name);
    println!("Actors: {}", scenario.actors.len());
    for actor in &scenario.actors {
        println!("  {} — {}", actor.agent_id, actor.initial_strategy);
    }
    println!(
        "Meta-agents: capitalizer={} tension_disruptor={} info_disruptor={} explorer={}",
        scenario.capitalizer_enabled, scenario.tension_disruptor_enabled, scenario.info_disruptor_enabled, scenario.explorer_enabled,
    );
    println!("\nScenario is valid.");
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
