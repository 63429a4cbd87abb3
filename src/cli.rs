// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};

/// Output format for the generation report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormatArg {
    /// Human-readable summary, one line per generation.
    #[default]
    Text,
    /// One JSON object per generation (suitable for piping into jq).
    Jsonl,
}

#[derive(Parser, Debug)]
#[command(
    name = "concord",
    about = "Runs a turn-based multi-agent negotiation and evolution simulation",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the scenario file describing the initial state and actor roster.
    #[arg(value_name = "SCENARIO")]
    pub scenario: Option<PathBuf>,

    /// Path to the engine config file (overrides auto-discovery).
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Number of generations to run. Overrides `engine.max_generations`.
    #[arg(long, short = 'n')]
    pub generations: Option<u32>,

    /// Path to a SQLite file to persist generation/episode/agent history.
    /// Omit to run without persistence.
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Auto-approve every Provisioner creation proposal instead of prompting
    /// on stdin. Only meaningful when `require_human_approval_for_creation`
    /// is set in the engine config.
    #[arg(long)]
    pub auto_approve_creation: bool,

    /// Report format.
    #[arg(long, value_enum, default_value = "text")]
    pub report_format: ReportFormatArg,

    /// Increase verbosity (-v = debug, -vv = trace).
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effective engine configuration and exit.
    ShowConfig,

    /// Parse and validate a scenario file, then exit without running anything.
    ValidateScenario {
        /// Path to the scenario file to validate.
        #[arg(value_name = "SCENARIO")]
        file: PathBuf,
    },

    /// Generate a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "concord", &mut std::io::stdout());
}
