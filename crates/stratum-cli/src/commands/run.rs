//! Run command.

use anyhow::Context;
use clap::Args;
use std::fs;
use std::path::PathBuf;
use stratum_format::CompiledProgram;
use stratum_kit::{solver_named, Assignment, Machine};

use crate::config::CliConfig;

#[derive(Args)]
pub struct RunArgs {
    /// Compiled program file
    #[arg(required = true)]
    pub input: PathBuf,

    /// JSON file with values to pin before solving
    #[arg(short, long)]
    pub assign: Option<PathBuf>,

    /// Number of solutions to find
    #[arg(short = 'n', long)]
    pub solutions: Option<usize>,

    /// Solver to use: `embedded` or an executable name
    #[arg(short, long)]
    pub solver: Option<String>,

    /// Extra argument for an external solver (repeatable)
    #[arg(long = "solver-arg")]
    pub solver_args: Vec<String>,

    /// Output file for the decoded solutions
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: RunArgs, config: &CliConfig) -> anyhow::Result<()> {
    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let program = CompiledProgram::from_json(&content)?;

    let assignment: Assignment = match &args.assign {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).context("parsing assignment")?
        }
        None => Assignment::new(),
    };

    let name = args.solver.as_deref().unwrap_or(&config.solver);
    let solver_args = if args.solver_args.is_empty() {
        &config.solver_args
    } else {
        &args.solver_args
    };
    let count = args.solutions.unwrap_or(config.solutions);
    tracing::info!("Running with solver {}, looking for {} solution(s)", name, count);

    let machine = Machine::new(solver_named(name, solver_args));
    let rendered = if count == 1 {
        serde_json::to_string_pretty(&machine.run_once(&program, &assignment)?)?
    } else {
        let solutions = machine.run(&program, &assignment, count)?;
        tracing::info!("Found {} solution(s)", solutions.len());
        serde_json::to_string_pretty(&solutions)?
    };

    super::emit(args.output.as_deref(), &rendered)
}
