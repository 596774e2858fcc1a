//! Solve command.

use clap::Args;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use stratum_format::DimacsCnf;
use stratum_kit::{solver_named, SatSolver};

use crate::config::CliConfig;

#[derive(Args)]
pub struct SolveArgs {
    /// DIMACS CNF file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Solver to use: `embedded` or an executable name
    #[arg(short, long)]
    pub solver: Option<String>,

    /// Output file for the solution
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: SolveArgs, config: &CliConfig) -> anyhow::Result<()> {
    tracing::info!("Loading problem from {:?}", args.input);
    let content = fs::read_to_string(&args.input)?;
    let dimacs = DimacsCnf::from_str(&content)?;
    tracing::info!(
        "Loaded DIMACS: {} vars, {} clauses",
        dimacs.num_vars,
        dimacs.clauses.len()
    );

    let name = args.solver.as_deref().unwrap_or(&config.solver);
    let solver = solver_named(name, &config.solver_args);

    let start = Instant::now();
    let literals = solver.solve(&dimacs.to_dimacs())?;
    let elapsed = start.elapsed();

    let report = if literals.is_empty() {
        "s UNSATISFIABLE".to_string()
    } else {
        let values: Vec<String> = literals.iter().map(ToString::to_string).collect();
        format!("s SATISFIABLE\nv {} 0", values.join(" "))
    };

    tracing::info!("Solved in {:?}", elapsed);
    super::emit(args.output.as_deref(), &report)?;
    println!("c Time: {:.3}s", elapsed.as_secs_f64());
    Ok(())
}
