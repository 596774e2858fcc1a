//! Stratum CLI - compile constraint programs and solve them.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stratum")]
#[command(author, version, about = "Compile constraint programs to SAT and solve them", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a program down to CNF
    Compile(commands::compile::CompileArgs),
    /// Solve a compiled program and decode the solutions
    Run(commands::run::RunArgs),
    /// Solve a raw DIMACS file
    Solve(commands::solve::SolveArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over -v
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::CliConfig::load()?;

    match cli.command {
        Commands::Compile(args) => commands::compile::run(args),
        Commands::Run(args) => commands::run::run(args, &config),
        Commands::Solve(args) => commands::solve::run(args, &config),
    }
}
