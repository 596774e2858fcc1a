//! Compile command.

use anyhow::Context;
use clap::Args;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use stratum_compiler::{level1, level2, level3};
use stratum_format::{CompiledProgram, Program};

#[derive(Args)]
pub struct CompileArgs {
    /// Program file (JSON)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Abstraction level the program is written at
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub level: u8,

    /// Output file for the compiled program
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: CompileArgs) -> anyhow::Result<()> {
    tracing::info!("Loading level {} program from {:?}", args.level, args.input);
    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let start = Instant::now();
    let compiled = compile_at(args.level, &content)?;
    tracing::info!(
        "Compiled in {:?}: {} level-1 variables",
        start.elapsed(),
        compiled.metadata.level1_variables.len()
    );

    super::emit(args.output.as_deref(), &compiled.to_json()?)
}

fn compile_at(level: u8, content: &str) -> anyhow::Result<CompiledProgram> {
    let compiled = match level {
        1 => level1::compile(Program::<level1::Instruction>::from_json(content)?)?,
        2 => level1::compile(level2::compile(Program::<level2::Instruction>::from_json(
            content,
        )?)?)?,
        _ => stratum_compiler::compile(Program::<level3::Instruction>::from_json(content)?)?,
    };
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiles_each_level() {
        let level1 = r#"{"instructions": [{"type": "push", "symbol": "a"}, {"type": "variable", "symbol": "a"}]}"#;
        let compiled = compile_at(1, level1).unwrap();
        assert_eq!(compiled.metadata.level1_variables["a"], 1);

        let level3 = r#"{"instructions": [
            {"type": "boolean", "symbol": "flag"},
            {"type": "variable", "symbol": "flag"}
        ]}"#;
        let compiled = compile_at(3, level3).unwrap();
        assert!(compiled.metadata.level3_variables.contains_key("flag"));
    }

    #[test]
    fn test_level_mismatch_is_reported() {
        let level3 = r#"{"instructions": [{"type": "getIndex", "index": 0}]}"#;
        assert!(compile_at(1, level3).is_err());
    }
}
