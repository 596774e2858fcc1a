//! Parsing of external solver output.
//!
//! Understands the SAT-competition layout (`s SATISFIABLE` plus `v` lines)
//! and the bare `SAT`/`UNSAT` result files some solvers write instead.

use stratum_base::{Error, Literal, Result};

/// Parses solver output.
///
/// Returns an empty list for an unsatisfiable instance and the assigned
/// literals otherwise.
pub fn parse_solver_output(output: &str) -> Result<Vec<Literal>> {
    let mut status: Option<bool> = None;
    let mut literals = Vec::new();

    for line in output.lines().map(str::trim) {
        match line {
            "s SATISFIABLE" | "SAT" | "SATISFIABLE" => status = Some(true),
            "s UNSATISFIABLE" | "UNSAT" | "UNSATISFIABLE" => status = Some(false),
            _ if line.starts_with("v ") || line.starts_with("v\t") => {
                literals.extend(parse_literals(&line[1..])?);
            }
            _ if status == Some(true) && looks_like_literals(line) => {
                literals.extend(parse_literals(line)?);
            }
            _ => {}
        }
    }

    match status {
        Some(true) => Ok(literals),
        Some(false) => Ok(Vec::new()),
        None => Err(Error::Solver("no satisfiability status in solver output".into())),
    }
}

fn looks_like_literals(line: &str) -> bool {
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_ascii_digit() || c == '-' || c.is_whitespace())
}

fn parse_literals(text: &str) -> Result<Vec<Literal>> {
    text.split_whitespace()
        .map(|token| {
            token
                .parse::<Literal>()
                .map_err(|e| Error::Solver(format!("Invalid literal '{token}': {e}")))
        })
        .filter(|lit| !matches!(lit, Ok(0)))
        .collect()
}
