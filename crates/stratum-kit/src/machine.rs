//! Runs compiled programs against a solver.

use std::collections::HashSet;

use stratum_base::{Literal, Result};
use stratum_format::{CompiledProgram, DimacsCnf};
use stratum_runtime::{self as runtime, Assignment};
use tracing::{debug, info};

use crate::solver::SatSolver;

/// Drives encode → solve → decode for one compiled program.
pub struct Machine<S> {
    solver: S,
}

impl<S: SatSolver> Machine<S> {
    pub fn new(solver: S) -> Self {
        Self { solver }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Finds up to `count` distinct solutions under the given assignment.
    ///
    /// Each model is excluded from the next round by a clause over the
    /// exposed Level-1 literals. Models that differ only in bits the decoded
    /// document does not show decode alike and are skipped. Enumeration
    /// stops at the first unsatisfiable round, so an unsatisfiable program
    /// yields no solutions.
    pub fn run(
        &self,
        program: &CompiledProgram,
        assignment: &Assignment,
        count: usize,
    ) -> Result<Vec<Assignment>> {
        let metadata = &program.metadata;
        let mut cnf = DimacsCnf::from_str(&program.dimacs)?;
        for lit in runtime::encode(metadata, assignment)? {
            cnf.add_clause(vec![lit]);
        }

        let mut solutions = Vec::new();
        while solutions.len() < count {
            let result = self.solver.solve(&cnf.to_dimacs())?;
            if result.is_empty() {
                debug!(solver = self.solver.name(), "no further solutions");
                break;
            }
            let decoded = runtime::decode(metadata, &result)?;
            if solutions.contains(&decoded) {
                debug!(solver = self.solver.name(), "skipping repeated solution");
            } else {
                solutions.push(decoded);
                info!(
                    solver = self.solver.name(),
                    found = solutions.len(),
                    "solution found"
                );
            }

            let blocking = blocking_clause(metadata.level1_variables.values(), &result);
            if blocking.is_empty() {
                break;
            }
            cnf.add_clause(blocking);
        }
        Ok(solutions)
    }

    /// Solves once and decodes the raw result; an unsatisfiable program
    /// decodes to an empty document.
    pub fn run_once(&self, program: &CompiledProgram, assignment: &Assignment) -> Result<Assignment> {
        Ok(self
            .run(program, assignment, 1)?
            .pop()
            .unwrap_or_default())
    }
}

/// The clause that rules out the current values of `exposed`.
fn blocking_clause<'a>(
    exposed: impl Iterator<Item = &'a Literal>,
    result: &[Literal],
) -> Vec<Literal> {
    let truths: HashSet<Literal> = result.iter().copied().collect();
    let mut clause: Vec<Literal> = exposed
        .map(|&lit| if truths.contains(&lit) { -lit } else { lit })
        .collect();
    clause.sort_unstable_by_key(|l| l.unsigned_abs());
    clause.dedup();
    clause
}
