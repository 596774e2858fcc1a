//! SAT solver adapters.
//!
//! A solver takes DIMACS text and answers with the literals of one
//! satisfying assignment, or an empty list when there is none.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;

use stratum_base::{Error, Literal, Result};
use stratum_cdcl::{CdclConfig, CdclSolver, SatResult};
use stratum_format::{parse_solver_output, DimacsCnf};
use tracing::debug;

/// Anything that can decide a DIMACS problem.
pub trait SatSolver {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Solves the problem. An empty result means unsatisfiable.
    fn solve(&self, dimacs: &str) -> Result<Vec<Literal>>;
}

/// The in-process CDCL engine.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedSolver {
    pub config: CdclConfig,
}

impl EmbeddedSolver {
    pub fn with_config(config: CdclConfig) -> Self {
        Self { config }
    }
}

impl SatSolver for EmbeddedSolver {
    fn name(&self) -> &str {
        "embedded"
    }

    fn solve(&self, dimacs: &str) -> Result<Vec<Literal>> {
        let problem = DimacsCnf::from_str(dimacs)?;
        let mut cdcl = CdclSolver::with_config(&problem, self.config.clone());
        match cdcl.solve()? {
            SatResult::Sat(model) => Ok(model
                .iter()
                .enumerate()
                .map(|(i, &value)| {
                    let var = i as Literal + 1;
                    if value {
                        var
                    } else {
                        -var
                    }
                })
                .collect()),
            SatResult::Unsat => Ok(Vec::new()),
            SatResult::Unknown(reason) => Err(Error::Solver(reason)),
        }
    }
}

/// An external solver that reads DIMACS on stdin and prints
/// competition-format output (`s SATISFIABLE` and `v` lines).
#[derive(Debug, Clone)]
pub struct ProcessSolver {
    program: String,
    args: Vec<String>,
}

impl ProcessSolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra command-line arguments passed before the problem is piped in.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl SatSolver for ProcessSolver {
    fn name(&self) -> &str {
        &self.program
    }

    fn solve(&self, dimacs: &str) -> Result<Vec<Literal>> {
        debug!(solver = %self.program, args = ?self.args, "spawning solver");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => Error::SolverUnavailable {
                    name: self.program.clone(),
                    hint: format!(
                        "install `{}` and make sure it is on your PATH, or use the embedded solver",
                        self.program
                    ),
                },
                _ => Error::Io(e),
            })?;

        // Stdin is fed from its own thread; the child is always waited on.
        let stdin = child.stdin.take();
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(dimacs.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (writer.join(), output)
        });
        let output = output?;
        let written = written
            .map_err(|_| Error::Solver(format!("{}: writing the problem panicked", self.program)))?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        if let Err(e) = written {
            return Err(match e.kind() {
                ErrorKind::BrokenPipe => Error::Solver(format!(
                    "{} closed its input early and exited with {}; {}",
                    self.program,
                    output.status,
                    stderr.trim()
                )),
                _ => Error::Io(e),
            });
        }

        // Competition solvers exit with 10 (SAT) or 20 (UNSAT); trust the output.
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_solver_output(&stdout).map_err(|e| {
            Error::Solver(format!(
                "{} exited with {}: {e}; {}",
                self.program,
                output.status,
                stderr.trim()
            ))
        })
    }
}

/// Picks an adapter by name: `embedded` or an executable.
pub fn solver_named(name: &str, args: &[String]) -> Box<dyn SatSolver> {
    if name == "embedded" {
        Box::new(EmbeddedSolver::default())
    } else {
        Box::new(ProcessSolver::new(name).args(args.iter().cloned()))
    }
}

impl<S: SatSolver + ?Sized> SatSolver for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, dimacs: &str) -> Result<Vec<Literal>> {
        (**self).solve(dimacs)
    }
}
