//! DIMACS CNF format parser and writer.
//!
//! Standard format used in SAT competitions.

use stratum_base::{Error, Literal, Result};
use std::fmt::Write as _;
use std::io::{BufRead, BufReader, Read};

/// A DIMACS CNF formula.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimacsCnf {
    /// Number of variables.
    pub num_vars: usize,
    /// Clauses as vectors of literals.
    pub clauses: Vec<Vec<Literal>>,
}

impl DimacsCnf {
    /// Parses DIMACS CNF from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut num_vars = 0;
        let mut clauses = Vec::new();
        let mut header_found = false;
        let mut clause = Vec::new();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('c') {
                continue;
            }

            if line.starts_with('p') {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 4 && parts[1] == "cnf" {
                    num_vars = parts[2].parse().map_err(|e| {
                        Error::Serialization(format!("Invalid variable count: {e}"))
                    })?;
                    let num_clauses: usize = parts[3]
                        .parse()
                        .map_err(|e| Error::Serialization(format!("Invalid clause count: {e}")))?;
                    header_found = true;
                    clauses.reserve(num_clauses);
                }
                continue;
            }

            if !header_found {
                return Err(Error::Serialization(
                    "DIMACS header 'p cnf ...' not found".to_string(),
                ));
            }

            // Clauses may span lines; only a 0 ends one.
            for token in line.split_whitespace() {
                let lit: Literal = token
                    .parse()
                    .map_err(|e| Error::Serialization(format!("Invalid literal: {e}")))?;
                if lit == 0 {
                    clauses.push(std::mem::take(&mut clause));
                } else {
                    clause.push(lit);
                }
            }
        }
        if !clause.is_empty() {
            clauses.push(clause);
        }

        Ok(Self { num_vars, clauses })
    }

    /// Parses DIMACS CNF from a string.
    pub fn from_str(s: &str) -> Result<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Appends a clause, widening the variable count if needed.
    pub fn add_clause(&mut self, clause: Vec<Literal>) {
        for lit in &clause {
            self.num_vars = self.num_vars.max(lit.unsigned_abs() as usize);
        }
        self.clauses.push(clause);
    }

    /// Converts to DIMACS string.
    #[must_use]
    pub fn to_dimacs(&self) -> String {
        render(self.num_vars, &self.clauses)
    }
}

/// Accumulates clauses while a program is compiled and renders them as DIMACS.
#[derive(Debug, Clone, Default)]
pub struct CnfWriter {
    clauses: Vec<Vec<Literal>>,
    max_var: usize,
}

impl CnfWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a clause (disjunction of literals).
    pub fn add_clause(&mut self, literals: impl IntoIterator<Item = Literal>) {
        let clause: Vec<Literal> = literals.into_iter().collect();
        for lit in &clause {
            self.max_var = self.max_var.max(lit.unsigned_abs() as usize);
        }
        self.clauses.push(clause);
    }

    /// Returns the number of clauses.
    #[must_use]
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Returns the highest variable mentioned so far.
    #[must_use]
    pub fn max_var(&self) -> usize {
        self.max_var
    }

    /// Renders `p cnf <maxVar> <numClauses>` followed by one line per clause.
    #[must_use]
    pub fn to_dimacs(&self) -> String {
        render(self.max_var, &self.clauses)
    }

    /// Consumes the writer and returns the formula.
    #[must_use]
    pub fn into_cnf(self) -> DimacsCnf {
        DimacsCnf {
            num_vars: self.max_var,
            clauses: self.clauses,
        }
    }
}

fn render(num_vars: usize, clauses: &[Vec<Literal>]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "p cnf {} {}", num_vars, clauses.len());
    for clause in clauses {
        for lit in clause {
            let _ = write!(out, "{lit} ");
        }
        out.push_str("0\n");
    }
    out
}
