//! # stratum-cdcl
//!
//! Conflict-Driven Clause Learning (CDCL) engine used when no external
//! solver binary is configured.
//!
//! Implements:
//! - Boolean Constraint Propagation (BCP) over two watched literals
//! - Conflict analysis with first-UIP resolution
//! - VSIDS decisions with phase saving
//! - Geometric restarts

pub mod bcp;
pub mod clause_db;
pub mod conflict;
pub mod heuristics;
pub mod solver;

pub use solver::{CdclConfig, CdclSolver, SatResult, SolverStats};

/// Zero-based variable index of a DIMACS literal.
#[inline]
pub(crate) fn var_of(lit: stratum_base::Literal) -> usize {
    lit.unsigned_abs() as usize - 1
}
