//! # stratum-format
//!
//! Interchange formats for Stratum.
//!
//! Supports:
//! - **Programs**: per-level instruction lists with their metadata tables
//! - **DIMACS CNF**: standard SAT competition format, parsed and written
//! - **Solver output**: competition `s`/`v` lines and bare result files

pub mod dimacs;
pub mod program;
pub mod solution;

pub use dimacs::{CnfWriter, DimacsCnf};
pub use program::{
    CompiledProgram, Level2Variable, Level3Variable, Metadata, Program, ScalarType, ValueType,
};
pub use solution::parse_solver_output;
