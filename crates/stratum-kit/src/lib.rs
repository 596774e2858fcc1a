//! # stratum-kit
//!
//! The high-level API for Stratum.
//!
//! This crate ties the pipeline together:
//! - Compiling Level-3 programs down to CNF
//! - Solving through an embedded engine or an external solver binary
//! - Encoding assignments and decoding one or more solutions
//!
//! # Example
//!
//! ```ignore
//! use stratum_kit::*;
//!
//! let compiled = compile(program)?;
//! let machine = Machine::new(EmbeddedSolver::default());
//! for solution in machine.run(&compiled, &Assignment::new(), 3)? {
//!     println!("{}", serde_json::to_string(&solution)?);
//! }
//! ```

pub mod machine;
pub mod solver;

pub use stratum_base::{Error, Literal, Result};
pub use stratum_compiler::compile;
pub use stratum_format::{CompiledProgram, Metadata, Program};
pub use stratum_runtime::{Assignment, Value};

pub use machine::Machine;
pub use solver::{solver_named, EmbeddedSolver, ProcessSolver, SatSolver};
