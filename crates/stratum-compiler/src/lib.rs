//! # stratum-compiler
//!
//! Lowers constraint programs to CNF in three steps:
//!
//! - **Level 3**: arrays, functions and combinators, fully unrolled
//! - **Level 2**: booleans and fixed-width twos-complement integers, bit-blasted
//! - **Level 1**: a boolean circuit, Tseitin-encoded into DIMACS clauses
//!
//! Each level consumes a [`Program`] of its own instruction type and hands a
//! program of the level below to the next compiler. The metadata map travels
//! with it and collects one variable table per level, which is what the
//! runtime codec needs to translate assignments and results.

pub mod level1;
pub mod level2;
pub mod level3;

use stratum_base::Result;
use stratum_format::{CompiledProgram, Program};

/// Runs the whole pipeline on a Level-3 program.
pub fn compile(program: Program<level3::Instruction>) -> Result<CompiledProgram> {
    let level2 = level3::compile(program)?;
    let level1 = level2::compile(level2)?;
    level1::compile(level1)
}
