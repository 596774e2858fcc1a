//! Level 2: booleans and fixed-width integers to Level 1.

pub mod circuit;
mod compiler;
mod instruction;

pub use compiler::compile;
pub use instruction::{Constant, Instruction};
