//! Level 1: boolean circuit to CNF.

mod compiler;
mod instruction;

pub use compiler::compile;
pub use instruction::Instruction;
