//! Level 3: arrays, functions and combinators to Level 2.

mod arrays;
mod builtins;
mod compiler;
mod functions;
mod instruction;
mod recorder;
mod scope;
mod value;

pub use compiler::compile;
pub use instruction::{ConstantValue, Instruction, TypeName};
