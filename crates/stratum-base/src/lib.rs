//! # stratum-base
//!
//! Core types and utilities for the Stratum constraint compiler.
//!
//! This crate provides the building blocks every pipeline level shares:
//!
//! - **Error Types**: one error enum for the whole pipeline, with level tagging
//! - **Stack**: the LIFO evaluation stack each level's instructions operate on
//! - **SymbolTable**: symbol to representation bindings
//! - **Registry**: deterministic fresh symbol and literal allocation
//! - **Twos complement**: the integer codec used by Level 2 and the runtime

pub mod error;
pub mod registry;
pub mod stack;
pub mod symbol_table;
pub mod twos_complement;

pub use error::{Error, Result};
pub use registry::Registry;
pub use stack::Stack;
pub use symbol_table::SymbolTable;

/// An opaque name for one value-producing point in a program.
pub type Symbol = String;

/// A signed DIMACS variable reference.
pub type Literal = i64;
