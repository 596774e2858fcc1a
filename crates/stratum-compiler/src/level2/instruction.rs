//! Level-2 instruction set: typed booleans and fixed-width integers.

use serde::{Deserialize, Serialize};
use stratum_base::Symbol;

/// A literal value pushed by `constant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constant {
    Boolean(bool),
    Integer(i64),
}

/// One Level-2 instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Instruction {
    /// Declares a fresh boolean.
    Boolean { symbol: Symbol },
    /// Declares a fresh integer of `width` bits.
    Integer { symbol: Symbol, width: usize },
    Constant { value: Constant },
    Push { symbol: Symbol },
    Pop { symbol: Symbol },
    Duplicate,
    Swap,
    Variable { symbol: Symbol },
    Invariant,
    Not,
    And,
    Or,
    Equal,
    If,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Negate,
    Absolute,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
}

impl Instruction {
    /// Shorthand for `push`.
    pub fn push(symbol: impl Into<Symbol>) -> Self {
        Self::Push {
            symbol: symbol.into(),
        }
    }

    /// Shorthand for `pop`.
    pub fn pop(symbol: impl Into<Symbol>) -> Self {
        Self::Pop {
            symbol: symbol.into(),
        }
    }

    /// Shorthand for `variable`.
    pub fn variable(symbol: impl Into<Symbol>) -> Self {
        Self::Variable {
            symbol: symbol.into(),
        }
    }

    /// Shorthand for an integer `constant`.
    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self::Constant {
            value: Constant::Integer(value),
        }
    }

    /// Shorthand for a boolean `constant`.
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Constant {
            value: Constant::Boolean(value),
        }
    }
}
