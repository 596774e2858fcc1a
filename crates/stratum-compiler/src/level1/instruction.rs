//! Level-1 instruction set: a boolean stack machine.

use serde::{Deserialize, Serialize};
use stratum_base::Symbol;

/// One Level-1 instruction.
///
/// Binary operators pop their right operand first. `if` pops the condition,
/// then the consequent, then the alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Instruction {
    Push { symbol: Symbol },
    Pop { symbol: Symbol },
    True,
    False,
    Not,
    And,
    Or,
    Equal,
    If,
    Duplicate,
    Swap,
    Variable { symbol: Symbol },
    Invariant,
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
}
