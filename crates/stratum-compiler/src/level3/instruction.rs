//! Level-3 instruction set: arrays, functions and combinators.

use serde::{Deserialize, Serialize};
use stratum_base::Symbol;

/// A literal pushed by `constant`; arrays may nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstantValue {
    Boolean(bool),
    Integer(i64),
    Array(Vec<ConstantValue>),
}

/// The shape named by a `typedef`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    Boolean,
    Integer,
    Array,
}

/// One Level-3 instruction.
///
/// Operands are popped right to left, so the last value pushed is the last
/// argument. `if` pops the condition, the consequent, then the alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Instruction {
    /// Pushes an element shape for the next `array` declaration. Arrays take
    /// their element shape from the typedef below them.
    Typedef {
        name: TypeName,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<usize>,
    },
    Boolean {
        symbol: Symbol,
    },
    Integer {
        symbol: Symbol,
        width: usize,
    },
    Array {
        symbol: Symbol,
        width: usize,
    },
    Constant {
        value: ConstantValue,
    },

    Push {
        symbol: Symbol,
    },
    Pop {
        symbol: Symbol,
    },
    Duplicate,
    Swap,
    Collect {
        width: usize,
    },

    /// array, index -> element
    Get,
    GetIndex {
        index: i64,
    },
    /// array, index, [default] -> element
    Fetch {
        #[serde(default, rename = "hasDefault")]
        has_default: bool,
    },
    FetchIndex {
        index: i64,
        #[serde(default, rename = "hasDefault")]
        has_default: bool,
    },
    /// array, index -> true when the index is out of range or nil
    Bounds,
    Width,

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
    #[serde(rename = "lessthan")]
    LessThan,
    #[serde(rename = "greaterthan")]
    GreaterThan,
    #[serde(rename = "lessequal")]
    LessEqual,
    #[serde(rename = "greaterequal")]
    GreaterEqual,

    Define {
        name: String,
        #[serde(default)]
        args: Vec<Symbol>,
        #[serde(default)]
        dynamic: bool,
        #[serde(default)]
        immutable: bool,
    },
    Return {
        #[serde(default)]
        width: usize,
    },
    Call {
        name: String,
        #[serde(default)]
        width: usize,
    },
    Pointer {
        name: String,
    },

    Variable {
        symbol: Symbol,
        #[serde(default)]
        supporting: bool,
    },
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

    /// Shorthand for a user-facing `variable`.
    pub fn variable(symbol: impl Into<Symbol>) -> Self {
        Self::Variable {
            symbol: symbol.into(),
            supporting: false,
        }
    }

    /// Shorthand for an integer `constant`.
    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self::Constant {
            value: ConstantValue::Integer(value),
        }
    }

    /// Shorthand for a boolean `constant`.
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Constant {
            value: ConstantValue::Boolean(value),
        }
    }

    /// Shorthand for `call`.
    pub fn call(name: impl Into<String>, width: usize) -> Self {
        Self::Call {
            name: name.into(),
            width,
        }
    }

    /// Shorthand for `pointer`.
    pub fn pointer(name: impl Into<String>) -> Self {
        Self::Pointer { name: name.into() }
    }

    /// Shorthand for a plain `define`.
    pub fn define<S: Into<Symbol>>(name: impl Into<String>, args: impl IntoIterator<Item = S>) -> Self {
        Self::Define {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
            dynamic: false,
            immutable: false,
        }
    }
}
