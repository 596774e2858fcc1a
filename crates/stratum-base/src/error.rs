//! Unified error types for Stratum.

use std::fmt::Debug;
use thiserror::Error;

/// The main error type for Stratum operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Popped from an empty stack.
    #[error("Cannot pop from an empty stack")]
    StackUnderflow,

    /// Symbol used before it was declared.
    #[error("Undeclared symbol: {0}")]
    UndeclaredSymbol(String),

    /// Attempt to redefine an immutable function.
    #[error("Function '{0}' is immutable and cannot be redefined")]
    Immutable(String),

    /// Operand or value of the wrong type.
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Non-positive or otherwise unusable width.
    #[error("Invalid width: {0}")]
    InvalidWidth(String),

    /// Function called with the wrong number of arguments.
    #[error("Wrong number of arguments for '{name}': expected {expected}, got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Integer does not fit the declared width.
    #[error("Integer {value} does not fit in {width} bits")]
    IntegerOverflow { value: String, width: usize },

    /// Direct or indirect recursive call.
    #[error("Recursive call to '{0}' cannot be unrolled")]
    Recursion(String),

    /// Same target bound to two unequal values.
    #[error("Conflicting assignments for '{0}'")]
    Conflict(String),

    /// A solver result that does not cover a variable.
    #[error("Missing value for '{0}' in solver result")]
    MissingValue(String),

    /// An argument that is well-typed but unusable here.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// External solver binary could not be started.
    #[error("Solver '{name}' is not available: {hint}")]
    SolverUnavailable { name: String, hint: String },

    /// External solver ran but produced an unusable answer.
    #[error("Solver error: {0}")]
    Solver(String),

    /// An error annotated with the pipeline level and offending instruction.
    #[error("Level {level} compiler failed on {instruction}: {source}")]
    Instruction {
        level: u8,
        instruction: String,
        source: Box<Error>,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Tags the error with the level and instruction that raised it.
    ///
    /// An error already tagged at the same level keeps its innermost tag, so a
    /// failure deep inside a function body still names the opcode that caused it.
    pub fn at_level(self, level: u8, instruction: &impl Debug) -> Self {
        match self {
            Self::Instruction { level: inner, .. } if inner == level => self,
            other => Self::Instruction {
                level,
                instruction: format!("{instruction:?}"),
                source: Box::new(other),
            },
        }
    }

    /// Returns the level that first reported this error, if it was tagged.
    #[must_use]
    pub fn originating_level(&self) -> Option<u8> {
        match self {
            Self::Instruction { level, source, .. } => {
                source.originating_level().or(Some(*level))
            }
            _ => None,
        }
    }

    /// Strips all level annotations and returns the underlying error.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Instruction { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Builds a [`Error::TypeMismatch`].
pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Error {
    Error::mismatch(expected, actual)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_innermost_tag_wins() {
        let err = Error::StackUnderflow
            .at_level(3, &"pop")
            .at_level(3, &"call")
            .at_level(2, &"push");
        assert_eq!(err.originating_level(), Some(3));
        assert!(matches!(err.root(), Error::StackUnderflow));
        assert!(err.to_string().contains("Level 2"));
        assert!(err.to_string().contains("\"pop\""));
    }

    #[test]
    fn test_untagged_has_no_level() {
        assert_eq!(Error::Recursion("f".into()).originating_level(), None);
    }
}
