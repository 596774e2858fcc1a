//! Deterministic allocation of fresh symbols and literals.

use crate::{Literal, Symbol};

/// Hands out fresh symbol names and, at Level 1, fresh literal numbers.
///
/// Counters only ever grow, so compiling the same instructions twice yields
/// the same numbering.
#[derive(Debug, Clone)]
pub struct Registry {
    prefix: &'static str,
    next_symbol: u64,
    next_literal: Literal,
}

impl Registry {
    /// Creates a registry whose symbols look like `$$$_<prefix>_<n>`.
    #[must_use]
    pub const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next_symbol: 1,
            next_literal: 1,
        }
    }

    /// Allocates a fresh symbol name.
    pub fn symbol(&mut self) -> Symbol {
        let n = self.next_symbol;
        self.next_symbol += 1;
        format!("$$$_{}_{}", self.prefix, n)
    }

    /// Allocates a fresh literal.
    pub fn literal(&mut self) -> Literal {
        let lit = self.next_literal;
        self.next_literal += 1;
        lit
    }

    /// Returns the highest literal handed out so far.
    #[must_use]
    pub const fn max_literal(&self) -> Literal {
        self.next_literal - 1
    }
}

/// Returns whether a symbol was produced by a registry rather than a program.
#[must_use]
pub fn is_internal(symbol: &str) -> bool {
    symbol.starts_with("$$$_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_allocation() {
        let mut registry = Registry::new("L2");
        assert_eq!(registry.symbol(), "$$$_L2_1");
        assert_eq!(registry.symbol(), "$$$_L2_2");
        assert_eq!(registry.literal(), 1);
        assert_eq!(registry.literal(), 2);
        assert_eq!(registry.max_literal(), 2);
        assert!(is_internal("$$$_L2_1"));
        assert!(!is_internal("total"));
    }
}
