//! Symbol tables mapping a symbol to its level-specific representation.

use crate::error::{Error, Result};
use crate::Symbol;
use std::collections::HashMap;

/// A flat mapping from symbol names to their bindings.
///
/// Level 1 binds symbols to literals, Level 2 to typed bit vectors and
/// Level 3 to typed, possibly nested values.
#[derive(Debug, Clone)]
pub struct SymbolTable<T> {
    entries: HashMap<Symbol, T>,
}

impl<T> SymbolTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Binds (or re-binds) a symbol.
    pub fn set(&mut self, symbol: impl Into<Symbol>, value: T) {
        self.entries.insert(symbol.into(), value);
    }

    /// Looks up a symbol, failing if it was never declared.
    pub fn get(&self, symbol: &str) -> Result<&T> {
        self.entries
            .get(symbol)
            .ok_or_else(|| Error::UndeclaredSymbol(symbol.to_string()))
    }

    /// Looks up a symbol without failing.
    #[must_use]
    pub fn find(&self, symbol: &str) -> Option<&T> {
        self.entries.get(symbol)
    }

    /// Returns whether the symbol is bound.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    /// Returns the number of bound symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
