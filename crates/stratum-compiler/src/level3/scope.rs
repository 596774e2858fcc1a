//! Lexical and dynamic scopes for Level-3 function expansion.

use super::value::{Binding, Function, TypeDef};
use stratum_base::{Error, Result, Stack, Symbol, SymbolTable};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

/// One activation: its own stack and bindings, plus a link to the caller.
///
/// Symbols resolve through the parent only while the scope is dynamic.
/// Function definitions are always visible from nested scopes.
pub struct Scope<'p> {
    pub stack: Stack<Symbol>,
    pub typedefs: Stack<TypeDef>,
    table: SymbolTable<Binding>,
    functions: HashMap<String, Rc<Function>>,
    parent: Option<&'p Scope<'p>>,
    dynamic: bool,
    /// Caller names this scope has rebound; copied back on return.
    reassigned: BTreeSet<Symbol>,
}

impl<'p> Scope<'p> {
    /// The top-level scope of a program.
    pub fn root() -> Self {
        Self {
            stack: Stack::new(),
            typedefs: Stack::new(),
            table: SymbolTable::new(),
            functions: HashMap::new(),
            parent: None,
            dynamic: false,
            reassigned: BTreeSet::new(),
        }
    }

    /// A fresh scope for one call made from `parent`.
    pub fn child(parent: &'p Scope<'p>, dynamic: bool) -> Self {
        Self {
            parent: Some(parent),
            dynamic,
            ..Self::root()
        }
    }

    /// Resolves a symbol, falling back to the caller in dynamic scopes.
    pub fn find(&self, name: &str) -> Option<&Binding> {
        match self.table.find(name) {
            Some(binding) => Some(binding),
            None if self.dynamic => self.parent.and_then(|parent| parent.find(name)),
            None => None,
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&Binding> {
        self.find(name)
            .ok_or_else(|| Error::UndeclaredSymbol(name.to_string()))
    }

    /// Binds a name local to this scope.
    pub fn insert(&mut self, name: impl Into<Symbol>, binding: Binding) {
        self.table.set(name, binding);
    }

    /// Binds a name as `pop` does, recording rebinds of caller names.
    pub fn bind(&mut self, name: &str, binding: Binding) {
        if self.dynamic && !self.table.contains(name) {
            let outer = self.parent.and_then(|parent| parent.find(name));
            if outer.is_some() {
                self.reassigned.insert(name.to_string());
            }
        }
        self.table.set(name, binding);
    }

    /// Final values of every caller name this scope rebound.
    pub fn take_reassigned(&mut self) -> Vec<(Symbol, Binding)> {
        std::mem::take(&mut self.reassigned)
            .into_iter()
            .filter_map(|name| {
                let binding = self.table.find(&name)?.clone();
                Some((name, binding))
            })
            .collect()
    }

    /// Looks a user function up through every enclosing scope.
    pub fn find_function(&self, name: &str) -> Option<Rc<Function>> {
        match self.functions.get(name) {
            Some(function) => Some(Rc::clone(function)),
            None => self.parent.and_then(|parent| parent.find_function(name)),
        }
    }

    pub fn define_function(&mut self, function: Function) -> Result<()> {
        if let Some(existing) = self.find_function(&function.name) {
            if existing.immutable {
                return Err(Error::Immutable(function.name));
            }
        }
        self.functions
            .insert(function.name.clone(), Rc::new(function));
        Ok(())
    }
}
