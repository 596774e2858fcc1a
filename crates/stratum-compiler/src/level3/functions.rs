//! Call expansion.
//!
//! A call runs the recorded body in a child scope and copies the results
//! back. Nothing is shared between caller and callee except what dynamic
//! scoping reaches through the parent link.

use super::compiler::Level3Compiler;
use super::scope::Scope;
use super::value::{Binding, Callable, Function};
use stratum_base::{Error, Result, Symbol};
use tracing::trace;

impl Level3Compiler {
    /// Expands `callable` on `args`.
    ///
    /// `guard` is the nil condition of the element a combinator is visiting.
    /// While it holds, invariants inside the call are void and caller names the
    /// call rebinds keep their old values.
    pub(super) fn apply(
        &mut self,
        scope: &mut Scope<'_>,
        callable: &Callable,
        args: Vec<Binding>,
        guard: Option<&Symbol>,
    ) -> Result<Vec<Binding>> {
        if let Some(guard) = guard {
            let combined = match self.guards.last().cloned() {
                Some(outer) => self.or(&outer, guard),
                None => guard.clone(),
            };
            self.guards.push(combined);
        }
        let result = match callable {
            Callable::User(function) => self.invoke(scope, function, args, guard),
            Callable::Builtin(builtin) => self.builtin(scope, *builtin, args),
        };
        if guard.is_some() {
            self.guards.pop();
        }
        result
    }

    fn invoke(
        &mut self,
        caller: &mut Scope<'_>,
        function: &Function,
        args: Vec<Binding>,
        guard: Option<&Symbol>,
    ) -> Result<Vec<Binding>> {
        if args.len() != function.args.len() {
            return Err(Error::ArityMismatch {
                name: function.name.clone(),
                expected: function.args.len(),
                actual: args.len(),
            });
        }
        if self.call_stack.contains(&function.id) {
            return Err(Error::Recursion(function.name.clone()));
        }

        trace!(name = %function.name, depth = self.call_stack.len(), "expanding call");
        self.call_stack.push(function.id);
        let expanded = self.expand(caller, function, args);
        self.call_stack.pop();
        let (results, reassigned) = expanded?;

        for (name, value) in reassigned {
            let value = match (guard, caller.find(&name).cloned()) {
                (Some(guard), Some(previous)) => self.merge(guard, previous, value)?,
                _ => value,
            };
            caller.bind(&name, value);
        }
        Ok(results)
    }

    fn expand(
        &mut self,
        caller: &Scope<'_>,
        function: &Function,
        args: Vec<Binding>,
    ) -> Result<(Vec<Binding>, Vec<(Symbol, Binding)>)> {
        let mut callee = Scope::child(caller, function.dynamic);
        for (name, value) in function.args.iter().zip(args) {
            callee.insert(name.clone(), value);
        }
        self.run(&mut callee, &function.body)?;
        let results = self.pop_many(&mut callee, function.return_width)?;
        Ok((results, callee.take_reassigned()))
    }
}
