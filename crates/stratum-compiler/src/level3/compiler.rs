//! Level-3 compiler: arrays, functions and combinators to Level-2.
//!
//! Everything is unrolled here. Arrays become one Level-2 value per element,
//! symbolic indices become multiplexer chains and every call is expanded in
//! place, so the emitted program has no control flow left.

use super::builtins::Builtin;
use super::recorder::Recorder;
use super::scope::Scope;
use super::value::{unify_all, ArrayValue, Binding, Callable, TypeDef};
use super::{ConstantValue, Instruction, TypeName};
use crate::level2::Instruction as L2;
use stratum_base::error::type_mismatch;
use stratum_base::{Error, Registry, Result, Symbol};
use stratum_format::{Level3Variable, Program, ValueType};
use std::collections::BTreeMap;
use tracing::debug;

/// Compiles a Level-3 program into a Level-2 program.
pub fn compile(program: Program<Instruction>) -> Result<Program<L2>> {
    let mut compiler = Level3Compiler::new();
    let mut scope = Scope::root();
    compiler.run(&mut scope, &program.instructions)?;

    debug!(
        instructions = compiler.output.len(),
        variables = compiler.variables.len(),
        functions = compiler.next_function_id,
        "level 3 compiled"
    );

    let mut metadata = program.metadata;
    metadata.level3_variables = compiler.variables;
    Ok(Program {
        instructions: compiler.output,
        metadata,
    })
}

pub(crate) struct Level3Compiler {
    /// Names both Level-3 temporaries and the Level-2 symbols they stand for.
    registry: Registry,
    output: Vec<L2>,
    variables: BTreeMap<Symbol, Level3Variable>,
    /// Functions currently being expanded.
    pub(super) call_stack: Vec<u64>,
    /// Nil conditions of the elements combinators are visiting. Invariants
    /// only bind when none of them holds.
    pub(super) guards: Vec<Symbol>,
    next_function_id: u64,
}

impl Level3Compiler {
    fn new() -> Self {
        Self {
            registry: Registry::new("L3"),
            output: Vec::new(),
            variables: BTreeMap::new(),
            call_stack: Vec::new(),
            guards: Vec::new(),
            next_function_id: 0,
        }
    }

    /// Executes instructions in `scope`, recording function definitions.
    pub(super) fn run(&mut self, scope: &mut Scope<'_>, instructions: &[Instruction]) -> Result<()> {
        let mut recorder: Option<Recorder> = None;
        for instruction in instructions {
            if let Some(active) = recorder.as_mut() {
                if let Some(width) = active.record(instruction) {
                    if let Some(done) = recorder.take() {
                        self.next_function_id += 1;
                        let function = done.finish(self.next_function_id, width);
                        self.define(scope, function)
                            .map_err(|e| e.at_level(3, instruction))?;
                    }
                }
                continue;
            }

            match instruction {
                Instruction::Define {
                    name,
                    args,
                    dynamic,
                    immutable,
                } => recorder = Some(Recorder::start(name, args, *dynamic, *immutable)),
                other => self
                    .execute(scope, other)
                    .map_err(|e| e.at_level(3, other))?,
            }
        }

        match recorder {
            Some(open) => Err(Error::InvalidArgument(format!(
                "function '{}' has no return",
                open.name()
            ))),
            None => Ok(()),
        }
    }

    fn define(&mut self, scope: &mut Scope<'_>, function: super::value::Function) -> Result<()> {
        if Builtin::from_name(&function.name).is_some() {
            return Err(Error::Immutable(function.name));
        }
        debug!(name = %function.name, args = function.args.len(), "function defined");
        scope.define_function(function)
    }

    fn execute(&mut self, scope: &mut Scope<'_>, instruction: &Instruction) -> Result<()> {
        match instruction {
            Instruction::Typedef { name, width } => {
                let typedef = match name {
                    TypeName::Boolean => TypeDef::Boolean,
                    TypeName::Integer => TypeDef::Integer(positive(*width, "integer typedef")?),
                    TypeName::Array => {
                        let width = positive(*width, "array typedef")?;
                        TypeDef::Array(width, Box::new(scope.typedefs.pop()?))
                    }
                };
                scope.typedefs.push(typedef);
            }
            Instruction::Boolean { symbol } => {
                let binding = self.declare(&TypeDef::Boolean);
                scope.bind(symbol, binding);
            }
            Instruction::Integer { symbol, width } => {
                let width = positive(Some(*width), symbol)?;
                let binding = self.declare(&TypeDef::Integer(width));
                scope.bind(symbol, binding);
            }
            Instruction::Array { symbol, width } => {
                let width = positive(Some(*width), symbol)?;
                let element = scope.typedefs.pop()?;
                let binding = self.declare(&TypeDef::Array(width, Box::new(element)));
                scope.bind(symbol, binding);
            }
            Instruction::Constant { value } => {
                let binding = self.constant(value)?;
                self.push_fresh(scope, binding);
            }

            Instruction::Push { symbol } => {
                scope.lookup(symbol)?;
                scope.stack.push(symbol.clone());
            }
            Instruction::Pop { symbol } => {
                let binding = self.pop(scope)?;
                scope.bind(symbol, binding);
            }
            Instruction::Duplicate => scope.stack.duplicate()?,
            Instruction::Swap => scope.stack.swap()?,
            Instruction::Collect { width } => {
                let elements = self.pop_many(scope, *width)?;
                unify_all(elements.iter())?;
                self.push_fresh(scope, Binding::Array(ArrayValue::new(elements)));
            }

            Instruction::Get => {
                let (index, constant) = self.pop(scope)?.into_integer()?;
                let array = self.pop(scope)?.into_array()?;
                let element = self.select(&array, &index, constant)?;
                self.push_fresh(scope, element);
            }
            Instruction::GetIndex { index } => {
                let array = self.pop(scope)?.into_array()?;
                let element = self.element_at(&array, *index)?;
                self.push_fresh(scope, element);
            }
            Instruction::Fetch { has_default } => {
                let default = if *has_default {
                    Some(self.pop(scope)?)
                } else {
                    None
                };
                let (index, constant) = self.pop(scope)?.into_integer()?;
                let array = self.pop(scope)?.into_array()?;
                let element = self.fetch(&array, &index, constant, default)?;
                self.push_fresh(scope, element);
            }
            Instruction::FetchIndex { index, has_default } => {
                let default = if *has_default {
                    Some(self.pop(scope)?)
                } else {
                    None
                };
                let array = self.pop(scope)?.into_array()?;
                let symbol = self.integer_constant(*index);
                let element = self.fetch(&array, &symbol, Some(*index), default)?;
                self.push_fresh(scope, element);
            }
            Instruction::Bounds => {
                let (index, constant) = self.pop(scope)?.into_integer()?;
                let array = self.pop(scope)?.into_array()?;
                let out = self.bounds(&array, &index, constant);
                self.push_fresh(scope, Binding::Boolean(out));
            }
            Instruction::Width => {
                let array = self.pop(scope)?.into_array()?;
                let width = self.width(&array);
                self.push_fresh(scope, width);
            }

            Instruction::Not => {
                let a = self.pop(scope)?.into_boolean()?;
                let out = self.not(&a);
                self.push_fresh(scope, Binding::Boolean(out));
            }
            Instruction::And | Instruction::Or => {
                let b = self.pop(scope)?.into_boolean()?;
                let a = self.pop(scope)?.into_boolean()?;
                let out = if matches!(instruction, Instruction::And) {
                    self.and(&a, &b)
                } else {
                    self.or(&a, &b)
                };
                self.push_fresh(scope, Binding::Boolean(out));
            }
            Instruction::Equal => {
                let b = self.pop(scope)?;
                let a = self.pop(scope)?;
                let out = self.equal(&a, &b)?;
                self.push_fresh(scope, Binding::Boolean(out));
            }
            Instruction::If => {
                let condition = self.pop(scope)?.into_boolean()?;
                let consequent = self.pop(scope)?;
                let alternative = self.pop(scope)?;
                let merged = self.merge(&condition, consequent, alternative)?;
                self.push_fresh(scope, merged);
            }
            Instruction::Add
            | Instruction::Subtract
            | Instruction::Multiply
            | Instruction::Divide
            | Instruction::Modulo => {
                let (b, b_value) = self.pop(scope)?.into_integer()?;
                let (a, a_value) = self.pop(scope)?.into_integer()?;
                let (op, folded) = match instruction {
                    Instruction::Add => (L2::Add, fold(a_value, b_value, i64::checked_add)),
                    Instruction::Subtract => (L2::Subtract, fold(a_value, b_value, i64::checked_sub)),
                    Instruction::Multiply => (L2::Multiply, fold(a_value, b_value, i64::checked_mul)),
                    Instruction::Divide => (L2::Divide, fold(a_value, b_value, i64::checked_div)),
                    _ => (L2::Modulo, fold(a_value, b_value, i64::checked_rem)),
                };
                let symbol = self.operation(&[&a, &b], op);
                self.push_fresh(
                    scope,
                    Binding::Integer {
                        symbol,
                        constant: folded,
                    },
                );
            }
            Instruction::Negate | Instruction::Absolute => {
                let (a, value) = self.pop(scope)?.into_integer()?;
                let (op, folded) = if matches!(instruction, Instruction::Negate) {
                    (L2::Negate, value.and_then(i64::checked_neg))
                } else {
                    (L2::Absolute, value.and_then(i64::checked_abs))
                };
                let symbol = self.operation(&[&a], op);
                self.push_fresh(
                    scope,
                    Binding::Integer {
                        symbol,
                        constant: folded,
                    },
                );
            }
            Instruction::LessThan
            | Instruction::GreaterThan
            | Instruction::LessEqual
            | Instruction::GreaterEqual => {
                let (b, _) = self.pop(scope)?.into_integer()?;
                let (a, _) = self.pop(scope)?.into_integer()?;
                let op = match instruction {
                    Instruction::LessThan => L2::LessThan,
                    Instruction::GreaterThan => L2::GreaterThan,
                    Instruction::LessEqual => L2::LessEqual,
                    _ => L2::GreaterEqual,
                };
                let out = self.operation(&[&a, &b], op);
                self.push_fresh(scope, Binding::Boolean(out));
            }

            Instruction::Define { .. } | Instruction::Return { .. } => {
                return Err(Error::InvalidArgument(
                    "return without a matching define".into(),
                ));
            }
            Instruction::Call { name, width } => {
                let callable = self.resolve(scope, name)?;
                let args = self.pop_many(scope, *width)?;
                let results = self.apply(scope, &callable, args, None)?;
                for result in results {
                    self.push_fresh(scope, result);
                }
            }
            Instruction::Pointer { name } => {
                let callable = self.resolve(scope, name)?;
                self.push_fresh(scope, Binding::Function(callable));
            }

            Instruction::Variable { symbol, supporting } => {
                let binding = scope.lookup(symbol)?.clone();
                self.expose(symbol, &binding, *supporting, None)?;
            }
            Instruction::Invariant => {
                let condition = self.pop(scope)?.into_boolean()?;
                self.assert(&condition);
            }
        }
        Ok(())
    }

    /// Finds what `call`/`pointer` name: a function-valued symbol, a user
    /// function, then a builtin.
    fn resolve(&self, scope: &Scope<'_>, name: &str) -> Result<Callable> {
        if let Some(Binding::Function(callable)) = scope.find(name) {
            return Ok(callable.clone());
        }
        if let Some(function) = scope.find_function(name) {
            return Ok(Callable::User(function));
        }
        Builtin::from_name(name)
            .map(Callable::Builtin)
            .ok_or_else(|| Error::UndeclaredSymbol(name.to_string()))
    }

    // =========================================================================
    // Stack helpers
    // =========================================================================

    pub(super) fn pop(&mut self, scope: &mut Scope<'_>) -> Result<Binding> {
        let symbol = scope.stack.pop()?;
        scope.lookup(&symbol).cloned()
    }

    /// Pops `n` bindings, returned in push order.
    pub(super) fn pop_many(&mut self, scope: &mut Scope<'_>, n: usize) -> Result<Vec<Binding>> {
        let symbols = scope.stack.pop_many(n)?;
        symbols
            .iter()
            .map(|symbol| scope.lookup(symbol).cloned())
            .collect()
    }

    fn push_fresh(&mut self, scope: &mut Scope<'_>, binding: Binding) {
        let symbol = self.registry.symbol();
        scope.insert(symbol.clone(), binding);
        scope.stack.push(symbol);
    }

    // =========================================================================
    // Level-2 emission
    // =========================================================================

    fn emit(&mut self, instruction: L2) {
        self.output.push(instruction);
    }

    fn bind_top(&mut self) -> Symbol {
        let symbol = self.registry.symbol();
        self.emit(L2::pop(symbol.clone()));
        symbol
    }

    /// Pushes the operands, applies `op` and names the result.
    pub(super) fn operation(&mut self, operands: &[&Symbol], op: L2) -> Symbol {
        for operand in operands {
            self.emit(L2::push((*operand).clone()));
        }
        self.emit(op);
        self.bind_top()
    }

    pub(super) fn boolean_constant(&mut self, value: bool) -> Symbol {
        self.emit(L2::boolean(value));
        self.bind_top()
    }

    pub(super) fn integer_constant(&mut self, value: i64) -> Symbol {
        self.emit(L2::integer(value));
        self.bind_top()
    }

    /// A compile-time integer binding.
    pub(super) fn integer(&mut self, value: i64) -> Binding {
        Binding::Integer {
            symbol: self.integer_constant(value),
            constant: Some(value),
        }
    }

    pub(super) fn not(&mut self, a: &Symbol) -> Symbol {
        self.operation(&[a], L2::Not)
    }

    pub(super) fn and(&mut self, a: &Symbol, b: &Symbol) -> Symbol {
        self.operation(&[a, b], L2::And)
    }

    pub(super) fn or(&mut self, a: &Symbol, b: &Symbol) -> Symbol {
        self.operation(&[a, b], L2::Or)
    }

    /// Disjunction of all conditions; false when there are none.
    pub(super) fn or_all(&mut self, conditions: &[Symbol]) -> Symbol {
        match conditions.split_first() {
            None => self.boolean_constant(false),
            Some((first, rest)) => rest
                .iter()
                .fold(first.clone(), |acc, condition| self.or(&acc, condition)),
        }
    }

    /// Conjunction of all conditions; true when there are none.
    pub(super) fn and_all(&mut self, conditions: &[Symbol]) -> Symbol {
        match conditions.split_first() {
            None => self.boolean_constant(true),
            Some((first, rest)) => rest
                .iter()
                .fold(first.clone(), |acc, condition| self.and(&acc, condition)),
        }
    }

    /// Level-2 `if` over two scalars of the same type.
    pub(super) fn choose(&mut self, condition: &Symbol, then: &Symbol, otherwise: &Symbol) -> Symbol {
        self.operation(&[otherwise, then, condition], L2::If)
    }

    /// Forces `condition`, unless a combinator guard says the current
    /// element is absent.
    pub(super) fn assert(&mut self, condition: &Symbol) {
        let condition = match self.guards.last().cloned() {
            Some(guard) => self.or(&guard, condition),
            None => condition.clone(),
        };
        self.emit(L2::push(condition));
        self.emit(L2::Invariant);
    }

    // =========================================================================
    // Declarations and exposure
    // =========================================================================

    fn declare(&mut self, typedef: &TypeDef) -> Binding {
        match typedef {
            TypeDef::Boolean => {
                let symbol = self.registry.symbol();
                self.emit(L2::Boolean {
                    symbol: symbol.clone(),
                });
                Binding::Boolean(symbol)
            }
            TypeDef::Integer(width) => {
                let symbol = self.registry.symbol();
                self.emit(L2::Integer {
                    symbol: symbol.clone(),
                    width: *width,
                });
                Binding::Integer {
                    symbol,
                    constant: None,
                }
            }
            TypeDef::Array(width, element) => {
                let elements = (0..*width).map(|_| self.declare(element)).collect();
                Binding::Array(ArrayValue::new(elements))
            }
        }
    }

    fn constant(&mut self, value: &ConstantValue) -> Result<Binding> {
        Ok(match value {
            ConstantValue::Boolean(b) => Binding::Boolean(self.boolean_constant(*b)),
            ConstantValue::Integer(n) => self.integer(*n),
            ConstantValue::Array(values) => {
                let elements = values
                    .iter()
                    .map(|value| self.constant(value))
                    .collect::<Result<Vec<_>>>()?;
                unify_all(elements.iter())?;
                Binding::Array(ArrayValue::new(elements))
            }
        })
    }

    /// Records `binding` under `name` in the Level-3 variable table.
    ///
    /// Array elements get supporting entries of their own, and elements that
    /// may be absent get a supporting nil-decider boolean.
    fn expose(
        &mut self,
        name: &str,
        binding: &Binding,
        supporting: bool,
        nil_decider: Option<Symbol>,
    ) -> Result<()> {
        let (ty, symbols) = match binding {
            Binding::Boolean(symbol) => {
                self.emit(L2::variable(symbol.clone()));
                (ValueType::Boolean, vec![symbol.clone()])
            }
            Binding::Integer { symbol, .. } => {
                self.emit(L2::variable(symbol.clone()));
                (ValueType::Integer, vec![symbol.clone()])
            }
            Binding::Array(array) => {
                let mut names = Vec::with_capacity(array.len());
                for (index, element) in array.elements.iter().enumerate() {
                    let element_name = self.registry.symbol();
                    let decider = match self.nil_at(array, index) {
                        Some(condition) => {
                            let decider_name = self.registry.symbol();
                            self.expose(&decider_name, &Binding::Boolean(condition), true, None)?;
                            Some(decider_name)
                        }
                        None => None,
                    };
                    self.expose(&element_name, element, true, decider)?;
                    names.push(element_name);
                }
                (ValueType::Array, names)
            }
            Binding::Function(_) => {
                return Err(type_mismatch("boolean, integer or array", "function"))
            }
        };

        let supporting = supporting
            && self
                .variables
                .get(name)
                .map_or(true, |existing| existing.supporting);
        self.variables.insert(
            name.to_string(),
            Level3Variable {
                ty,
                symbols,
                supporting,
                nil_decider,
            },
        );
        Ok(())
    }
}

fn positive(width: Option<usize>, what: &str) -> Result<usize> {
    match width {
        Some(width) if width > 0 => Ok(width),
        _ => Err(Error::InvalidWidth(format!(
            "'{what}' needs a positive width"
        ))),
    }
}

fn fold(a: Option<i64>, b: Option<i64>, op: fn(i64, i64) -> Option<i64>) -> Option<i64> {
    op(a?, b?)
}
