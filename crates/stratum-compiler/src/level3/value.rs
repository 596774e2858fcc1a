//! Level-3 bindings: typed values over Level-2 symbols.

use super::builtins::Builtin;
use super::Instruction;
use stratum_base::error::type_mismatch;
use stratum_base::{Result, Symbol};
use std::rc::Rc;

/// What a Level-3 symbol stands for.
///
/// Scalars name one Level-2 symbol. Arrays own their elements outright, so a
/// clone is a deep copy and no two symbols ever alias the same element list.
#[derive(Debug, Clone)]
pub enum Binding {
    Boolean(Symbol),
    Integer {
        symbol: Symbol,
        /// Known at compile time, e.g. for constants and static widths.
        constant: Option<i64>,
    },
    Array(ArrayValue),
    Function(Callable),
}

impl Binding {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer { .. } => "integer",
            Self::Array(_) => "array",
            Self::Function(_) => "function",
        }
    }

    pub fn shape(&self) -> Result<Shape> {
        match self {
            Self::Boolean(_) => Ok(Shape::Boolean),
            Self::Integer { .. } => Ok(Shape::Integer),
            Self::Array(array) => Ok(Shape::Array(array.element_shape()?.map(Box::new))),
            Self::Function(_) => Err(type_mismatch("boolean, integer or array", "function")),
        }
    }

    pub fn into_boolean(self) -> Result<Symbol> {
        match self {
            Self::Boolean(symbol) => Ok(symbol),
            other => Err(type_mismatch("boolean", other.type_name())),
        }
    }

    pub fn into_integer(self) -> Result<(Symbol, Option<i64>)> {
        match self {
            Self::Integer { symbol, constant } => Ok((symbol, constant)),
            other => Err(type_mismatch("integer", other.type_name())),
        }
    }

    pub fn into_array(self) -> Result<ArrayValue> {
        match self {
            Self::Array(array) => Ok(array),
            other => Err(type_mismatch("array", other.type_name())),
        }
    }

    pub fn into_callable(self) -> Result<Callable> {
        match self {
            Self::Function(callable) => Ok(callable),
            other => Err(type_mismatch("function", other.type_name())),
        }
    }
}

/// An array whose effective length may depend on the solution.
#[derive(Debug, Clone, Default)]
pub struct ArrayValue {
    pub elements: Vec<Binding>,
    pub nil_conditions: Vec<NilCondition>,
}

impl ArrayValue {
    /// An array with every element present.
    pub fn new(elements: Vec<Binding>) -> Self {
        Self {
            elements,
            nil_conditions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The shape shared by all elements, `None` for an empty array.
    pub fn element_shape(&self) -> Result<Option<Shape>> {
        unify_all(self.elements.iter())
    }

    /// Conditions under which element `index` is absent.
    pub fn conditions_at(&self, index: usize) -> impl Iterator<Item = &Symbol> {
        self.nil_conditions
            .iter()
            .filter(move |c| c.applies_to(index))
            .map(|c| &c.condition)
    }

    /// Elements `start..start + len` with their nil conditions re-indexed.
    pub fn window(&self, start: usize, len: usize) -> Self {
        let indices: Vec<usize> = (start..start + len).collect();
        self.pick(&indices)
    }

    /// The elements at `indices`, in that order, with nil conditions following them.
    pub fn pick(&self, indices: &[usize]) -> Self {
        let elements = indices.iter().map(|&i| self.elements[i].clone()).collect();
        let mut nil_conditions = Vec::new();
        for condition in &self.nil_conditions {
            match condition.index {
                None => nil_conditions.push(condition.clone()),
                Some(index) => {
                    if let Some(position) = indices.iter().position(|&i| i == index) {
                        nil_conditions.push(NilCondition::at(condition.condition.clone(), position));
                    }
                }
            }
        }
        Self {
            elements,
            nil_conditions,
        }
    }
}

/// "Index `index` (every index if `None`) is absent whenever `condition` holds."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NilCondition {
    pub condition: Symbol,
    pub index: Option<usize>,
}

impl NilCondition {
    pub const fn at(condition: Symbol, index: usize) -> Self {
        Self {
            condition,
            index: Some(index),
        }
    }

    pub fn applies_to(&self, index: usize) -> bool {
        self.index.map_or(true, |i| i == index)
    }
}

/// Something `call` can expand.
#[derive(Debug, Clone)]
pub enum Callable {
    User(Rc<Function>),
    Builtin(Builtin),
}

impl Callable {
    pub fn name(&self) -> &str {
        match self {
            Self::User(function) => &function.name,
            Self::Builtin(builtin) => builtin.name(),
        }
    }

    /// Fixed argument count, if there is one.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Self::User(function) => Some(function.args.len()),
            Self::Builtin(builtin) => builtin.arity(),
        }
    }
}

/// A recorded user function.
#[derive(Debug)]
pub struct Function {
    /// Unique per definition; the call stack tracks these, not names.
    pub id: u64,
    pub name: String,
    pub args: Vec<Symbol>,
    pub body: Vec<Instruction>,
    pub return_width: usize,
    pub dynamic: bool,
    pub immutable: bool,
}

/// Structural type of a binding, ignoring widths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Boolean,
    Integer,
    /// `None` when the array is empty and its element shape unknown.
    Array(Option<Box<Shape>>),
}

impl Shape {
    /// Nesting depth: scalars are 0, an empty array is 1.
    pub fn depth(&self) -> usize {
        match self {
            Self::Boolean | Self::Integer => 0,
            Self::Array(None) => 1,
            Self::Array(Some(element)) => 1 + element.depth(),
        }
    }

    /// The common shape of two values, if they can live in one array.
    ///
    /// An empty array only stands in for arrays at most one level deeper
    /// than itself.
    pub fn unify(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Boolean, Self::Boolean) => Some(Self::Boolean),
            (Self::Integer, Self::Integer) => Some(Self::Integer),
            (Self::Array(None), Self::Array(None)) => Some(Self::Array(None)),
            (Self::Array(None), full @ Self::Array(Some(_)))
            | (full @ Self::Array(Some(_)), Self::Array(None)) => {
                (full.depth() <= 2).then(|| full.clone())
            }
            (Self::Array(Some(a)), Self::Array(Some(b))) => {
                a.unify(b).map(|shape| Self::Array(Some(Box::new(shape))))
            }
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Array(_) => "array",
        }
    }
}

/// The common shape of a sequence of bindings, `None` if it is empty.
pub fn unify_all<'a>(bindings: impl IntoIterator<Item = &'a Binding>) -> Result<Option<Shape>> {
    let mut common: Option<Shape> = None;
    for binding in bindings {
        let shape = binding.shape()?;
        common = Some(match common {
            None => shape,
            Some(previous) => previous
                .unify(&shape)
                .ok_or_else(|| type_mismatch(describe(&previous), describe(&shape)))?,
        });
    }
    Ok(common)
}

fn describe(shape: &Shape) -> String {
    match shape {
        Shape::Array(Some(element)) => format!("array of {}", describe(element)),
        Shape::Array(None) => "empty array".to_string(),
        other => other.name().to_string(),
    }
}

/// A declaration shape built from `typedef` instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDef {
    Boolean,
    Integer(usize),
    Array(usize, Box<TypeDef>),
}
