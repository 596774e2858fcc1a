//! Built-in combinators.
//!
//! Each one unrolls into ordinary calls over the array's static slots. An
//! element that may be nil is visited under a guard (see `apply`). The
//! window combinators first move the present elements to the front.

use super::compiler::Level3Compiler;
use super::scope::Scope;
use super::value::{ArrayValue, Binding, Callable, NilCondition};
use stratum_base::error::type_mismatch;
use stratum_base::{Error, Result, Symbol};

/// The immutable functions every program can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Each,
    Map,
    Reduce,
    Select,
    Reject,
    EachCons,
    EachSlice,
    EachCombination,
    Transpose,
    Reverse,
    PushElement,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "each" => Self::Each,
            "map" => Self::Map,
            "reduce" => Self::Reduce,
            "select" => Self::Select,
            "reject" => Self::Reject,
            "eachCons" => Self::EachCons,
            "eachSlice" => Self::EachSlice,
            "eachCombination" => Self::EachCombination,
            "transpose" => Self::Transpose,
            "reverse" => Self::Reverse,
            "pushElement" => Self::PushElement,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Each => "each",
            Self::Map => "map",
            Self::Reduce => "reduce",
            Self::Select => "select",
            Self::Reject => "reject",
            Self::EachCons => "eachCons",
            Self::EachSlice => "eachSlice",
            Self::EachCombination => "eachCombination",
            Self::Transpose => "transpose",
            Self::Reverse => "reverse",
            Self::PushElement => "pushElement",
        }
    }

    /// Fixed argument count; `reduce` takes an optional initial value.
    pub const fn arity(self) -> Option<usize> {
        match self {
            Self::Transpose | Self::Reverse => Some(1),
            Self::Each | Self::Map | Self::Select | Self::Reject | Self::PushElement => Some(2),
            Self::EachCons | Self::EachSlice | Self::EachCombination => Some(3),
            Self::Reduce => None,
        }
    }

    fn check_arity(self, actual: usize) -> Result<()> {
        let expected = self.arity().unwrap_or(if actual == 3 { 3 } else { 2 });
        if actual == expected {
            Ok(())
        } else {
            Err(Error::ArityMismatch {
                name: self.name().to_string(),
                expected,
                actual,
            })
        }
    }
}

impl Level3Compiler {
    pub(super) fn builtin(
        &mut self,
        scope: &mut Scope<'_>,
        builtin: Builtin,
        args: Vec<Binding>,
    ) -> Result<Vec<Binding>> {
        builtin.check_arity(args.len())?;
        let mut args = args.into_iter();
        let array = next(&mut args)?.into_array()?;

        match builtin {
            Builtin::Each => {
                let callback = next(&mut args)?.into_callable()?;
                for (index, element) in array.elements.iter().enumerate() {
                    let guard = self.nil_at(&array, index);
                    let call_args = self.callback_args(&callback, element.clone(), index);
                    self.apply(scope, &callback, call_args, guard.as_ref())?;
                }
                Ok(vec![])
            }
            Builtin::Map => {
                let callback = next(&mut args)?.into_callable()?;
                let mut elements = Vec::with_capacity(array.len());
                for (index, element) in array.elements.iter().enumerate() {
                    let guard = self.nil_at(&array, index);
                    let call_args = self.callback_args(&callback, element.clone(), index);
                    let results = self.apply(scope, &callback, call_args, guard.as_ref())?;
                    elements.push(single(&callback, results)?);
                }
                let mapped = ArrayValue {
                    elements,
                    nil_conditions: array.nil_conditions.clone(),
                };
                mapped.element_shape()?;
                Ok(vec![Binding::Array(mapped)])
            }
            Builtin::Reduce => {
                let (mut accumulator, start) = if args.len() == 2 {
                    (next(&mut args)?, 0)
                } else {
                    let first = array.elements.first().cloned().ok_or_else(|| {
                        Error::InvalidArgument("reduce of an empty array needs an initial value".into())
                    })?;
                    (first, 1)
                };
                let callback = next(&mut args)?.into_callable()?;
                // Holds while no present element has reached the accumulator yet
                let mut unseeded = if start == 1 { self.nil_at(&array, 0) } else { None };
                for index in start..array.len() {
                    let absent = self.nil_at(&array, index);
                    let guard = match (&absent, &unseeded) {
                        (Some(a), Some(u)) => Some(self.or(a, u)),
                        (a, u) => a.clone().or_else(|| u.clone()),
                    };
                    let element = array.elements[index].clone();
                    let call_args = vec![accumulator.clone(), element.clone()];
                    let results = self.apply(scope, &callback, call_args, guard.as_ref())?;
                    let mut reduced = single(&callback, results)?;
                    if let Some(unseeded) = &unseeded {
                        reduced = self.merge(unseeded, element, reduced)?;
                    }
                    accumulator = match &absent {
                        Some(absent) => self.merge(absent, accumulator, reduced)?,
                        None => reduced,
                    };
                    unseeded = match (unseeded, absent) {
                        (Some(u), Some(a)) => Some(self.and(&u, &a)),
                        _ => None,
                    };
                }
                Ok(vec![accumulator])
            }
            Builtin::Select | Builtin::Reject => {
                let callback = next(&mut args)?.into_callable()?;
                let mut filtered = array.clone();
                for (index, element) in array.elements.iter().enumerate() {
                    let guard = self.nil_at(&array, index);
                    let call_args = self.callback_args(&callback, element.clone(), index);
                    let results = self.apply(scope, &callback, call_args, guard.as_ref())?;
                    let keep = single(&callback, results)?.into_boolean()?;
                    let dropped = if builtin == Builtin::Select {
                        self.not(&keep)
                    } else {
                        keep
                    };
                    filtered.nil_conditions.push(NilCondition::at(dropped, index));
                }
                Ok(vec![Binding::Array(filtered)])
            }
            Builtin::EachCons | Builtin::EachSlice | Builtin::EachCombination => {
                let size = static_size(builtin, next(&mut args)?)?;
                let callback = next(&mut args)?.into_callable()?;
                // Windows run over the present elements only
                let array = self.compact(&array)?;
                let groups: Vec<ArrayValue> = match builtin {
                    Builtin::EachCons => (0..(array.len() + 1).saturating_sub(size))
                        .map(|start| array.window(start, size))
                        .collect(),
                    Builtin::EachSlice => (0..array.len())
                        .step_by(size)
                        .map(|start| array.window(start, size.min(array.len() - start)))
                        .collect(),
                    _ => combinations(array.len(), size)
                        .iter()
                        .map(|indices| array.pick(indices))
                        .collect(),
                };
                for (index, group) in groups.into_iter().enumerate() {
                    // A slice exists once its first slot does; the other
                    // groups need every slot.
                    let guard = if builtin == Builtin::EachSlice {
                        self.nil_at(&group, 0)
                    } else {
                        let conditions: Vec<Symbol> = group
                            .nil_conditions
                            .iter()
                            .map(|nil| nil.condition.clone())
                            .collect();
                        (!conditions.is_empty()).then(|| self.or_all(&conditions))
                    };
                    let call_args = self.callback_args(&callback, Binding::Array(group), index);
                    self.apply(scope, &callback, call_args, guard.as_ref())?;
                }
                Ok(vec![])
            }
            Builtin::Transpose => self.transpose(&array).map(|t| vec![Binding::Array(t)]),
            Builtin::Reverse => {
                let last = array.len().saturating_sub(1);
                let reversed = ArrayValue {
                    elements: array.elements.iter().rev().cloned().collect(),
                    nil_conditions: array
                        .nil_conditions
                        .iter()
                        .map(|nil| NilCondition {
                            condition: nil.condition.clone(),
                            index: nil.index.map(|i| last - i),
                        })
                        .collect(),
                };
                Ok(vec![Binding::Array(reversed)])
            }
            Builtin::PushElement => {
                let element = next(&mut args)?;
                let mut extended = array;
                extended.elements.push(element);
                extended.element_shape()?;
                Ok(vec![Binding::Array(extended)])
            }
        }
    }

    /// Element first, then its index when the callback takes two arguments.
    fn callback_args(&mut self, callback: &Callable, element: Binding, index: usize) -> Vec<Binding> {
        if callback.arity() == Some(2) {
            vec![element, self.integer(index as i64)]
        } else {
            vec![element]
        }
    }

    /// Rows become columns. Short rows leave holes, which become nil
    /// conditions of the column they fall in.
    fn transpose(&mut self, array: &ArrayValue) -> Result<ArrayValue> {
        let rows = array
            .elements
            .iter()
            .map(|row| row.clone().into_array())
            .collect::<Result<Vec<_>>>()?;
        let element_shape = rows
            .iter()
            .map(ArrayValue::element_shape)
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .next();
        let longest = rows.iter().map(ArrayValue::len).max().unwrap_or(0);

        let mut columns = Vec::with_capacity(longest);
        for column in 0..longest {
            let mut elements = Vec::with_capacity(rows.len());
            let mut nil_conditions = Vec::new();
            for (r, row) in rows.iter().enumerate() {
                match row.elements.get(column) {
                    Some(element) => elements.push(element.clone()),
                    None => {
                        elements.push(self.fallback(element_shape.as_ref()));
                        let missing = self.boolean_constant(true);
                        nil_conditions.push(NilCondition::at(missing, r));
                    }
                }
                for nil in row.conditions_at(column).chain(array.conditions_at(r)) {
                    nil_conditions.push(NilCondition::at(nil.clone(), r));
                }
            }
            columns.push(Binding::Array(ArrayValue {
                elements,
                nil_conditions,
            }));
        }
        Ok(ArrayValue::new(columns))
    }
}

fn next(args: &mut impl Iterator<Item = Binding>) -> Result<Binding> {
    args.next().ok_or(Error::StackUnderflow)
}

fn single(callback: &Callable, mut results: Vec<Binding>) -> Result<Binding> {
    if results.len() != 1 {
        return Err(Error::ArityMismatch {
            name: format!("{} (return values)", callback.name()),
            expected: 1,
            actual: results.len(),
        });
    }
    results.pop().ok_or(Error::StackUnderflow)
}

fn static_size(builtin: Builtin, binding: Binding) -> Result<usize> {
    match binding {
        Binding::Integer {
            constant: Some(n), ..
        } if n > 0 => usize::try_from(n).map_err(|e| Error::InvalidArgument(e.to_string())),
        Binding::Integer { .. } => Err(Error::InvalidArgument(format!(
            "{} needs a positive constant size",
            builtin.name()
        ))),
        other => Err(type_mismatch("integer", other.type_name())),
    }
}

/// All `k`-element index subsets of `0..n`, in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k > n {
        return Vec::new();
    }
    let mut result = Vec::new();
    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        result.push(indices.clone());
        let Some(i) = (0..k).rev().find(|&i| indices[i] < n - k + i) else {
            return result;
        };
        indices[i] += 1;
        for j in i + 1..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}
