//! Array lowering: symbolic indexing, bounds, branching and equality.
//!
//! An element that may be missing is tracked by nil conditions rather than by
//! changing the array's static length, so every array keeps a fixed number of
//! Level-2 slots and the conditions say which of them really exist.

use super::compiler::Level3Compiler;
use super::value::{unify_all, ArrayValue, Binding, NilCondition, Shape};
use crate::level2::Instruction as L2;
use stratum_base::error::type_mismatch;
use stratum_base::{Error, Result, Symbol};

impl Level3Compiler {
    /// OR of the nil conditions covering `index`, if any.
    pub(super) fn nil_at(&mut self, array: &ArrayValue, index: usize) -> Option<Symbol> {
        let conditions: Vec<Symbol> = array.conditions_at(index).cloned().collect();
        match conditions.len() {
            0 => None,
            1 => conditions.into_iter().next(),
            _ => Some(self.or_all(&conditions)),
        }
    }

    /// The value substituted for an element that does not exist.
    pub(super) fn fallback(&mut self, shape: Option<&Shape>) -> Binding {
        match shape {
            Some(Shape::Integer) => self.integer(-1),
            Some(Shape::Array(_)) => Binding::Array(ArrayValue::default()),
            Some(Shape::Boolean) | None => Binding::Boolean(self.boolean_constant(false)),
        }
    }

    /// `getIndex`: the element at a static index, or a fallback past the end.
    pub(super) fn element_at(&mut self, array: &ArrayValue, index: i64) -> Result<Binding> {
        match usize::try_from(index).ok().and_then(|i| array.elements.get(i)) {
            Some(element) => Ok(element.clone()),
            None => {
                let shape = array.element_shape()?;
                Ok(self.fallback(shape.as_ref()))
            }
        }
    }

    /// `get`: the element at a symbolic index.
    pub(super) fn select(
        &mut self,
        array: &ArrayValue,
        index: &Symbol,
        constant: Option<i64>,
    ) -> Result<Binding> {
        if let Some(value) = constant {
            return self.element_at(array, value);
        }
        if array.is_empty() {
            return Ok(self.fallback(None));
        }
        let guards: Vec<Symbol> = (0..array.len())
            .map(|i| self.index_equals(index, i))
            .collect();
        self.multiplex(&array.elements, &guards)
    }

    pub(super) fn index_equals(&mut self, index: &Symbol, position: usize) -> Symbol {
        let constant = self.integer_constant(position as i64);
        self.operation(&[index, &constant], L2::Equal)
    }

    /// Picks `candidates[i]` where `guards[i]` holds; the guards are mutually
    /// exclusive. Nested arrays are transposed and each slice multiplexed,
    /// so the result is as long as the longest candidate.
    fn multiplex(&mut self, candidates: &[Binding], guards: &[Symbol]) -> Result<Binding> {
        let shape = unify_all(candidates.iter())?;
        match shape {
            Some(Shape::Boolean) => {
                let mut acc = self.boolean_constant(false);
                for (candidate, guard) in candidates.iter().zip(guards) {
                    let value = candidate.clone().into_boolean()?;
                    acc = self.choose(guard, &value, &acc);
                }
                Ok(Binding::Boolean(acc))
            }
            Some(Shape::Integer) => {
                let mut acc = self.integer_constant(-1);
                for (candidate, guard) in candidates.iter().zip(guards) {
                    let (value, _) = candidate.clone().into_integer()?;
                    acc = self.choose(guard, &value, &acc);
                }
                Ok(Binding::Integer {
                    symbol: acc,
                    constant: None,
                })
            }
            Some(Shape::Array(element_shape)) => {
                let children = candidates
                    .iter()
                    .map(|candidate| candidate.clone().into_array())
                    .collect::<Result<Vec<_>>>()?;
                let longest = children.iter().map(ArrayValue::len).max().unwrap_or(0);

                let mut elements = Vec::with_capacity(longest);
                for position in 0..longest {
                    let mut slice = Vec::with_capacity(children.len());
                    for child in &children {
                        let element = match child.elements.get(position) {
                            Some(element) => element.clone(),
                            None => self.fallback(element_shape.as_deref()),
                        };
                        slice.push(element);
                    }
                    elements.push(self.multiplex(&slice, guards)?);
                }

                let mut nil_conditions = Vec::new();
                for (child, guard) in children.iter().zip(guards) {
                    for missing in child.len()..longest {
                        nil_conditions.push(NilCondition::at(guard.clone(), missing));
                    }
                    for condition in &child.nil_conditions {
                        nil_conditions.push(NilCondition {
                            condition: self.and(guard, &condition.condition),
                            index: condition.index,
                        });
                    }
                }
                Ok(Binding::Array(ArrayValue {
                    elements,
                    nil_conditions,
                }))
            }
            None => Ok(self.fallback(None)),
        }
    }

    /// The present elements moved to the front, in order. Slot `k` is absent
    /// when fewer than `k + 1` elements are present.
    pub(super) fn compact(&mut self, array: &ArrayValue) -> Result<ArrayValue> {
        if array.nil_conditions.is_empty() {
            return Ok(array.clone());
        }

        // counts[i]: present elements before slot i
        let zero = self.integer_constant(0);
        let one = self.integer_constant(1);
        let mut counts = Vec::with_capacity(array.len());
        let mut presence = Vec::with_capacity(array.len());
        let mut total = zero.clone();
        for index in 0..array.len() {
            counts.push(total.clone());
            let absent = self.nil_at(array, index);
            let step = match &absent {
                Some(absent) => self.choose(absent, &zero, &one),
                None => one.clone(),
            };
            total = self.operation(&[&total, &step], L2::Add);
            presence.push(absent.map(|absent| self.not(&absent)));
        }

        let mut elements = Vec::with_capacity(array.len());
        let mut nil_conditions = Vec::with_capacity(array.len());
        for slot in 0..array.len() {
            let mut guards = Vec::with_capacity(array.len() - slot);
            for index in slot..array.len() {
                let ranked = self.index_equals(&counts[index], slot);
                guards.push(match &presence[index] {
                    Some(present) => self.and(present, &ranked),
                    None => ranked,
                });
            }
            elements.push(self.multiplex(&array.elements[slot..], &guards)?);

            let position = self.integer_constant(slot as i64);
            let short = self.operation(&[&total, &position], L2::LessEqual);
            nil_conditions.push(NilCondition::at(short, slot));
        }
        Ok(ArrayValue {
            elements,
            nil_conditions,
        })
    }

    /// True when `index` is outside the array or names an absent element.
    pub(super) fn bounds(&mut self, array: &ArrayValue, index: &Symbol, constant: Option<i64>) -> Symbol {
        if let Some(value) = constant {
            return match usize::try_from(value).ok().filter(|&i| i < array.len()) {
                Some(position) => {
                    let conditions: Vec<Symbol> = array.conditions_at(position).cloned().collect();
                    self.or_all(&conditions)
                }
                None => self.boolean_constant(true),
            };
        }

        let zero = self.integer_constant(0);
        let length = self.integer_constant(array.len() as i64);
        let mut conditions = vec![
            self.operation(&[index, &zero], L2::LessThan),
            self.operation(&[index, &length], L2::GreaterEqual),
        ];
        for condition in &array.nil_conditions {
            let applies = match condition.index {
                Some(position) => {
                    let here = self.index_equals(index, position);
                    self.and(&here, &condition.condition)
                }
                None => condition.condition.clone(),
            };
            conditions.push(applies);
        }
        self.or_all(&conditions)
    }

    /// `fetch`: `get` that either forbids out-of-bounds access or falls back
    /// to a caller-supplied default.
    pub(super) fn fetch(
        &mut self,
        array: &ArrayValue,
        index: &Symbol,
        constant: Option<i64>,
        default: Option<Binding>,
    ) -> Result<Binding> {
        let out_of_bounds = self.bounds(array, index, constant);
        match default {
            None => {
                let inside = self.not(&out_of_bounds);
                self.assert(&inside);
                self.select(array, index, constant)
            }
            Some(default) => {
                let default_shape = default.shape()?;
                if let Some(element_shape) = array.element_shape()? {
                    if element_shape.unify(&default_shape).is_none() {
                        return Err(type_mismatch(element_shape.name(), default_shape.name()));
                    }
                } else {
                    return Ok(default);
                }
                let element = self.select(array, index, constant)?;
                self.merge(&out_of_bounds, default, element)
            }
        }
    }

    /// Number of present elements.
    pub(super) fn width(&mut self, array: &ArrayValue) -> Binding {
        if array.nil_conditions.is_empty() {
            return self.integer(array.len() as i64);
        }
        let present = array
            .elements
            .iter()
            .enumerate()
            .filter(|(index, _)| array.conditions_at(*index).next().is_none())
            .count();
        let mut total = self.integer_constant(present as i64);
        let zero = self.integer_constant(0);
        let one = self.integer_constant(1);
        for index in 0..array.len() {
            if let Some(absent) = self.nil_at(array, index) {
                let counted = self.choose(&absent, &zero, &one);
                total = self.operation(&[&total, &counted], L2::Add);
            }
        }
        Binding::Integer {
            symbol: total,
            constant: None,
        }
    }

    /// `if` over any two values of the same shape.
    ///
    /// Arrays are merged index by index across the longer branch; each
    /// branch's nil conditions only count when that branch is taken.
    pub(super) fn merge(&mut self, condition: &Symbol, then: Binding, otherwise: Binding) -> Result<Binding> {
        match (then, otherwise) {
            (Binding::Boolean(t), Binding::Boolean(f)) => {
                Ok(Binding::Boolean(self.choose(condition, &t, &f)))
            }
            (
                Binding::Integer {
                    symbol: t,
                    constant: t_value,
                },
                Binding::Integer {
                    symbol: f,
                    constant: f_value,
                },
            ) => Ok(Binding::Integer {
                symbol: self.choose(condition, &t, &f),
                constant: t_value.filter(|_| t_value == f_value),
            }),
            (Binding::Array(t), Binding::Array(f)) => {
                let shape = unify_all([&Binding::Array(t.clone()), &Binding::Array(f.clone())])?;
                let element_shape = match shape {
                    Some(Shape::Array(element)) => element,
                    _ => None,
                };
                let longest = t.len().max(f.len());
                let mut elements = Vec::with_capacity(longest);
                for position in 0..longest {
                    let then_element = match t.elements.get(position) {
                        Some(element) => element.clone(),
                        None => self.fallback(element_shape.as_deref()),
                    };
                    let else_element = match f.elements.get(position) {
                        Some(element) => element.clone(),
                        None => self.fallback(element_shape.as_deref()),
                    };
                    elements.push(self.merge(condition, then_element, else_element)?);
                }

                let negated = self.not(condition);
                let mut nil_conditions = Vec::new();
                for missing in t.len()..longest {
                    nil_conditions.push(NilCondition::at(condition.clone(), missing));
                }
                for missing in f.len()..longest {
                    nil_conditions.push(NilCondition::at(negated.clone(), missing));
                }
                for nil in &t.nil_conditions {
                    nil_conditions.push(NilCondition {
                        condition: self.and(condition, &nil.condition),
                        index: nil.index,
                    });
                }
                for nil in &f.nil_conditions {
                    nil_conditions.push(NilCondition {
                        condition: self.and(&negated, &nil.condition),
                        index: nil.index,
                    });
                }
                Ok(Binding::Array(ArrayValue {
                    elements,
                    nil_conditions,
                }))
            }
            (Binding::Function(_), Binding::Function(_)) => Err(Error::InvalidArgument(
                "cannot branch between functions".into(),
            )),
            (t, f) => Err(type_mismatch(t.type_name(), f.type_name())),
        }
    }

    /// `equal` over any two values of the same shape.
    pub(super) fn equal(&mut self, a: &Binding, b: &Binding) -> Result<Symbol> {
        match (a, b) {
            (Binding::Boolean(x), Binding::Boolean(y)) => Ok(self.operation(&[x, y], L2::Equal)),
            (Binding::Integer { symbol: x, .. }, Binding::Integer { symbol: y, .. }) => {
                Ok(self.operation(&[x, y], L2::Equal))
            }
            (Binding::Array(x), Binding::Array(y)) => self.equal_arrays(x, y),
            (a, b) => Err(type_mismatch(a.type_name(), b.type_name())),
        }
    }

    /// Arrays are equal when the same positions are present and the present
    /// elements are pairwise equal.
    fn equal_arrays(&mut self, a: &ArrayValue, b: &ArrayValue) -> Result<Symbol> {
        if a.nil_conditions.is_empty() && b.nil_conditions.is_empty() && a.len() != b.len() {
            return Ok(self.boolean_constant(false));
        }

        let longest = a.len().max(b.len());
        let mut terms = Vec::with_capacity(longest);
        for position in 0..longest {
            let a_present = self.presence(a, position);
            let b_present = self.presence(b, position);
            let same = match (a.elements.get(position), b.elements.get(position)) {
                (Some(x), Some(y)) => self.equal(x, y)?,
                _ => self.boolean_constant(true),
            };
            let term = match (a_present, b_present) {
                (None, None) => same,
                (a_present, b_present) => {
                    let a_present = a_present.unwrap_or_else(|| self.boolean_constant(true));
                    let b_present = b_present.unwrap_or_else(|| self.boolean_constant(true));
                    let matching = self.operation(&[&a_present, &b_present], L2::Equal);
                    let absent = self.not(&a_present);
                    let implied = self.or(&absent, &same);
                    self.and(&matching, &implied)
                }
            };
            terms.push(term);
        }
        Ok(self.and_all(&terms))
    }

    /// `None` when the element is always present, else a presence boolean.
    fn presence(&mut self, array: &ArrayValue, position: usize) -> Option<Symbol> {
        if position >= array.len() {
            return Some(self.boolean_constant(false));
        }
        self.nil_at(array, position)
            .map(|absent| self.not(&absent))
    }
}
