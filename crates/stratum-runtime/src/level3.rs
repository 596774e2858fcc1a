//! Level-3 codec: structured values to Level-2 scalars and back.
//!
//! Arrays are addressed through their element entries, so nesting costs
//! nothing extra here. Optional elements carry a nil decider: a boolean that
//! is true exactly when the element is absent.

use crate::level2::insert_checked;
use crate::value::{Assignment, Value};
use stratum_base::error::type_mismatch;
use stratum_base::{Error, Result, Symbol};
use stratum_format::{Level3Variable, Metadata, ValueType};
use std::collections::BTreeMap;
use tracing::trace;

/// Lowers an assignment document to named Level-2 scalars.
pub fn encode(metadata: &Metadata, assignment: &Assignment) -> Result<BTreeMap<Symbol, Value>> {
    let mut encoder = Encoder {
        metadata,
        scalars: BTreeMap::new(),
    };
    for (name, value) in assignment {
        encoder.encode(name, value)?;
    }
    trace!(scalars = encoder.scalars.len(), "level 3 assignment encoded");
    Ok(encoder.scalars)
}

struct Encoder<'a> {
    metadata: &'a Metadata,
    scalars: BTreeMap<Symbol, Value>,
}

impl Encoder<'_> {
    fn variable(&self, name: &str) -> Result<&Level3Variable> {
        self.metadata
            .level3_variables
            .get(name)
            .ok_or_else(|| Error::UndeclaredSymbol(name.to_string()))
    }

    fn encode(&mut self, name: &str, value: &Value) -> Result<()> {
        let variable = self.variable(name)?.clone();
        match value {
            Value::Unset(_) => return Ok(()),
            Value::Nil => {
                let decider = variable.nil_decider.as_deref().ok_or_else(|| {
                    Error::InvalidArgument(format!("'{name}' is not optional and cannot be null"))
                })?;
                return self.encode(decider, &Value::Boolean(true));
            }
            _ => {}
        }
        if let Some(decider) = &variable.nil_decider {
            self.encode(decider, &Value::Boolean(false))?;
        }

        match (variable.ty, value) {
            (ValueType::Boolean, Value::Boolean(_)) | (ValueType::Integer, Value::Integer(_)) => {
                insert_checked(&mut self.scalars, &variable.symbols[0], value.clone())
            }
            (ValueType::Array, Value::Array(items)) => {
                if items.len() > variable.symbols.len() {
                    return Err(Error::InvalidWidth(format!(
                        "'{name}' holds {} elements but {} were given",
                        variable.symbols.len(),
                        items.len()
                    )));
                }
                for (element, item) in variable.symbols.iter().zip(items) {
                    self.encode(element, item)?;
                }
                Ok(())
            }
            (ValueType::Array, Value::Sparse(items)) => {
                for (key, item) in items {
                    let element = key
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| variable.symbols.get(index))
                        .ok_or_else(|| {
                            Error::InvalidArgument(format!("'{name}' has no element '{key}'"))
                        })?;
                    self.encode(element, item)?;
                }
                Ok(())
            }
            (ty, value) => Err(type_mismatch(type_name(ty), value.kind())),
        }
    }
}

/// Rebuilds the user-facing variables from Level-2 scalars.
///
/// Supporting entries are left out, absent optional values become `null`
/// and arrays lose the elements whose deciders are set.
pub fn decode(metadata: &Metadata, scalars: &BTreeMap<Symbol, Value>) -> Result<Assignment> {
    if scalars.is_empty() {
        return Ok(Assignment::new());
    }
    let decoder = Decoder { metadata, scalars };
    metadata
        .level3_variables
        .iter()
        .filter(|(_, variable)| !variable.supporting)
        .map(|(name, _)| Ok((name.clone(), decoder.decode(name)?.unwrap_or(Value::Nil))))
        .collect()
}

struct Decoder<'a> {
    metadata: &'a Metadata,
    scalars: &'a BTreeMap<Symbol, Value>,
}

impl Decoder<'_> {
    /// `None` when the value is absent.
    fn decode(&self, name: &str) -> Result<Option<Value>> {
        let variable = self
            .metadata
            .level3_variables
            .get(name)
            .ok_or_else(|| Error::UndeclaredSymbol(name.to_string()))?;

        if let Some(decider) = &variable.nil_decider {
            if self.decode(decider)? == Some(Value::Boolean(true)) {
                return Ok(None);
            }
        }

        match variable.ty {
            ValueType::Boolean | ValueType::Integer => {
                let symbol = variable
                    .symbols
                    .first()
                    .ok_or_else(|| Error::MissingValue(name.to_string()))?;
                let value = self
                    .scalars
                    .get(symbol)
                    .ok_or_else(|| Error::MissingValue(name.to_string()))?;
                Ok(Some(value.clone()))
            }
            ValueType::Array => {
                let mut items = Vec::with_capacity(variable.symbols.len());
                for element in &variable.symbols {
                    if let Some(item) = self.decode(element)? {
                        items.push(item);
                    }
                }
                Ok(Some(Value::Array(items)))
            }
        }
    }
}

const fn type_name(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Boolean => "boolean",
        ValueType::Integer => "integer",
        ValueType::Array => "array",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(ty: ValueType, symbol: &str, supporting: bool, decider: Option<&str>) -> Level3Variable {
        Level3Variable {
            ty,
            symbols: vec![symbol.to_string()],
            supporting,
            nil_decider: decider.map(str::to_string),
        }
    }

    /// `arr` is two integers; the second may be nil.
    fn metadata() -> Metadata {
        let mut metadata = Metadata::default();
        let variables = &mut metadata.level3_variables;
        variables.insert(
            "arr".into(),
            Level3Variable {
                ty: ValueType::Array,
                symbols: vec!["e0".into(), "e1".into()],
                supporting: false,
                nil_decider: None,
            },
        );
        variables.insert("e0".into(), scalar(ValueType::Integer, "s0", true, None));
        variables.insert("e1".into(), scalar(ValueType::Integer, "s1", true, Some("d1")));
        variables.insert("d1".into(), scalar(ValueType::Boolean, "n1", true, None));
        variables.insert("flag".into(), scalar(ValueType::Boolean, "f", false, None));
        metadata
    }

    #[test]
    fn test_null_sets_decider_only() {
        let assignment = Assignment::from([(
            "arr".to_string(),
            Value::Array(vec![Value::Integer(123), Value::Nil]),
        )]);
        let scalars = encode(&metadata(), &assignment).unwrap();
        assert_eq!(scalars["s0"], Value::Integer(123));
        assert_eq!(scalars["n1"], Value::Boolean(true));
        assert!(!scalars.contains_key("s1"));
    }

    #[test]
    fn test_present_value_clears_decider() {
        let assignment = Assignment::from([(
            "arr".to_string(),
            Value::Sparse(BTreeMap::from([("1".to_string(), Value::Integer(5))])),
        )]);
        let scalars = encode(&metadata(), &assignment).unwrap();
        assert_eq!(scalars["n1"], Value::Boolean(false));
        assert_eq!(scalars["s1"], Value::Integer(5));
        assert!(!scalars.contains_key("s0"));
    }

    #[test]
    fn test_holes_and_errors() {
        let metadata = metadata();
        let holes = Assignment::from([(
            "arr".to_string(),
            Value::Array(vec![Value::UNSET, Value::Integer(2)]),
        )]);
        assert_eq!(encode(&metadata, &holes).unwrap().len(), 2);

        let too_long = Assignment::from([("arr".to_string(), Value::from(vec![1i64, 2, 3]))]);
        assert!(matches!(encode(&metadata, &too_long), Err(Error::InvalidWidth(_))));

        let not_optional = Assignment::from([("flag".to_string(), Value::Nil)]);
        assert!(matches!(encode(&metadata, &not_optional), Err(Error::InvalidArgument(_))));

        let wrong = Assignment::from([("flag".to_string(), Value::Integer(1))]);
        assert!(matches!(encode(&metadata, &wrong), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_nil_and_value_conflict() {
        let mut metadata = metadata();
        metadata
            .level3_variables
            .insert("second".into(), scalar(ValueType::Integer, "s1", false, Some("d1")));
        let assignment = Assignment::from([
            ("arr".to_string(), Value::Array(vec![Value::UNSET, Value::Nil])),
            ("second".to_string(), Value::Integer(4)),
        ]);
        assert!(matches!(encode(&metadata, &assignment), Err(Error::Conflict(s)) if s == "n1"));
    }

    #[test]
    fn test_decode_shortens_and_hides_supporting() {
        let scalars = BTreeMap::from([
            ("s0".to_string(), Value::Integer(7)),
            ("s1".to_string(), Value::Integer(-1)),
            ("n1".to_string(), Value::Boolean(true)),
            ("f".to_string(), Value::Boolean(false)),
        ]);
        let decoded = decode(&metadata(), &scalars).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded["arr"], Value::from(vec![7i64]));
        assert_eq!(decoded["flag"], Value::Boolean(false));
        assert!(decode(&metadata(), &BTreeMap::new()).unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_full_array() {
        let metadata = metadata();
        let assignment = Assignment::from([
            ("arr".to_string(), Value::from(vec![3i64, -3])),
            ("flag".to_string(), Value::Boolean(true)),
        ]);
        let scalars = encode(&metadata, &assignment).unwrap();
        assert_eq!(decode(&metadata, &scalars).unwrap(), assignment);
    }
}
