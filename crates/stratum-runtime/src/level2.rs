//! Level-2 codec: booleans and integers to Level-1 bits and back.

use crate::value::Value;
use stratum_base::error::type_mismatch;
use stratum_base::{twos_complement, Error, Result, Symbol};
use stratum_format::{Metadata, ScalarType};
use std::collections::BTreeMap;

/// Lowers named scalars to named Level-1 bits.
pub fn encode(
    metadata: &Metadata,
    assignment: &BTreeMap<Symbol, Value>,
) -> Result<BTreeMap<Symbol, bool>> {
    let mut bits = BTreeMap::new();
    for (name, value) in assignment {
        let variable = metadata
            .level2_variables
            .get(name)
            .ok_or_else(|| Error::UndeclaredSymbol(name.clone()))?;
        let values = match (variable.ty, value) {
            (ScalarType::Boolean, Value::Boolean(b)) => vec![*b],
            (ScalarType::Integer, Value::Integer(n)) => {
                twos_complement::pad(&twos_complement::encode(*n), variable.symbols.len())
                    .map_err(|_| Error::IntegerOverflow {
                        value: n.to_string(),
                        width: variable.symbols.len(),
                    })?
            }
            (ScalarType::Boolean, other) => return Err(type_mismatch("boolean", other.kind())),
            (ScalarType::Integer, other) => return Err(type_mismatch("integer", other.kind())),
        };
        for (symbol, bit) in variable.symbols.iter().zip(values) {
            insert_checked(&mut bits, symbol, bit)?;
        }
    }
    Ok(bits)
}

/// Reassembles named scalars from Level-1 bits.
pub fn decode(
    metadata: &Metadata,
    bits: &BTreeMap<Symbol, bool>,
) -> Result<BTreeMap<Symbol, Value>> {
    if bits.is_empty() {
        return Ok(BTreeMap::new());
    }
    metadata
        .level2_variables
        .iter()
        .map(|(name, variable)| {
            let values = variable
                .symbols
                .iter()
                .map(|symbol| {
                    bits.get(symbol)
                        .copied()
                        .ok_or_else(|| Error::MissingValue(name.clone()))
                })
                .collect::<Result<Vec<bool>>>()?;
            let value = match variable.ty {
                ScalarType::Boolean => Value::Boolean(values.first().copied().unwrap_or(false)),
                ScalarType::Integer => Value::Integer(twos_complement::decode(&values)?),
            };
            Ok((name.clone(), value))
        })
        .collect()
}

/// Binds a symbol once; binding it again to a different value is a conflict.
pub(crate) fn insert_checked<V: PartialEq>(
    map: &mut BTreeMap<Symbol, V>,
    symbol: &str,
    value: V,
) -> Result<()> {
    match map.get(symbol) {
        Some(existing) if *existing != value => Err(Error::Conflict(symbol.to_string())),
        Some(_) => Ok(()),
        None => {
            map.insert(symbol.to_string(), value);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stratum_format::Level2Variable;

    fn metadata() -> Metadata {
        let mut metadata = Metadata::default();
        metadata.level2_variables.insert(
            "flag".into(),
            Level2Variable {
                ty: ScalarType::Boolean,
                symbols: vec!["f".into()],
            },
        );
        metadata.level2_variables.insert(
            "n".into(),
            Level2Variable {
                ty: ScalarType::Integer,
                symbols: (0..8).map(|i| format!("n{i}")).collect(),
            },
        );
        metadata
    }

    #[test]
    fn test_minus_one_is_all_ones() {
        let assignment = BTreeMap::from([("n".to_string(), Value::Integer(-1))]);
        let bits = encode(&metadata(), &assignment).unwrap();
        assert_eq!(bits.len(), 8);
        assert!(bits.values().all(|&bit| bit));
    }

    #[test]
    fn test_rejects_over_width_and_wrong_type() {
        let metadata = metadata();
        let too_big = BTreeMap::from([("n".to_string(), Value::Integer(128))]);
        assert!(matches!(
            encode(&metadata, &too_big),
            Err(Error::IntegerOverflow { width: 8, .. })
        ));
        let wrong = BTreeMap::from([("flag".to_string(), Value::Integer(1))]);
        assert!(matches!(encode(&metadata, &wrong), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_shared_bits_conflict() {
        let mut metadata = metadata();
        metadata.level2_variables.insert(
            "alias".into(),
            Level2Variable {
                ty: ScalarType::Boolean,
                symbols: vec!["f".into()],
            },
        );
        let same = BTreeMap::from([
            ("flag".to_string(), Value::Boolean(true)),
            ("alias".to_string(), Value::Boolean(true)),
        ]);
        assert!(encode(&metadata, &same).is_ok());
        let different = BTreeMap::from([
            ("flag".to_string(), Value::Boolean(true)),
            ("alias".to_string(), Value::Boolean(false)),
        ]);
        assert!(matches!(encode(&metadata, &different), Err(Error::Conflict(s)) if s == "f"));
    }

    #[test]
    fn test_partial_bits_are_missing() {
        let bits = BTreeMap::from([("f".to_string(), true)]);
        assert!(matches!(decode(&metadata(), &bits), Err(Error::MissingValue(s)) if s == "n"));
    }

    proptest! {
        #[test]
        fn prop_round_trip(n in -128i64..128, flag: bool) {
            let metadata = metadata();
            let assignment = BTreeMap::from([
                ("flag".to_string(), Value::Boolean(flag)),
                ("n".to_string(), Value::Integer(n)),
            ]);
            let bits = encode(&metadata, &assignment).unwrap();
            prop_assert_eq!(decode(&metadata, &bits).unwrap(), assignment);
        }
    }
}
