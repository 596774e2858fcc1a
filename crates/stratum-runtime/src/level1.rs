//! Level-1 codec: symbols to literals and back.

use stratum_base::{Error, Literal, Result, Symbol};
use stratum_format::Metadata;
use std::collections::{BTreeMap, HashMap};

/// Turns named booleans into signed literals.
pub fn encode(metadata: &Metadata, assignment: &BTreeMap<Symbol, bool>) -> Result<Vec<Literal>> {
    assignment
        .iter()
        .map(|(symbol, &value)| {
            let literal = *metadata
                .level1_variables
                .get(symbol)
                .ok_or_else(|| Error::UndeclaredSymbol(symbol.clone()))?;
            Ok(if value { literal } else { -literal })
        })
        .collect()
}

/// Reads every exposed symbol out of a solver result.
///
/// An empty result means "unsatisfiable" and decodes to an empty map.
pub fn decode(metadata: &Metadata, result: &[Literal]) -> Result<BTreeMap<Symbol, bool>> {
    if result.is_empty() {
        return Ok(BTreeMap::new());
    }
    let values: HashMap<u64, bool> = result
        .iter()
        .map(|&lit| (lit.unsigned_abs(), lit > 0))
        .collect();

    metadata
        .level1_variables
        .iter()
        .map(|(symbol, &literal)| {
            let value = values
                .get(&literal.unsigned_abs())
                .ok_or_else(|| Error::MissingValue(symbol.clone()))?;
            Ok((symbol.clone(), *value == (literal > 0)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> Metadata {
        let mut metadata = Metadata::default();
        metadata.level1_variables.insert("a".into(), 1);
        metadata.level1_variables.insert("b".into(), 2);
        // Aliased to the negation of a.
        metadata.level1_variables.insert("not_a".into(), -1);
        metadata
    }

    #[test]
    fn test_encode_decode() {
        let metadata = metadata();
        let assignment = BTreeMap::from([("a".to_string(), true), ("b".to_string(), false)]);
        let literals = encode(&metadata, &assignment).unwrap();
        assert_eq!(literals, vec![1, -2]);

        let decoded = decode(&metadata, &literals).unwrap();
        assert_eq!(decoded["a"], true);
        assert_eq!(decoded["b"], false);
        assert_eq!(decoded["not_a"], false);
    }

    #[test]
    fn test_unknown_and_missing() {
        let metadata = metadata();
        let assignment = BTreeMap::from([("zz".to_string(), true)]);
        assert!(matches!(encode(&metadata, &assignment), Err(Error::UndeclaredSymbol(_))));
        assert!(decode(&metadata, &[]).unwrap().is_empty());
        assert!(matches!(decode(&metadata, &[1]), Err(Error::MissingValue(s)) if s == "b"));
    }
}
