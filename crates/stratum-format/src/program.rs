//! Program documents exchanged between pipeline levels.
//!
//! Every level consumes a `Program` of its own instruction type and emits a
//! `Program` of the level below. The `metadata` map travels along and picks
//! up one variable table per level.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use stratum_base::{Literal, Result, Symbol};
use std::collections::BTreeMap;

/// Scalar types known to Level 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Boolean,
    Integer,
}

/// Value types known to Level 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Boolean,
    Integer,
    Array,
}

impl From<ScalarType> for ValueType {
    fn from(ty: ScalarType) -> Self {
        match ty {
            ScalarType::Boolean => Self::Boolean,
            ScalarType::Integer => Self::Integer,
        }
    }
}

/// An exposed Level-2 variable: its type and Level-1 symbols (MSB first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level2Variable {
    #[serde(rename = "type")]
    pub ty: ScalarType,
    pub symbols: Vec<Symbol>,
}

/// An exposed Level-3 variable.
///
/// Scalars carry their single Level-2 symbol; arrays carry the Level-3 names
/// of their elements, each of which has its own (supporting) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level3Variable {
    #[serde(rename = "type")]
    pub ty: ValueType,
    pub symbols: Vec<Symbol>,
    /// Internal helper, hidden from decoded results.
    #[serde(default, skip_serializing_if = "is_false")]
    pub supporting: bool,
    /// Boolean variable that is true when this value is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nil_decider: Option<Symbol>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Metadata carried through the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub level1_variables: BTreeMap<Symbol, Literal>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub level2_variables: BTreeMap<Symbol, Level2Variable>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub level3_variables: BTreeMap<Symbol, Level3Variable>,
    /// Anything else the producer attached; passed through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// An ordered instruction list plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program<I> {
    pub instructions: Vec<I>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl<I> Program<I> {
    /// Creates a program with empty metadata.
    #[must_use]
    pub fn new(instructions: Vec<I>) -> Self {
        Self {
            instructions,
            metadata: Metadata::default(),
        }
    }
}

impl<I: DeserializeOwned> Program<I> {
    /// Parses from JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<I: Serialize> Program<I> {
    /// Serializes to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The output of the full pipeline: DIMACS text plus every variable table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledProgram {
    pub metadata: Metadata,
    pub dimacs: String,
}

impl CompiledProgram {
    /// Parses from JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
