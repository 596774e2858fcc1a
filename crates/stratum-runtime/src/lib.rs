//! # stratum-runtime
//!
//! Translates assignments into solver literals and solver results back into
//! typed values, one level at a time.
//!
//! Encoding runs Level 3 → 2 → 1, decoding runs 1 → 2 → 3. Decoding an empty
//! result (the solver found nothing) always yields an empty document.

pub mod level1;
pub mod level2;
pub mod level3;
pub mod value;

pub use value::{Assignment, Value};

use stratum_base::{Literal, Result};
use stratum_format::Metadata;

/// Encodes a Level-3 assignment into unit literals for the solver.
pub fn encode(metadata: &Metadata, assignment: &Assignment) -> Result<Vec<Literal>> {
    let scalars = level3::encode(metadata, assignment)?;
    let bits = level2::encode(metadata, &scalars)?;
    level1::encode(metadata, &bits)
}

/// Decodes a solver result into user-facing Level-3 values.
pub fn decode(metadata: &Metadata, result: &[Literal]) -> Result<Assignment> {
    let bits = level1::decode(metadata, result)?;
    let scalars = level2::decode(metadata, &bits)?;
    level3::decode(metadata, &scalars)
}
