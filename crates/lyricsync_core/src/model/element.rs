//! Element descriptor model.
//!
//! # Responsibility
//! - Define the resolved identity a shorthand group decodes to.
//!
//! # Invariants
//! - `atomic_number` is always positive.
//! - Descriptors are immutable once placed in a symbol table.

use serde::{Deserialize, Serialize};

/// Canonical element identity `{symbol, name, atomicNumber}`.
///
/// Several shorthand keys may resolve to the same descriptor; the descriptor
/// itself never records which key matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementDescriptor {
    /// Canonical symbol, e.g. `Zn`.
    pub symbol: String,
    /// Display name, e.g. `Zinc`.
    pub name: String,
    /// Serialized as `atomicNumber` to match the rendering schema.
    #[serde(rename = "atomicNumber")]
    pub atomic_number: u32,
}

impl ElementDescriptor {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, atomic_number: u32) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            atomic_number,
        }
    }
}
