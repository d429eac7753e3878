//! JSON-like values stored in a robot's persistent memory.
//!
//! Robot scripts keep scratch state between invocations in a small
//! key/value store. Values are restricted to this plain-data tree so the
//! memory can be bounded, serialized into snapshots, and never holds a
//! handle back into the engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A plain-data value held in robot memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemoryValue {
    /// Absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A string.
    Text(String),
    /// An ordered list.
    List(Vec<Self>),
    /// A string-keyed map.
    Map(BTreeMap<String, Self>),
}

impl MemoryValue {
    /// Number of nodes in this value tree, counting containers and leaves.
    pub fn node_count(&self) -> usize {
        match self {
            Self::List(items) => items
                .iter()
                .fold(1_usize, |acc, v| acc.saturating_add(v.node_count())),
            Self::Map(entries) => entries
                .values()
                .fold(1_usize, |acc, v| acc.saturating_add(v.node_count())),
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Text(_) => 1,
        }
    }

    /// Return the integer payload, if this is an integer.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}
