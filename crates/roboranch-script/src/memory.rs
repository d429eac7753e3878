//! Bounded per-robot scratch memory.
//!
//! The only state a robot program can carry from one run to the next.
//! Entries are plain [`MemoryValue`] trees keyed by short strings; the
//! store refuses writes that would exceed its entry, key, or size bounds.

use std::collections::BTreeMap;

use roboranch_types::MemoryValue;

use crate::error::ScriptError;

/// Maximum number of keys a robot may keep.
pub const MAX_MEMORY_ENTRIES: usize = 64;

/// Maximum key length in bytes.
pub const MAX_KEY_LEN: usize = 64;

/// Maximum number of nodes in a single stored value.
pub const MAX_VALUE_NODES: usize = 256;

/// A robot's persistent key/value memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptMemory {
    entries: BTreeMap<String, MemoryValue>,
}

impl ScriptMemory {
    /// Create an empty memory.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Rebuild memory from a snapshot, dropping entries that break the
    /// bounds.
    pub fn from_entries(entries: BTreeMap<String, MemoryValue>) -> Self {
        let mut memory = Self::new();
        for (key, value) in entries {
            if memory.set(&key, value).is_err() {
                tracing::warn!(key = %key, "Dropping oversized memory entry on restore");
            }
        }
        memory
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&MemoryValue> {
        self.entries.get(key)
    }

    /// Store a value. Writing [`MemoryValue::Null`] removes the key.
    pub fn set(&mut self, key: &str, value: MemoryValue) -> Result<(), ScriptError> {
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(ScriptError::MemoryLimit {
                reason: format!("key length must be 1..={MAX_KEY_LEN} bytes"),
            });
        }
        if value == MemoryValue::Null {
            self.entries.remove(key);
            return Ok(());
        }
        let nodes = value.node_count();
        if nodes > MAX_VALUE_NODES {
            return Err(ScriptError::MemoryLimit {
                reason: format!("value has {nodes} nodes, limit is {MAX_VALUE_NODES}"),
            });
        }
        if !self.entries.contains_key(key) && self.entries.len() >= MAX_MEMORY_ENTRIES {
            return Err(ScriptError::MemoryLimit {
                reason: format!("memory is full ({MAX_MEMORY_ENTRIES} keys)"),
            });
        }
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Borrow the raw entries for snapshotting.
    pub const fn entries(&self) -> &BTreeMap<String, MemoryValue> {
        &self.entries
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_get_and_null_removes() {
        let mut mem = ScriptMemory::new();
        mem.set("home_x", MemoryValue::Int(4)).unwrap();
        assert_eq!(mem.get("home_x").and_then(MemoryValue::as_int), Some(4));
        mem.set("home_x", MemoryValue::Null).unwrap();
        assert!(mem.get("home_x").is_none());
        assert!(mem.is_empty());
    }

    #[test]
    fn entry_limit_allows_overwrite() {
        let mut mem = ScriptMemory::new();
        for i in 0..MAX_MEMORY_ENTRIES {
            mem.set(&format!("k{i}"), MemoryValue::Bool(true)).unwrap();
        }
        assert!(mem.set("one_more", MemoryValue::Bool(true)).is_err());
        assert!(mem.set("k0", MemoryValue::Int(1)).is_ok());
        assert_eq!(mem.len(), MAX_MEMORY_ENTRIES);
    }

    #[test]
    fn rejects_bad_keys_and_huge_values() {
        let mut mem = ScriptMemory::new();
        assert!(mem.set("", MemoryValue::Int(1)).is_err());
        assert!(mem.set(&"k".repeat(MAX_KEY_LEN + 1), MemoryValue::Int(1)).is_err());
        let big = MemoryValue::List(vec![MemoryValue::Int(0); MAX_VALUE_NODES]);
        assert!(matches!(
            mem.set("big", big),
            Err(ScriptError::MemoryLimit { .. })
        ));
    }

    #[test]
    fn restore_drops_invalid_entries() {
        let mut raw = BTreeMap::new();
        raw.insert("ok".to_owned(), MemoryValue::Text("fine".to_owned()));
        raw.insert(String::new(), MemoryValue::Int(1));
        let mem = ScriptMemory::from_entries(raw);
        assert_eq!(mem.len(), 1);
    }
}
