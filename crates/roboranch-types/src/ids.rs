//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Robots are addressed by a strongly-typed ID so that operator commands,
//! harvest events, and snapshots cannot confuse them with any other key.
//! All IDs use UUID v7 (time-ordered), which keeps fleet listings in
//! deployment order when sorted.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a robot in the fleet.
    RobotId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = RobotId::new();
        let b = RobotId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_are_time_ordered() {
        let a = RobotId::new();
        let b = RobotId::new();
        assert!(a < b);
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = RobotId::new();
        let json = serde_json::to_string(&id).unwrap_or_default();
        let restored: Result<RobotId, _> = serde_json::from_str(&json);
        assert_eq!(restored.ok(), Some(id));
    }
}
