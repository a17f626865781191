//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the engine has a strongly-typed ID to prevent accidental
//! mixing of identifiers at compile time. All IDs use UUID v7 (time-ordered)
//! for efficient database indexing.
//!
//! The `new()` constructors exist for app-side generation (command
//! submission, tests, seed data); rows inserted by the engine always carry
//! an explicit ID rather than relying on database defaults.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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
    /// Unique identifier for a game world instance.
    WorldId
}

define_id! {
    /// Unique identifier for a player.
    PlayerId
}

define_id! {
    /// Unique identifier for a village.
    VillageId
}

define_id! {
    /// Unique identifier for a dispatched command.
    CommandId
}

define_id! {
    /// Unique identifier shared by the attacker and defender reports of one
    /// resolved battle.
    BattleId
}

define_id! {
    /// Unique identifier for a single battle report row (one perspective).
    ReportId
}
