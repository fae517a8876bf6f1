//! Typed IDs for type-safe entity references.
//!
//! Rows use auto-incrementing integer keys; wrapping them prevents passing a
//! `MemberId` where a `UserId` is expected.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            /// Wraps a raw database key.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Returns the raw database key.
            #[must_use]
            pub const fn into_inner(self) -> i32 {
                self.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a registered user.");
typed_id!(GroupId, "Unique identifier for an expense group.");
typed_id!(
    MemberId,
    "Unique identifier for a person's membership in one group."
);
typed_id!(ExpenseId, "Unique identifier for an expense.");
typed_id!(SettlementId, "Unique identifier for a settlement.");
typed_id!(ActivityId, "Unique identifier for an activity feed entry.");
typed_id!(NotificationId, "Unique identifier for a notification.");
