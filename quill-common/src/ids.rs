//! Strongly-typed identifiers
//!
//! Every entity kind gets its own ULID-backed newtype. The wrappers are
//! deliberately boring: transparent serde, `Display`/`FromStr` through the
//! canonical 26-character ULID form, `Copy` semantics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Ulid);

        impl $name {
            /// Generate a fresh identifier.
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// The underlying ULID.
            pub fn as_ulid(&self) -> Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Ulid> for $name {
            fn from(id: Ulid) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ulid::from_string(s).map(Self)
            }
        }
    };
}

ulid_id!(
    /// A project — the tenancy boundary for content types, media, and tags.
    ProjectId
);
ulid_id!(
    /// A content-type definition.
    ContentTypeId
);
ulid_id!(
    /// An entry (a record conforming to a content type).
    EntryId
);
ulid_id!(
    /// A media asset.
    MediaId
);
ulid_id!(
    /// A user account.
    UserId
);
ulid_id!(
    /// A tag in either vocabulary (entry tags or media tags).
    TagId
);
