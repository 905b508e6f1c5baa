//! Domain newtypes with validation
//!
//! Source-system identifiers are opaque strings; these wrappers keep file
//! and folder identifiers apart and reject values that could never be valid.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

fn validate_id(kind: &str, id: &str) -> Result<(), DomainError> {
    if id.is_empty() {
        return Err(DomainError::InvalidId(format!("{kind} ID cannot be empty")));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidId(format!(
            "{kind} ID contains whitespace: {id:?}"
        )));
    }
    Ok(())
}

macro_rules! source_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier
            ///
            /// # Errors
            /// Returns error if the ID is empty or contains whitespace
            pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
                let id = id.into();
                validate_id($kind, &id)?;
                Ok(Self(id))
            }

            /// Get the inner string reference
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

source_id!(
    /// Identifier of a file in the source tree, stable across renames
    FileId,
    "File"
);

source_id!(
    /// Identifier of a folder in the source tree
    FolderId,
    "Folder"
);

impl From<FileId> for FolderId {
    /// Listing entries carry one ID namespace; a folder entry's ID is reused
    /// as the folder to descend into.
    fn from(id: FileId) -> Self {
        Self(id.0)
    }
}
