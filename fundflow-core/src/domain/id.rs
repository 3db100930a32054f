//! Opaque identifiers
//!
//! The backend owns every identifier; the client never parses or generates
//! them. Each kind gets its own newtype so a batch id can never be passed
//! where a job id is expected.

use serde::{Deserialize, Serialize};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

opaque_id!(
    /// Identifier of a backend job, unique per submission
    JobId
);

opaque_id!(
    /// Identifier of a funding specification (the target of every job)
    SpecificationId
);

opaque_id!(
    /// Identifier assigned to an uploaded batch file
    BatchId
);

opaque_id!(
    /// Identifier of a provider within a specification's funding
    ProviderId
);
