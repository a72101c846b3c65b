//! # StateGate Registry
//!
//! Content-type identity and the memoizing validator cache.
//!
//! A content type (name plus version, e.g. `Quiz-1.0`) may declare up
//! to four validation artifacts: a structural schema for proposed
//! operations, a structural schema for resulting snapshots, and a logic
//! rule set for each. Definitions live in an external metadata source
//! reached through the [`ArtifactStore`] trait; the [`ValidatorCache`]
//! fetches each artifact at most once per process lifetime, compiles
//! it, and memoizes the result.
//!
//! Cache policy:
//! - artifact not declared, or source unreachable: the artifact is
//!   treated as "no constraint" (the failure is logged once);
//! - artifact present but unusable (schema fails to compile, rule set
//!   fails to parse): configuration error, and every later lookup for
//!   that artifact keeps failing until the definition is fixed.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod artifact;
mod cache;
mod content_type;
mod error;

pub use artifact::{ArtifactError, ArtifactKind, ArtifactStore};
pub use cache::{check_schema, ValidatorCache};
pub use content_type::{ContentMetadata, ContentType};
pub use error::{RegistryError, RegistryResult};
