//! # StateGate Testkit
//!
//! In-memory implementations of the gateway's external collaborators,
//! for unit and integration tests:
//!
//! - [`MemoryArtifacts`] — artifact store with failure injection and a
//!   fetch counter
//! - [`StaticHost`] — host callbacks backed by plain maps, with call
//!   spies
//! - [`MemoryBackend`] — OT backend speaking a minimal json0-style op
//!   format; `apply` never touches the stored document, `commit`
//!   installs the snapshot

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod artifacts;
mod backend;
mod host;

pub use artifacts::MemoryArtifacts;
pub use backend::MemoryBackend;
pub use host::StaticHost;
