//! # StateGate Gateway
//!
//! Real-time synchronization gateway for shared, schema-governed JSON
//! documents.
//!
//! Many clients concurrently edit one shared state attached to a piece
//! of interactive content; every proposed change passes a staged
//! validation pipeline before it may mutate the document:
//!
//! 1. **connect** — resolve the connecting user via the host
//! 2. **submit** — authorize, resolve the content context, check the
//!    operation's wire shape against the content type's op schema
//! 3. **apply** — evaluate op logic rules against the operation plus
//!    the candidate snapshot the OT backend computed
//! 4. **commit** — check the resulting snapshot against the snapshot
//!    schema and snapshot logic rules, then let the backend finalize
//!    and broadcast
//!
//! Server-originated requests (administrative deletion, host-side
//! writes) bypass every check.
//!
//! # External collaborators
//!
//! The conflict-resolution engine lives behind [`StateBackend`]; user
//! resolution, permissions, content metadata and parameters live behind
//! [`ContentHost`]; validation artifacts come from a
//! `stategate_registry::ArtifactStore`. Transport framing is the
//! host's job: mount the gateway at
//! [`GatewayConfig::endpoint_path`] and feed decoded messages to
//! [`Gateway::open_session`] and [`Gateway::submit`].
//!
//! ```rust,ignore
//! use stategate_gateway::{Gateway, GatewayConfig, OpSubmission};
//!
//! let gateway = Gateway::new(GatewayConfig::default(), backend, host, artifacts);
//! let session = gateway.open_session(&handshake).await?;
//! let outcome = gateway.submit(&session, "doc-1", OpSubmission::op(op)).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod backend;
mod config;
mod error;
mod gateway;
mod host;
mod pipeline;
mod resolver;
mod session;

pub use backend::{BackendError, DocKey, StateBackend};
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{Gateway, SUPPORTED_PROTOCOL_VERSION};
pub use host::{ContentHost, HostError};
pub use pipeline::{CommitOutcome, OpPhase, OpSubmission};
pub use session::{ResolvedContext, SessionContext, User};
