//! Per-connection and per-message context.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stategate_registry::ContentMetadata;

/// A connected user as resolved by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Host-scoped user identifier.
    pub id: String,
}

impl User {
    /// Creates a user from its identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Per-connection context, created once at connect time.
///
/// A session is either tied to a resolved user, anonymous (the host
/// could not resolve one — every submission is denied), or
/// server-originated. Server-originated sessions are internal, trusted
/// requests that bypass authorization and validation entirely.
#[derive(Debug, Clone)]
pub struct SessionContext {
    user: Option<User>,
    server_originated: bool,
}

impl SessionContext {
    /// Session for a resolved user.
    pub fn for_user(user: User) -> Self {
        Self {
            user: Some(user),
            server_originated: false,
        }
    }

    /// Session for a connection whose user could not be resolved.
    pub fn anonymous() -> Self {
        Self {
            user: None,
            server_originated: false,
        }
    }

    /// Internal, trusted session.
    pub fn server() -> Self {
        Self {
            user: None,
            server_originated: true,
        }
    }

    /// The resolved user, if any.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// True for internal, trusted sessions.
    pub fn is_server_originated(&self) -> bool {
        self.server_originated
    }
}

/// Per-message facts resolved by the pipeline: permission level,
/// content metadata and authoring parameters.
///
/// Scoped to one submission and never cached across messages — a
/// connection may address different documents over its lifetime.
#[derive(Debug, Clone)]
pub struct ResolvedContext {
    /// Opaque permission level granted by the host. The pipeline only
    /// interprets presence; logic rules may reference the value as
    /// `$.context.permission`.
    pub permission: Value,
    /// The document's content metadata.
    pub metadata: ContentMetadata,
    /// Static authoring parameters, available to logic rules as
    /// `$.params`.
    pub params: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_kinds() {
        let user = SessionContext::for_user(User::new("u1"));
        assert_eq!(user.user().map(|u| u.id.as_str()), Some("u1"));
        assert!(!user.is_server_originated());

        let anon = SessionContext::anonymous();
        assert!(anon.user().is_none());
        assert!(!anon.is_server_originated());

        let server = SessionContext::server();
        assert!(server.user().is_none());
        assert!(server.is_server_originated());
    }
}
