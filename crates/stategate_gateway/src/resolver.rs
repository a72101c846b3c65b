//! Content-context resolution for one submission.

use crate::error::{GatewayError, GatewayResult};
use crate::host::ContentHost;
use crate::session::{ResolvedContext, SessionContext};

/// Resolves the per-message content context: permission level, content
/// metadata (with protocol-version check) and authoring parameters.
///
/// Server-originated sessions never reach the resolver; the pipeline
/// short-circuits them first.
pub(crate) struct ContextResolver<'a, H> {
    host: &'a H,
    supported_version: u16,
}

impl<'a, H: ContentHost> ContextResolver<'a, H> {
    pub(crate) fn new(host: &'a H, supported_version: u16) -> Self {
        Self {
            host,
            supported_version,
        }
    }

    pub(crate) async fn resolve(
        &self,
        session: &SessionContext,
        document_id: &str,
    ) -> GatewayResult<ResolvedContext> {
        let user = session.user().ok_or(GatewayError::NotPermitted)?;

        // Permission first: an unauthorized user learns nothing about
        // the document, and no validation work is spent on them.
        let permission = self
            .host
            .permission(user, document_id)
            .await?
            .ok_or(GatewayError::NotPermitted)?;

        let metadata = self.host.content_metadata(document_id, user).await?;
        if metadata.required_protocol_version != self.supported_version {
            return Err(GatewayError::VersionMismatch {
                required: metadata.required_protocol_version,
                supported: self.supported_version,
            });
        }

        let params = self.host.content_parameters(document_id, user).await?;

        Ok(ResolvedContext {
            permission,
            metadata,
            params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostError;
    use crate::session::User;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use stategate_registry::{ContentMetadata, ContentType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedHost {
        permission: Option<Value>,
        required_version: u16,
        metadata_calls: AtomicUsize,
    }

    impl FixedHost {
        fn new(permission: Option<Value>, required_version: u16) -> Self {
            Self {
                permission,
                required_version,
                metadata_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ContentHost for FixedHost {
        async fn request_to_user(&self, _handshake: &Value) -> Result<Option<User>, HostError> {
            Ok(None)
        }

        async fn permission(
            &self,
            _user: &User,
            _document_id: &str,
        ) -> Result<Option<Value>, HostError> {
            Ok(self.permission.clone())
        }

        async fn content_metadata(
            &self,
            _document_id: &str,
            _user: &User,
        ) -> Result<ContentMetadata, HostError> {
            self.metadata_calls.fetch_add(1, Ordering::SeqCst);
            Ok(ContentMetadata {
                main_content_type: ContentType::new("Quiz", 1, 0),
                required_protocol_version: self.required_version,
            })
        }

        async fn content_parameters(
            &self,
            _document_id: &str,
            _user: &User,
        ) -> Result<Value, HostError> {
            Ok(json!({ "title": "t" }))
        }
    }

    fn session() -> SessionContext {
        SessionContext::for_user(User::new("u1"))
    }

    #[tokio::test]
    async fn resolves_full_context() {
        let host = FixedHost::new(Some(json!("standard")), 1);
        let resolver = ContextResolver::new(&host, 1);

        let resolved = resolver.resolve(&session(), "doc-1").await.unwrap();
        assert_eq!(resolved.permission, json!("standard"));
        assert_eq!(resolved.metadata.main_content_type.to_string(), "Quiz-1.0");
        assert_eq!(resolved.params, json!({ "title": "t" }));
    }

    #[tokio::test]
    async fn missing_permission_denies_before_metadata() {
        let host = FixedHost::new(None, 1);
        let resolver = ContextResolver::new(&host, 1);

        let err = resolver.resolve(&session(), "doc-1").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotPermitted));
        assert_eq!(host.metadata_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn anonymous_session_is_denied() {
        let host = FixedHost::new(Some(json!("standard")), 1);
        let resolver = ContextResolver::new(&host, 1);

        let err = resolver
            .resolve(&SessionContext::anonymous(), "doc-1")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotPermitted));
    }

    #[tokio::test]
    async fn version_mismatch_fails_closed() {
        let host = FixedHost::new(Some(json!("standard")), 7);
        let resolver = ContextResolver::new(&host, 1);

        let err = resolver.resolve(&session(), "doc-1").await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::VersionMismatch {
                required: 7,
                supported: 1
            }
        ));
    }
}
