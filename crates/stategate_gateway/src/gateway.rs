//! The synchronization gateway.

use crate::backend::{DocKey, StateBackend};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::host::ContentHost;
use crate::pipeline::{op_subject, snapshot_subject, CommitOutcome, OpPhase, OpSubmission};
use crate::resolver::ContextResolver;
use crate::session::SessionContext;
use serde_json::Value;
use stategate_registry::{check_schema, ArtifactKind, ArtifactStore, ValidatorCache};
use std::sync::Arc;

/// The single sync protocol version this gateway implements. Content
/// types declaring any other `requiredSyncProtocolVersion` are rejected
/// outright rather than silently downgraded.
pub const SUPPORTED_PROTOCOL_VERSION: u16 = 1;

/// The synchronization gateway.
///
/// Owns the validator cache and the handles to the external OT backend
/// and host callbacks, and runs the staged validation pipeline for
/// every submitted operation. The gateway holds no locks of its own
/// and no cross-operation state: callers drive one submission at a
/// time per session (a connection processes its messages in arrival
/// order), while submissions from different sessions run freely in
/// parallel.
///
/// Transport framing is the host's job: mount the endpoint at
/// [`GatewayConfig::endpoint_path`] and feed decoded handshakes and
/// messages to [`Gateway::open_session`] and [`Gateway::submit`].
pub struct Gateway<B, H, S> {
    config: GatewayConfig,
    backend: Arc<B>,
    host: Arc<H>,
    cache: ValidatorCache<S>,
}

impl<B: StateBackend, H: ContentHost, S: ArtifactStore> Gateway<B, H, S> {
    /// Creates a gateway over a backend, host and artifact store.
    pub fn new(config: GatewayConfig, backend: Arc<B>, host: Arc<H>, store: S) -> Self {
        Self {
            config,
            backend,
            host,
            cache: ValidatorCache::new(store),
        }
    }

    /// The gateway's configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Connect stage: resolves the connecting user from the handshake
    /// and opens their session. An unresolvable user yields an
    /// anonymous session that every later submit denies — the
    /// connection itself is not refused.
    pub async fn open_session(&self, handshake: &Value) -> GatewayResult<SessionContext> {
        match self.host.request_to_user(handshake).await? {
            Some(user) => {
                tracing::debug!(
                    target: "stategate::gateway",
                    user = %user.id,
                    "session opened"
                );
                Ok(SessionContext::for_user(user))
            }
            None => Ok(SessionContext::anonymous()),
        }
    }

    /// Runs the full validation pipeline for one proposed operation and
    /// commits it on success.
    ///
    /// Stages run in strict order and a rejection at any stage is
    /// terminal for the submission; the session stays usable for
    /// subsequent operations. Server-originated sessions bypass every
    /// check.
    pub async fn submit(
        &self,
        session: &SessionContext,
        document_id: &str,
        submission: OpSubmission,
    ) -> GatewayResult<CommitOutcome> {
        let doc = self.doc_key(document_id);

        if session.is_server_originated() {
            let snapshot = self
                .backend
                .apply(&doc, &submission.op, submission.create.as_ref())
                .await?;
            self.backend.commit(&doc, &submission.op, &snapshot).await?;
            tracing::debug!(
                target: "stategate::gateway",
                doc = %doc,
                "server-originated submission committed unchecked"
            );
            return Ok(CommitOutcome { snapshot });
        }

        let mut phase = OpPhase::Received;

        // Authorize and resolve the content context.
        let resolved = ContextResolver::new(&*self.host, SUPPORTED_PROTOCOL_VERSION)
            .resolve(session, document_id)
            .await
            .map_err(|err| Self::reject(&doc, phase, err))?;
        phase = OpPhase::Authorized;

        // The resolver guarantees a user past this point.
        let user = session.user().ok_or(GatewayError::NotPermitted)?;
        let content_type = resolved.metadata.main_content_type.clone();

        // Op schema: the operation's wire shape.
        if let Some(schema) = self
            .cache
            .op_schema(&content_type)
            .await
            .map_err(|err| Self::reject(&doc, phase, err.into()))?
        {
            if let Err(detail) = check_schema(&schema, &submission.message()) {
                tracing::warn!(
                    target: "stategate::gateway",
                    doc = %doc,
                    content_type = %content_type,
                    %detail,
                    "operation violates op schema"
                );
                return Err(Self::reject(
                    &doc,
                    phase,
                    GatewayError::SchemaViolation {
                        artifact: ArtifactKind::OpSchema,
                    },
                ));
            }
        }
        phase = OpPhase::OpSchemaChecked;

        // The backend computes the candidate snapshot; op logic rules
        // may reference it.
        let candidate = self
            .backend
            .apply(&doc, &submission.op, submission.create.as_ref())
            .await
            .map_err(|err| Self::reject(&doc, phase, err.into()))?;

        if let Some(rules) = self
            .cache
            .op_rules(&content_type)
            .await
            .map_err(|err| Self::reject(&doc, phase, err.into()))?
        {
            let subject = op_subject(&submission, &resolved, user, &candidate);
            if !rules.evaluate(&subject) {
                return Err(Self::reject(
                    &doc,
                    phase,
                    GatewayError::RuleViolation {
                        artifact: ArtifactKind::OpRules,
                    },
                ));
            }
        }
        // Op rules and the tentative application both complete here.
        phase = OpPhase::AppliedTentatively;

        // Snapshot schema against the candidate.
        if let Some(schema) = self
            .cache
            .snapshot_schema(&content_type)
            .await
            .map_err(|err| Self::reject(&doc, phase, err.into()))?
        {
            if let Err(detail) = check_schema(&schema, &candidate) {
                tracing::warn!(
                    target: "stategate::gateway",
                    doc = %doc,
                    content_type = %content_type,
                    %detail,
                    "candidate snapshot violates snapshot schema"
                );
                return Err(Self::reject(
                    &doc,
                    phase,
                    GatewayError::SchemaViolation {
                        artifact: ArtifactKind::SnapshotSchema,
                    },
                ));
            }
        }
        phase = OpPhase::SnapshotSchemaChecked;

        if let Some(rules) = self
            .cache
            .snapshot_rules(&content_type)
            .await
            .map_err(|err| Self::reject(&doc, phase, err.into()))?
        {
            let subject = snapshot_subject(&candidate, &resolved, user);
            if !rules.evaluate(&subject) {
                return Err(Self::reject(
                    &doc,
                    phase,
                    GatewayError::RuleViolation {
                        artifact: ArtifactKind::SnapshotRules,
                    },
                ));
            }
        }
        phase = OpPhase::SnapshotLogicChecked;

        self.backend
            .commit(&doc, &submission.op, &candidate)
            .await
            .map_err(|err| Self::reject(&doc, phase, err.into()))?;

        tracing::debug!(
            target: "stategate::gateway",
            doc = %doc,
            content_type = %content_type,
            user = %user.id,
            "operation committed"
        );
        Ok(CommitOutcome {
            snapshot: candidate,
        })
    }

    /// Administrative invalidation of a document's live state, for when
    /// the underlying document is deleted or externally overwritten.
    ///
    /// Runs server-originated: no authorization, no validation. The
    /// fetch must succeed or the call fails outright; a failure of the
    /// delete itself is logged and swallowed.
    pub async fn delete_state(&self, document_id: &str) -> GatewayResult<()> {
        let doc = self.doc_key(document_id);

        let _ = self.backend.fetch(&doc).await?;

        if let Err(err) = self.backend.delete(&doc).await {
            tracing::warn!(
                target: "stategate::gateway",
                doc = %doc,
                error = %err,
                "state delete failed after fetch; live state left in place"
            );
        } else {
            tracing::debug!(target: "stategate::gateway", doc = %doc, "live state deleted");
        }
        Ok(())
    }

    fn doc_key(&self, document_id: &str) -> DocKey {
        DocKey::new(self.config.collection.clone(), document_id)
    }

    fn reject(doc: &DocKey, reached: OpPhase, err: GatewayError) -> GatewayError {
        if err.is_configuration() {
            tracing::error!(
                target: "stategate::gateway",
                doc = %doc,
                reached = ?reached,
                error = %err,
                "operation rejected by configuration problem"
            );
        } else {
            tracing::warn!(
                target: "stategate::gateway",
                doc = %doc,
                reached = ?reached,
                error = %err,
                "operation rejected"
            );
        }
        err
    }
}
