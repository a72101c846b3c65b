//! Memoizing cache of compiled schema validators and parsed rule sets.

use crate::artifact::{ArtifactError, ArtifactKind, ArtifactStore};
use crate::content_type::ContentType;
use crate::error::{RegistryError, RegistryResult};
use jsonschema::{Draft, JSONSchema};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A fully-constructed cache slot.
///
/// `Absent` records "no constraint" (the artifact is not declared, or
/// the source could not be reached). `Invalid` records a definition
/// that is present but unusable; it is distinct from `Absent` so the
/// failure repeats instead of silently passing.
#[derive(Clone)]
enum Slot {
    Schema(Arc<JSONSchema>),
    Rules(Arc<stategate_logic::RuleSet>),
    Absent,
    Invalid(Arc<str>),
}

/// Memoizing repository of per-content-type validators.
///
/// The cache is an injected, explicitly-owned component: one per
/// gateway, nothing process-global. Each `(content type, artifact)`
/// key is fetched and compiled at most once per slot lifetime; slots
/// are built completely before insertion and written with
/// `entry().or_insert`, so concurrent first lookups may fetch
/// redundantly but converge on a single complete slot — a reader never
/// observes a partially-initialized entry.
pub struct ValidatorCache<S> {
    store: S,
    slots: RwLock<HashMap<(ContentType, ArtifactKind), Slot>>,
}

impl<S: ArtifactStore> ValidatorCache<S> {
    /// Creates a cache over an artifact store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Compiled schema for proposed operations, if the content type
    /// declares one.
    pub async fn op_schema(
        &self,
        content_type: &ContentType,
    ) -> RegistryResult<Option<Arc<JSONSchema>>> {
        self.schema(content_type, ArtifactKind::OpSchema).await
    }

    /// Compiled schema for resulting snapshots, if declared.
    pub async fn snapshot_schema(
        &self,
        content_type: &ContentType,
    ) -> RegistryResult<Option<Arc<JSONSchema>>> {
        self.schema(content_type, ArtifactKind::SnapshotSchema).await
    }

    /// Parsed logic rules for proposed operations, if declared.
    pub async fn op_rules(
        &self,
        content_type: &ContentType,
    ) -> RegistryResult<Option<Arc<stategate_logic::RuleSet>>> {
        self.rules(content_type, ArtifactKind::OpRules).await
    }

    /// Parsed logic rules for resulting snapshots, if declared.
    pub async fn snapshot_rules(
        &self,
        content_type: &ContentType,
    ) -> RegistryResult<Option<Arc<stategate_logic::RuleSet>>> {
        self.rules(content_type, ArtifactKind::SnapshotRules).await
    }

    async fn schema(
        &self,
        content_type: &ContentType,
        kind: ArtifactKind,
    ) -> RegistryResult<Option<Arc<JSONSchema>>> {
        match self.slot(content_type, kind).await? {
            Slot::Schema(schema) => Ok(Some(schema)),
            // Keyed by kind, so a rules slot cannot appear here.
            _ => Ok(None),
        }
    }

    async fn rules(
        &self,
        content_type: &ContentType,
        kind: ArtifactKind,
    ) -> RegistryResult<Option<Arc<stategate_logic::RuleSet>>> {
        match self.slot(content_type, kind).await? {
            Slot::Rules(rules) => Ok(Some(rules)),
            _ => Ok(None),
        }
    }

    async fn slot(&self, content_type: &ContentType, kind: ArtifactKind) -> RegistryResult<Slot> {
        let key = (content_type.clone(), kind);
        let cached = self.slots.read().get(&key).cloned();
        let slot = match cached {
            Some(slot) => slot,
            None => {
                // Miss: fetch and compile without holding the lock.
                let built = self.populate(content_type, kind).await;
                self.slots.write().entry(key).or_insert(built).clone()
            }
        };

        match slot {
            Slot::Invalid(reason) => Err(RegistryError::InvalidArtifact {
                content_type: content_type.to_string(),
                kind,
                reason: reason.to_string(),
            }),
            other => Ok(other),
        }
    }

    /// Builds a slot from the external source. Failures are logged here,
    /// once, at population time.
    async fn populate(&self, content_type: &ContentType, kind: ArtifactKind) -> Slot {
        let raw = match self.store.fetch(content_type, kind).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Slot::Absent,
            Err(ArtifactError::Unavailable(reason)) => {
                tracing::warn!(
                    target: "stategate::registry",
                    content_type = %content_type,
                    artifact = %kind,
                    %reason,
                    "artifact fetch failed; treating artifact as unconstrained"
                );
                return Slot::Absent;
            }
            Err(ArtifactError::Malformed(reason)) => {
                tracing::error!(
                    target: "stategate::registry",
                    content_type = %content_type,
                    artifact = %kind,
                    %reason,
                    "artifact is not valid JSON; content type is unusable until fixed"
                );
                return Slot::Invalid(reason.into());
            }
        };

        if kind.is_schema() {
            match JSONSchema::options().with_draft(Draft::Draft7).compile(&raw) {
                Ok(schema) => Slot::Schema(Arc::new(schema)),
                Err(err) => {
                    let reason = err.to_string();
                    tracing::error!(
                        target: "stategate::registry",
                        content_type = %content_type,
                        artifact = %kind,
                        %reason,
                        "schema failed to compile; content type is unusable until fixed"
                    );
                    Slot::Invalid(reason.into())
                }
            }
        } else {
            match stategate_logic::RuleSet::parse(&raw) {
                Ok(rules) => Slot::Rules(Arc::new(rules)),
                Err(err) => {
                    let reason = err.to_string();
                    tracing::error!(
                        target: "stategate::registry",
                        content_type = %content_type,
                        artifact = %kind,
                        %reason,
                        "rule set failed to parse; content type is unusable until fixed"
                    );
                    Slot::Invalid(reason.into())
                }
            }
        }
    }
}

/// Validates a subject against a compiled schema, collapsing the
/// validator's error trace to one descriptive line (the full trace
/// belongs in logs, not on the wire).
pub fn check_schema(schema: &JSONSchema, subject: &Value) -> Result<(), String> {
    schema.validate(subject).map_err(|errors| {
        let detail: Vec<String> = errors.map(|e| e.to_string()).collect();
        detail.join("; ")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store with failure injection and a fetch counter.
    #[derive(Default)]
    struct TestStore {
        artifacts: HashMap<(ContentType, ArtifactKind), Value>,
        unavailable: bool,
        malformed: bool,
        fetches: AtomicUsize,
    }

    impl TestStore {
        fn with_artifact(mut self, ct: &ContentType, kind: ArtifactKind, value: Value) -> Self {
            self.artifacts.insert((ct.clone(), kind), value);
            self
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ArtifactStore for TestStore {
        async fn fetch(
            &self,
            content_type: &ContentType,
            kind: ArtifactKind,
        ) -> Result<Option<Value>, ArtifactError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.unavailable {
                return Err(ArtifactError::Unavailable("store offline".into()));
            }
            if self.malformed {
                return Err(ArtifactError::Malformed("unexpected EOF".into()));
            }
            Ok(self.artifacts.get(&(content_type.clone(), kind)).cloned())
        }
    }

    impl<S: ArtifactStore> ValidatorCache<S> {
        fn store(&self) -> &S {
            &self.store
        }
    }

    fn quiz() -> ContentType {
        ContentType::new("Quiz", 1, 0)
    }

    #[tokio::test]
    async fn fetches_once_per_key() {
        let store = TestStore::default().with_artifact(
            &quiz(),
            ArtifactKind::OpSchema,
            json!({ "type": "object", "required": ["op"] }),
        );
        let cache = ValidatorCache::new(store);

        let first = cache.op_schema(&quiz()).await.unwrap();
        let second = cache.op_schema(&quiz()).await.unwrap();
        assert!(first.is_some());
        assert!(second.is_some());
        assert_eq!(cache.store().fetch_count(), 1);

        // A different artifact kind is a different key.
        let rules = cache.op_rules(&quiz()).await.unwrap();
        assert!(rules.is_none());
        assert_eq!(cache.store().fetch_count(), 2);
    }

    #[tokio::test]
    async fn missing_artifact_means_no_constraint() {
        let cache = ValidatorCache::new(TestStore::default());
        assert!(cache.op_schema(&quiz()).await.unwrap().is_none());
        assert!(cache.snapshot_rules(&quiz()).await.unwrap().is_none());
        // The miss itself is memoized.
        assert!(cache.op_schema(&quiz()).await.unwrap().is_none());
        assert_eq!(cache.store().fetch_count(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_degrades_to_no_constraint() {
        let store = TestStore {
            unavailable: true,
            ..TestStore::default()
        };
        let cache = ValidatorCache::new(store);
        assert!(cache.op_schema(&quiz()).await.unwrap().is_none());
        // No refetch storm: the failure slot is cached too.
        assert!(cache.op_schema(&quiz()).await.unwrap().is_none());
        assert_eq!(cache.store().fetch_count(), 1);
    }

    #[tokio::test]
    async fn unparsable_artifact_is_a_configuration_error() {
        let store = TestStore {
            malformed: true,
            ..TestStore::default()
        };
        let cache = ValidatorCache::new(store);
        assert!(matches!(
            cache.op_rules(&quiz()).await,
            Err(RegistryError::InvalidArtifact { .. })
        ));
        // Still failing on the next lookup, without refetching.
        assert!(cache.op_rules(&quiz()).await.is_err());
        assert_eq!(cache.store().fetch_count(), 1);
    }

    #[tokio::test]
    async fn bad_schema_is_a_configuration_error() {
        // A schema document must be an object or a boolean.
        let store = TestStore::default().with_artifact(
            &quiz(),
            ArtifactKind::SnapshotSchema,
            json!(5),
        );
        let cache = ValidatorCache::new(store);
        assert!(matches!(
            cache.snapshot_schema(&quiz()).await,
            Err(RegistryError::InvalidArtifact {
                kind: ArtifactKind::SnapshotSchema,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn bad_rule_set_is_a_configuration_error() {
        let store = TestStore::default().with_artifact(
            &quiz(),
            ArtifactKind::OpRules,
            json!([{ "plainKey": 1 }]),
        );
        let cache = ValidatorCache::new(store);
        assert!(matches!(
            cache.op_rules(&quiz()).await,
            Err(RegistryError::InvalidArtifact {
                kind: ArtifactKind::OpRules,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn concurrent_first_lookups_converge() {
        let store = TestStore::default().with_artifact(
            &quiz(),
            ArtifactKind::OpSchema,
            json!({ "type": "object" }),
        );
        let cache = Arc::new(ValidatorCache::new(store));

        let a = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.op_schema(&quiz()).await })
        };
        let b = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.op_schema(&quiz()).await })
        };
        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
        assert!(a.is_some());
        assert!(b.is_some());

        // Converged: later lookups hit the single cached slot.
        let before = cache.store().fetch_count();
        let _ = cache.op_schema(&quiz()).await.unwrap();
        assert_eq!(cache.store().fetch_count(), before);
    }

    #[tokio::test]
    async fn check_schema_reports_violations() {
        let store = TestStore::default().with_artifact(
            &quiz(),
            ArtifactKind::OpSchema,
            json!({ "type": "object", "required": ["op"] }),
        );
        let cache = ValidatorCache::new(store);
        let schema = cache.op_schema(&quiz()).await.unwrap().unwrap();

        assert!(check_schema(&schema, &json!({ "op": [] })).is_ok());
        let err = check_schema(&schema, &json!({})).unwrap_err();
        assert!(err.contains("op"));
    }
}
