//! Testing utilities for tempstore workspace
//!
//! Shared fakes for the store's collaborators plus fixtures.

#![allow(missing_docs)]

use std::sync::Arc;

use parking_lot::RwLock;
use tempfile::TempDir;
use tempstore_core::{
    ArtifactStore, ContextResolver, PathResolver, ReferenceSerializer, ResourceKey,
    SerializeError, StandardTmpScheme, Url, UrlResolver,
};

pub const TEST_NAMESPACE: &str = "plantuml";
pub const TEST_BASE_URL: &str = "https://wiki/bin/";

/// Context resolver whose answer can change between calls, like a host
/// switching documents between renders
#[derive(Debug, Default)]
pub struct SwitchableContext {
    current: RwLock<String>,
}

impl SwitchableContext {
    pub fn new(context_id: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(context_id.into()),
        }
    }

    pub fn switch_to(&self, context_id: impl Into<String>) {
        *self.current.write() = context_id.into();
    }
}

impl ContextResolver for SwitchableContext {
    fn current_context_id(&self) -> String {
        self.current.read().clone()
    }
}

/// Serializer that rejects every key as unsupported
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectingSerializer;

impl ReferenceSerializer for RejectingSerializer {
    fn serialize(&self, key: &ResourceKey) -> Result<Url, SerializeError> {
        Err(SerializeError::Unsupported(format!(
            "no URL scheme for {}",
            key.namespace()
        )))
    }
}

/// Serializer that always fails as if the request context were gone
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSerializer;

impl ReferenceSerializer for FailingSerializer {
    fn serialize(&self, _key: &ResourceKey) -> Result<Url, SerializeError> {
        Err(SerializeError::failed_with(
            "request context unavailable",
            std::io::Error::other("no active request"),
        ))
    }
}

/// Store rooted in its own temp directory
pub struct TestStore {
    pub dir: TempDir,
    pub context: Arc<SwitchableContext>,
    pub scheme: Arc<StandardTmpScheme>,
    pub store: ArtifactStore,
}

impl TestStore {
    /// Namespace root inside the temp directory
    pub fn namespace_root(&self) -> std::path::PathBuf {
        self.dir.path().join(TEST_NAMESPACE)
    }
}

pub fn standard_scheme() -> StandardTmpScheme {
    StandardTmpScheme::parse(TEST_BASE_URL).unwrap()
}

pub fn setup_test_store(context_id: &str) -> TestStore {
    setup_test_store_with(context_id, None)
}

/// Like [`setup_test_store`], serializing URLs with `serializer` instead of
/// the standard scheme
pub fn setup_test_store_with(
    context_id: &str,
    serializer: Option<Arc<dyn ReferenceSerializer>>,
) -> TestStore {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let context = Arc::new(SwitchableContext::new(context_id));
    let scheme = Arc::new(standard_scheme());
    let serializer: Arc<dyn ReferenceSerializer> = match serializer {
        Some(serializer) => serializer,
        None => scheme.clone(),
    };

    let store = ArtifactStore::new(
        TEST_NAMESPACE,
        PathResolver::new(dir.path()),
        UrlResolver::new(serializer),
        context.clone(),
    )
    .unwrap();

    TestStore {
        dir,
        context,
        scheme,
        store,
    }
}

/// Install a test-writer subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
