//! Artifact store façade
//!
//! [`ArtifactStore`] combines a [`PathResolver`], a [`UrlResolver`] and a
//! [`ContextResolver`] into the two calls a renderer needs:
//! - [`open_for_write`](ArtifactStore::open_for_write): where to put the bytes
//! - [`get_url`](ArtifactStore::get_url): where a client fetches them
//!
//! All calls are blocking. The store holds no mutable state; concurrent
//! writers of the same `(context, artifact)` race at the filesystem and the
//! last one wins. Callers that can re-render the same artifact concurrently
//! must serialize those writes themselves.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::context::ContextResolver;
use crate::error::{
    ConfigError, KeyError, Operation, SerializeError, StorageError, StoreCause, StoreError,
    UrlError,
};
use crate::key::ResourceKey;
use crate::path::PathResolver;
use crate::segment::checked_segment;
use crate::url::{ReferenceResolver, ReferenceSerializer, Url, UrlResolver};

/// Temporary artifact store for one namespace
#[derive(Clone)]
pub struct ArtifactStore {
    namespace: String,
    paths: PathResolver,
    urls: UrlResolver,
    context: Arc<dyn ContextResolver>,
}

impl ArtifactStore {
    /// Wire a store from its collaborators
    ///
    /// # Errors
    /// Returns [`ConfigError::Namespace`] if `namespace` is not a valid
    /// identifier
    pub fn new(
        namespace: impl Into<String>,
        paths: PathResolver,
        urls: UrlResolver,
        context: Arc<dyn ContextResolver>,
    ) -> Result<Self, ConfigError> {
        let namespace = namespace.into();
        checked_segment("namespace", &namespace)?;
        Ok(Self {
            namespace,
            paths,
            urls,
            context,
        })
    }

    /// Wire a store from configuration
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the configuration is invalid
    pub fn from_config(
        config: &StoreConfig,
        serializer: Arc<dyn ReferenceSerializer>,
        context: Arc<dyn ContextResolver>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::new(
            config.namespace.clone(),
            PathResolver::new(config.root.clone()),
            UrlResolver::new(serializer),
            context,
        )
    }

    /// Namespace this store writes into
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Path resolver in use
    #[inline]
    #[must_use]
    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    /// Key for `artifact_id` in the current context
    ///
    /// # Errors
    /// Returns [`KeyError`] if the artifact or context id is empty
    pub fn key_for(&self, artifact_id: &str) -> Result<ResourceKey, KeyError> {
        ResourceKey::new(
            self.namespace.as_str(),
            self.context.current_context_id(),
            artifact_id,
        )
    }

    /// Create (or truncate) the file for `artifact_id` and open it
    ///
    /// Missing directories are created first. Nothing touches the
    /// filesystem if the key is invalid. Calling this twice for the same id
    /// overwrites the earlier file.
    ///
    /// # Errors
    /// - `InvalidKey` for empty/oversized identifiers
    /// - `StorageUnavailable` if directories or the file cannot be created
    pub fn open_for_write(&self, artifact_id: &str) -> Result<ArtifactWriter, StoreError> {
        const OP: Operation = Operation::OpenForWrite;

        let path = self
            .key_for(artifact_id)
            .and_then(|key| self.paths.resolve(&key))
            .map_err(|e| self.fail(artifact_id, OP, e))?;

        self.paths
            .ensure_writable(&path)
            .map_err(|e| self.fail(artifact_id, OP, e))?;

        let file = File::create(&path).map_err(|source| {
            self.fail(
                artifact_id,
                OP,
                StorageError::OpenFile {
                    path: path.clone(),
                    source,
                },
            )
        })?;

        tracing::debug!(
            namespace = %self.namespace,
            artifact_id,
            path = %path.display(),
            "opened artifact for writing"
        );
        Ok(ArtifactWriter { path, file })
    }

    /// URL a client uses to fetch `artifact_id`
    ///
    /// Builds and validates the same key as
    /// [`open_for_write`](Self::open_for_write).
    ///
    /// # Errors
    /// - `InvalidKey` for empty/oversized identifiers
    /// - `UnsupportedReference` / `SerializationFailed` from the serializer
    pub fn get_url(&self, artifact_id: &str) -> Result<Url, StoreError> {
        const OP: Operation = Operation::GetUrl;

        let key = self
            .key_for(artifact_id)
            .and_then(|key| self.paths.resolve(&key).map(|_| key))
            .map_err(|e| self.fail(artifact_id, OP, e))?;
        let url = self
            .urls
            .resolve(&key)
            .map_err(|e| self.fail(artifact_id, OP, e))?;

        tracing::debug!(%key, %url, "computed artifact url");
        Ok(url)
    }

    /// Storage path of `artifact_id`, without touching the filesystem
    ///
    /// # Errors
    /// Returns `InvalidKey` for empty/oversized identifiers
    pub fn locate(&self, artifact_id: &str) -> Result<PathBuf, StoreError> {
        self.key_for(artifact_id)
            .and_then(|key| self.paths.resolve(&key))
            .map_err(|e| self.fail(artifact_id, Operation::Locate, e))
    }

    /// Map a URL produced for this store back to its storage path
    ///
    /// This is the request-handler side of [`get_url`](Self::get_url). The
    /// context comes from the URL, not from the current context.
    ///
    /// # Errors
    /// - `UnsupportedReference` if `url` is foreign or names another namespace
    /// - `SerializationFailed` if `url` cannot be decoded
    /// - `InvalidKey` if the decoded key cannot be stored
    pub fn resolve_url<R>(&self, url: &Url, resolver: &R) -> Result<PathBuf, StoreError>
    where
        R: ReferenceResolver + ?Sized,
    {
        const OP: Operation = Operation::ResolveUrl;

        let key = resolver
            .resolve(url)
            .map_err(|e| self.fail(url.as_str(), OP, url_error(url, e)))?;

        if key.namespace() != self.namespace {
            let reason = format!(
                "namespace [{}] does not belong to this store [{}]",
                key.namespace(),
                self.namespace
            );
            return Err(self.fail(
                key.artifact_id(),
                OP,
                UrlError::UnsupportedReference {
                    key: key.to_string(),
                    reason,
                },
            ));
        }

        self.paths
            .resolve(&key)
            .map_err(|e| self.fail(key.artifact_id(), OP, e))
    }

    fn fail(
        &self,
        artifact_id: &str,
        op: Operation,
        cause: impl Into<StoreCause>,
    ) -> StoreError {
        let err = StoreError::new(artifact_id, op, cause);
        tracing::warn!(
            namespace = %self.namespace,
            artifact_id,
            cause = %err.cause(),
            "{err}"
        );
        err
    }
}

fn url_error(url: &Url, err: SerializeError) -> UrlError {
    match err {
        SerializeError::Unsupported(reason) => UrlError::UnsupportedReference {
            key: url.to_string(),
            reason,
        },
        source => UrlError::SerializationFailed {
            key: url.to_string(),
            source,
        },
    }
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("namespace", &self.namespace)
            .field("root", &self.paths.root())
            .finish_non_exhaustive()
    }
}

/// Open artifact file returned by [`ArtifactStore::open_for_write`]
///
/// The file handle is released when the writer is dropped.
#[derive(Debug)]
pub struct ArtifactWriter {
    path: PathBuf,
    file: File,
}

impl ArtifactWriter {
    /// Location being written
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush, close and return the location
    ///
    /// # Errors
    /// Returns the I/O error from flushing
    pub fn finish(self) -> io::Result<PathBuf> {
        let Self { path, mut file } = self;
        file.flush()?;
        Ok(path)
    }

    /// Underlying file handle
    #[inline]
    #[must_use]
    pub fn into_file(self) -> File {
        self.file
    }
}

impl Write for ArtifactWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
