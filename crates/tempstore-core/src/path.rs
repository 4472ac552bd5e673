//! Filesystem locations for resource keys
//!
//! Provides [`PathResolver`], which maps a [`ResourceKey`] to
//! `<root>/<namespace>/<context>/<artifact>` with every identifier escaped
//! by [`encode_segment`](crate::encode_segment).

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{KeyError, StorageError};
use crate::key::ResourceKey;
use crate::segment::checked_segment;

/// Maps resource keys to paths under a shared root
///
/// Resolution is pure. The only side effect lives in
/// [`ensure_writable`](Self::ensure_writable). No locks are taken; the
/// escaping alone keeps contexts apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create resolver rooted at `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Shared root for all namespaces
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every artifact of `namespace`
    ///
    /// # Errors
    /// Returns [`KeyError`] if the namespace is empty or too long
    pub fn namespace_root(&self, namespace: &str) -> Result<PathBuf, KeyError> {
        Ok(self.root.join(checked_segment("namespace", namespace)?))
    }

    /// Resolve the storage path for `key`
    ///
    /// Deterministic: equal keys always give equal paths, and distinct keys
    /// give distinct paths.
    ///
    /// # Errors
    /// Returns [`KeyError`] for empty or oversized identifiers
    pub fn resolve(&self, key: &ResourceKey) -> Result<PathBuf, KeyError> {
        let ns_root = self.namespace_root(key.namespace())?;
        let path = ns_root
            .join(checked_segment("context id", key.context_id())?)
            .join(checked_segment("artifact id", key.artifact_id())?);

        if !is_confined(&path, &ns_root) {
            return Err(KeyError::Escapes { path });
        }

        tracing::trace!(%key, path = %path.display(), "resolved artifact path");
        Ok(path)
    }

    /// Create all missing parent directories of `path`
    ///
    /// Idempotent and safe to call concurrently: a directory created by
    /// another caller in the meantime counts as success.
    ///
    /// # Errors
    /// Returns [`StorageError::CreateDir`] if creation is blocked
    pub fn ensure_writable(&self, path: &Path) -> Result<(), StorageError> {
        let parent = path.parent().ok_or_else(|| StorageError::NoParent {
            path: path.to_path_buf(),
        })?;

        match fs::create_dir_all(parent) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && parent.is_dir() => Ok(()),
            Err(source) => Err(StorageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            }),
        }
    }
}

/// `path` lies strictly below `base` using only normal components
fn is_confined(path: &Path, base: &Path) -> bool {
    match path.strip_prefix(base) {
        Ok(rest) => {
            rest.components().count() > 0
                && rest.components().all(|c| matches!(c, Component::Normal(_)))
        }
        Err(_) => false,
    }
}
