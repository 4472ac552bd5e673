//! Error types for the temporary artifact store
//!
//! Each layer reports its own error type:
//! - [`KeyError`]: malformed or unsafe identifiers
//! - [`StorageError`]: directory creation or file open failures
//! - [`UrlError`]: the routing collaborator rejected or failed on a key
//!
//! At the façade boundary these are aggregated into [`StoreCause`] and
//! wrapped in a [`StoreError`] carrying the artifact id and operation.

use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;

/// Boxed error produced by an external collaborator
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Malformed or unsafe resource key
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// Identifier is empty
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// Encoded identifier does not fit in a single path component
    #[error("{field} is too long once encoded ({len} bytes, max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Resolved path would leave the namespace root
    #[error("path {} escapes the namespace root", .path.display())]
    Escapes { path: PathBuf },
}

/// Filesystem failure while preparing or opening an artifact location
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Could not create the parent directories
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Could not create or truncate the artifact file
    #[error("failed to open {} for writing: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Path has no parent directory to create
    #[error("path {} has no parent directory", .path.display())]
    NoParent { path: PathBuf },
}

impl StorageError {
    /// Path the failed operation targeted
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::CreateDir { path, .. } | Self::OpenFile { path, .. } | Self::NoParent { path } => {
                path
            }
        }
    }
}

/// Errors reported by a [`ReferenceSerializer`](crate::ReferenceSerializer)
/// or [`ReferenceResolver`](crate::ReferenceResolver)
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// The collaborator does not handle this kind of reference
    #[error("unsupported reference: {0}")]
    Unsupported(String),

    /// The collaborator failed while building or parsing the URL
    #[error("{reason}")]
    Failed {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl SerializeError {
    /// Failure without an underlying cause
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            source: None,
        }
    }

    /// Failure wrapping an underlying cause
    #[must_use]
    pub fn failed_with(reason: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Failed {
            reason: reason.into(),
            source: Some(source.into()),
        }
    }
}

/// URL-layer failure surfaced by [`UrlResolver`](crate::UrlResolver)
#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    /// Routing collaborator rejected the key
    #[error("unsupported reference [{key}]: {reason}")]
    UnsupportedReference { key: String, reason: String },

    /// Routing collaborator failed while building the URL
    #[error("failed to serialize [{key}]")]
    SerializationFailed {
        key: String,
        #[source]
        source: SerializeError,
    },
}

/// Underlying cause of a [`StoreError`]
#[derive(Debug, thiserror::Error)]
pub enum StoreCause {
    /// Malformed or unsafe identifier
    #[error("invalid key")]
    InvalidKey(#[from] KeyError),

    /// Filesystem unavailable
    #[error("storage unavailable")]
    StorageUnavailable(#[from] StorageError),

    /// URL serialization failed
    #[error(transparent)]
    Url(#[from] UrlError),
}

/// Classification of store failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed/unsafe identifier
    InvalidKey,
    /// Filesystem failure creating directories or opening files
    StorageUnavailable,
    /// Routing collaborator rejected the reference
    UnsupportedReference,
    /// Routing collaborator failed during construction
    SerializationFailed,
}

/// Façade operation that produced a [`StoreError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `ArtifactStore::open_for_write`
    OpenForWrite,
    /// `ArtifactStore::get_url`
    GetUrl,
    /// `ArtifactStore::locate`
    Locate,
    /// `ArtifactStore::resolve_url`
    ResolveUrl,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OpenForWrite => "create the file",
            Self::GetUrl => "compute the URL",
            Self::Locate => "compute the location",
            Self::ResolveUrl => "resolve the URL",
        };
        f.write_str(s)
    }
}

/// Failure at the [`ArtifactStore`](crate::ArtifactStore) boundary
#[derive(Debug, thiserror::Error)]
#[error("failed to {operation} for artifact [{artifact_id}]")]
pub struct StoreError {
    artifact_id: String,
    operation: Operation,
    #[source]
    cause: StoreCause,
}

impl StoreError {
    /// Wrap a cause with the artifact id and operation
    #[must_use]
    pub fn new(
        artifact_id: impl Into<String>,
        operation: Operation,
        cause: impl Into<StoreCause>,
    ) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            operation,
            cause: cause.into(),
        }
    }

    /// Artifact id the caller requested
    #[inline]
    #[must_use]
    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    /// Operation that failed
    #[inline]
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Underlying cause
    #[inline]
    #[must_use]
    pub fn cause(&self) -> &StoreCause {
        &self.cause
    }

    /// Consume into the underlying cause
    #[inline]
    #[must_use]
    pub fn into_cause(self) -> StoreCause {
        self.cause
    }

    /// Classify the failure
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match &self.cause {
            StoreCause::InvalidKey(_) => ErrorKind::InvalidKey,
            StoreCause::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            StoreCause::Url(UrlError::UnsupportedReference { .. }) => {
                ErrorKind::UnsupportedReference
            }
            StoreCause::Url(UrlError::SerializationFailed { .. }) => {
                ErrorKind::SerializationFailed
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Namespace is not a valid identifier
    #[error("invalid namespace: {0}")]
    Namespace(#[from] KeyError),

    /// Root must be absolute
    #[error("root directory must be absolute: {}", .0.display())]
    RelativeRoot(PathBuf),
}
