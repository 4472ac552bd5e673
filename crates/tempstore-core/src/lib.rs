//! tempstore Core
//!
//! Temporary artifact storage for generated content (rendered diagrams,
//! images) owned by a context such as the document being rendered.
//!
//! # Core Concepts
//!
//! - [`ResourceKey`]: `(namespace, context, artifact)` address of one artifact
//! - [`PathResolver`]: key → file under `<root>/<namespace>/<context>/<artifact>`
//! - [`UrlResolver`]: key → retrieval URL via a [`ReferenceSerializer`]
//! - [`ArtifactStore`]: façade resolving the current context on every call
//!
//! # Example
//!
//! ```rust,ignore
//! use std::io::Write;
//! use std::sync::Arc;
//! use tempstore_core::{ArtifactStore, FixedContext, StandardTmpScheme, StoreConfig};
//!
//! let config = StoreConfig::new("plantuml");
//! let scheme = Arc::new(StandardTmpScheme::parse("https://wiki/bin/")?);
//! let store = ArtifactStore::from_config(&config, scheme, Arc::new(FixedContext::new("Doc:Demo")))?;
//!
//! let mut out = store.open_for_write("plantuml_a1b2")?;
//! out.write_all(&png_bytes)?;
//! out.finish()?;
//!
//! let url = store.get_url("plantuml_a1b2")?;
//! ```
//!
//! Retention of written files is left to an external janitor; this crate
//! never deletes anything.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod config;
mod context;
mod error;
mod key;
mod path;
mod segment;
mod store;
mod url;

// Re-exports
pub use config::{StoreConfig, DEFAULT_DIR_NAME};
pub use context::{ContextResolver, FixedContext};
pub use error::{
    BoxError, ConfigError, ErrorKind, KeyError, Operation, SerializeError, StorageError,
    StoreCause, StoreError, UrlError,
};
pub use key::ResourceKey;
pub use path::PathResolver;
pub use segment::{decode_segment, encode_segment, MAX_SEGMENT_LEN};
pub use store::{ArtifactStore, ArtifactWriter};
pub use crate::url::{
    ReferenceResolver, ReferenceSerializer, StandardTmpScheme, Url, UrlResolver, TMP_MARKER,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
