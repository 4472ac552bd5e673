//! Retrieval URLs for resource keys
//!
//! The URL format belongs to the host's routing layer, represented here by
//! two ports:
//! - [`ReferenceSerializer`]: key → URL (used when rendering)
//! - [`ReferenceResolver`]: URL → key (used by the request handler)
//!
//! [`UrlResolver`] drives a serializer and reports its failures.
//! [`StandardTmpScheme`] implements both ports with the
//! `<base>/tmp/<namespace>/<context>/<artifact>` layout.

use std::collections::BTreeSet;
use std::sync::Arc;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
pub use ::url::Url;

use crate::error::{SerializeError, UrlError};
use crate::key::ResourceKey;

/// Path segment that marks temporary-resource URLs
pub const TMP_MARKER: &str = "tmp";

/// Serializes resource keys into URLs
#[cfg_attr(test, mockall::automock)]
pub trait ReferenceSerializer: Send + Sync {
    /// Build the URL a client will use to fetch `key`
    ///
    /// # Errors
    /// [`SerializeError::Unsupported`] if the key is not handled,
    /// [`SerializeError::Failed`] if construction fails
    fn serialize(&self, key: &ResourceKey) -> Result<Url, SerializeError>;
}

/// Parses URLs produced by a [`ReferenceSerializer`] back into keys
pub trait ReferenceResolver: Send + Sync {
    /// Recover the key encoded in `url`
    ///
    /// # Errors
    /// [`SerializeError::Unsupported`] if `url` is not one of ours
    fn resolve(&self, url: &Url) -> Result<ResourceKey, SerializeError>;
}

/// Computes retrieval URLs through a [`ReferenceSerializer`]
#[derive(Clone)]
pub struct UrlResolver {
    serializer: Arc<dyn ReferenceSerializer>,
}

impl UrlResolver {
    /// Create resolver delegating to `serializer`
    #[inline]
    #[must_use]
    pub fn new(serializer: Arc<dyn ReferenceSerializer>) -> Self {
        Self { serializer }
    }

    /// Serialize `key`
    ///
    /// # Errors
    /// [`UrlError::UnsupportedReference`] or
    /// [`UrlError::SerializationFailed`], never swallowed
    pub fn resolve(&self, key: &ResourceKey) -> Result<Url, UrlError> {
        match self.serializer.serialize(key) {
            Ok(url) => {
                tracing::trace!(%key, %url, "resolved artifact url");
                Ok(url)
            }
            Err(SerializeError::Unsupported(reason)) => Err(UrlError::UnsupportedReference {
                key: key.to_string(),
                reason,
            }),
            Err(source) => Err(UrlError::SerializationFailed {
                key: key.to_string(),
                source,
            }),
        }
    }
}

impl std::fmt::Debug for UrlResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlResolver").finish_non_exhaustive()
    }
}

/// `%` plus control bytes; non-ASCII is always encoded
const ESCAPE: &AsciiSet = &CONTROLS.add(b'%');

/// Built-in temporary-resource URL scheme
///
/// `https://wiki/bin/` + `("plantuml", "Doc:Demo", "a1b2")` gives
/// `https://wiki/bin/tmp/plantuml/Doc:Demo/a1b2`.
///
/// Identifiers are escaped before the url crate's own segment encoding so
/// that `.`/`..` survive as data instead of being treated as dot segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardTmpScheme {
    base: Url,
    namespaces: Option<BTreeSet<String>>,
}

impl StandardTmpScheme {
    /// Create scheme under `base`, accepting every namespace
    ///
    /// # Errors
    /// Returns error if `base` cannot carry path segments
    pub fn new(mut base: Url) -> Result<Self, SerializeError> {
        if base.cannot_be_a_base() {
            return Err(SerializeError::failed(format!(
                "base URL {base} cannot carry path segments"
            )));
        }
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self {
            base,
            namespaces: None,
        })
    }

    /// Parse `base` and create scheme
    ///
    /// # Errors
    /// Returns error if `base` is not an absolute hierarchical URL
    pub fn parse(base: &str) -> Result<Self, SerializeError> {
        let url = Url::parse(base)
            .map_err(|e| SerializeError::failed_with(format!("invalid base URL {base}"), e))?;
        Self::new(url)
    }

    /// Only handle the listed namespaces
    #[must_use]
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = Some(namespaces.into_iter().map(Into::into).collect());
        self
    }

    /// Base URL all artifact URLs live under
    #[inline]
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn check_namespace(&self, namespace: &str) -> Result<(), SerializeError> {
        match &self.namespaces {
            Some(allowed) if !allowed.contains(namespace) => Err(SerializeError::Unsupported(
                format!("namespace [{namespace}] is not served by this scheme"),
            )),
            _ => Ok(()),
        }
    }

    fn base_segments(&self) -> Vec<&str> {
        self.base
            .path_segments()
            .map(|segs| segs.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    fn same_origin(&self, url: &Url) -> bool {
        url.scheme() == self.base.scheme()
            && url.host_str() == self.base.host_str()
            && url.port_or_known_default() == self.base.port_or_known_default()
    }
}

impl ReferenceSerializer for StandardTmpScheme {
    fn serialize(&self, key: &ResourceKey) -> Result<Url, SerializeError> {
        self.check_namespace(key.namespace())?;

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| SerializeError::failed("base URL cannot carry path segments"))?
            .pop_if_empty()
            .push(TMP_MARKER)
            .push(&escape(key.namespace()))
            .push(&escape(key.context_id()))
            .push(&escape(key.artifact_id()));
        Ok(url)
    }
}

impl ReferenceResolver for StandardTmpScheme {
    fn resolve(&self, url: &Url) -> Result<ResourceKey, SerializeError> {
        if !self.same_origin(url) {
            return Err(SerializeError::Unsupported(format!(
                "{url} is outside {}",
                self.base
            )));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(Iterator::collect)
            .unwrap_or_default();
        let base = self.base_segments();
        let rest = segments
            .strip_prefix(base.as_slice())
            .ok_or_else(|| SerializeError::Unsupported(format!("{url} is outside {}", self.base)))?;

        let [TMP_MARKER, namespace, context_id, artifact_id] = rest else {
            return Err(SerializeError::Unsupported(format!(
                "{url} is not a temporary resource URL"
            )));
        };

        let namespace = unescape(namespace)?;
        self.check_namespace(&namespace)?;
        ResourceKey::new(namespace, unescape(context_id)?, unescape(artifact_id)?)
            .map_err(|e| SerializeError::failed_with(format!("invalid key in {url}"), e))
    }
}

fn escape(raw: &str) -> String {
    let escaped = utf8_percent_encode(raw, ESCAPE).to_string();
    match escaped.strip_prefix('.') {
        Some(rest) => format!("%2E{rest}"),
        None => escaped,
    }
}

fn unescape(segment: &str) -> Result<String, SerializeError> {
    let once = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|e| SerializeError::failed_with(format!("segment {segment} is not UTF-8"), e))?;
    percent_decode_str(&once)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| SerializeError::failed_with(format!("segment {segment} is not UTF-8"), e))
}
