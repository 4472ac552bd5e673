//! Resource keys
//!
//! Provides [`ResourceKey`], the `(namespace, context, artifact)` triple that
//! addresses exactly one stored artifact.

use std::fmt::{self, Display, Formatter};

use crate::error::KeyError;

/// Address of one temporary artifact
///
/// Built fresh for every request and never cached. Two keys are equal iff
/// all three identifiers are equal, and equal keys always resolve to the
/// same path and URL.
///
/// # Examples
/// - `("plantuml", "Doc:Demo", "plantuml_a1b2")`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    namespace: String,
    context_id: String,
    artifact_id: String,
}

impl ResourceKey {
    /// Create a key, rejecting empty identifiers
    ///
    /// # Errors
    /// Returns [`KeyError::Empty`] if any identifier is empty
    pub fn new(
        namespace: impl Into<String>,
        context_id: impl Into<String>,
        artifact_id: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let key = Self {
            namespace: namespace.into(),
            context_id: context_id.into(),
            artifact_id: artifact_id.into(),
        };
        require_non_empty("namespace", &key.namespace)?;
        require_non_empty("context id", &key.context_id)?;
        require_non_empty("artifact id", &key.artifact_id)?;
        Ok(key)
    }

    /// Namespace tag (artifact family)
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Owning context identifier
    #[inline]
    #[must_use]
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Caller-supplied artifact identifier
    #[inline]
    #[must_use]
    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.namespace, self.context_id, self.artifact_id
        )
    }
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), KeyError> {
    if value.is_empty() {
        Err(KeyError::Empty { field })
    } else {
        Ok(())
    }
}
