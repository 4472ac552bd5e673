//! Owning-context resolution
//!
//! The store never stores the current context; it asks a
//! [`ContextResolver`] on every call.

/// Supplies the identifier of the context currently being served
/// (e.g. the document being rendered)
pub trait ContextResolver: Send + Sync {
    /// Identifier of the active context
    fn current_context_id(&self) -> String;
}

/// Resolver that always answers with the same context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedContext(String);

impl FixedContext {
    /// Create resolver for `context_id`
    #[inline]
    #[must_use]
    pub fn new(context_id: impl Into<String>) -> Self {
        Self(context_id.into())
    }
}

impl ContextResolver for FixedContext {
    fn current_context_id(&self) -> String {
        self.0.clone()
    }
}
