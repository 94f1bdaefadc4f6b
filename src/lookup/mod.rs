//! Definition lookup services ("jump to definition").
//!
//! The resolver addresses type references by [`SourceLocation`] and asks a
//! [`DefinitionService`] where the referenced name is defined. Repeating the query on each
//! answer walks through imports until the service reports the query location itself,
//! which marks the declaration site.
//!
//! - [`flow::FlowDefinitionService`] shells out to `flow get-def`.
//! - [`local::SourceIndexService`] answers from the parsed sources, no external tool needed.
//! - [`CachedDefinitionService`] memoizes either one for the length of a run.

pub mod flow;
pub mod local;

use crate::ast::SourceLocation;
use crate::error::Result;
use dashmap::DashMap;
use log::debug;

pub use flow::FlowDefinitionService;
pub use local::SourceIndexService;

/// Resolves the definition site of the name at a source location.
pub trait DefinitionService: Send + Sync {
    /// Returns where the name at `query` is defined.
    ///
    /// Returning `query` itself (same file, same start) means `query` already is the
    /// definition. `Ok(None)` means the service has no answer for the location.
    ///
    /// # Errors
    ///
    /// Implementations return [`crate::error::AnalysisError::ExternalProcess`] when the
    /// backing tool fails, and may propagate I/O or parse errors of the queried file.
    fn lookup_definition(&self, query: &SourceLocation) -> Result<Option<SourceLocation>>;
}

impl<S: DefinitionService + ?Sized> DefinitionService for &S {
    fn lookup_definition(&self, query: &SourceLocation) -> Result<Option<SourceLocation>> {
        (**self).lookup_definition(query)
    }
}

impl<S: DefinitionService + ?Sized> DefinitionService for Box<S> {
    fn lookup_definition(&self, query: &SourceLocation) -> Result<Option<SourceLocation>> {
        (**self).lookup_definition(query)
    }
}

/// Memoizes lookups by query location.
///
/// Only successful answers are cached; errors are returned as-is and retried on the next
/// query.
pub struct CachedDefinitionService<S> {
    inner: S,
    cache: DashMap<SourceLocation, Option<SourceLocation>>,
}

impl<S: DefinitionService> CachedDefinitionService<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    /// Number of cached answers.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl<S: DefinitionService> DefinitionService for CachedDefinitionService<S> {
    fn lookup_definition(&self, query: &SourceLocation) -> Result<Option<SourceLocation>> {
        if let Some(answer) = self.cache.get(query) {
            debug!("Definition cache hit for {}", query);
            return Ok(answer.clone());
        }

        let answer = self.inner.lookup_definition(query)?;
        self.cache.insert(query.clone(), answer.clone());
        Ok(answer)
    }
}
