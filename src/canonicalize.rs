//! Canonicalization of JSON documents and proof configurations.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Turns a JSON node into deterministic text for hashing.
pub trait Canonicalizer: Send + Sync {
    fn canonicalize(&self, node: &Value) -> Result<String>;
}

/// JSON Canonicalization Scheme (RFC 8785)
#[derive(Debug, Default, Clone, Copy)]
pub struct JcsCanonicalizer;

impl Canonicalizer for JcsCanonicalizer {
    fn canonicalize(&self, node: &Value) -> Result<String> {
        let canonical = serde_jcs::to_string(node)
            .map_err(|e| Error::Canonicalization(format!("JCS canonicalization failed: {e}")))?;

        debug!(len = canonical.len(), "JCS canonical form");

        Ok(canonical)
    }
}

/// Resolves JSON-LD context URLs without touching the network.
pub trait ContextLoader: Send + Sync {
    /// Return the context document published at `url`.
    fn load(&self, url: &str) -> Result<Value>;
}

/// A [`ContextLoader`] backed by a fixed set of preloaded documents.
#[derive(Debug, Default, Clone)]
pub struct StaticContextLoader {
    contexts: HashMap<String, Value>,
}

impl StaticContextLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a context document for `url`.
    pub fn with_context(mut self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    /// Add a context document for `url`, read from a JSON file.
    pub fn with_context_file<P: AsRef<Path>>(
        mut self,
        url: impl Into<String>,
        path: P,
    ) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        self.insert(url, serde_json::from_str(&content)?);

        Ok(self)
    }

    pub fn insert(&mut self, url: impl Into<String>, document: Value) {
        self.contexts.insert(url.into(), document);
    }
}

impl ContextLoader for StaticContextLoader {
    fn load(&self, url: &str) -> Result<Value> {
        self.contexts
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Canonicalization(format!("Context `{url}` is not available")))
    }
}

/// Converts a JSON-LD document to canonical N-Quads (RDF Dataset Canonicalization).
///
/// Remote contexts must be resolved through `loader`.
pub trait RdfNormalizer: Send + Sync {
    fn normalize(&self, document: &Value, loader: &dyn ContextLoader) -> Result<String>;
}

/// Replace every URL in the top-level `@context` with the context it names.
///
/// Embedded context objects are kept as they are. A loaded document's own
/// `@context` member is inlined when present, otherwise the whole document.
pub fn inline_contexts(document: &Value, loader: &dyn ContextLoader) -> Result<Value> {
    let mut inlined = document.clone();

    let Some(context) = inlined.get_mut("@context") else {
        return Ok(inlined);
    };

    let resolve = |entry: &Value| -> Result<Value> {
        match entry {
            Value::String(url) => {
                let mut loaded = loader.load(url)?;
                Ok(match loaded.get_mut("@context") {
                    Some(inner) => inner.take(),
                    None => loaded,
                })
            }
            other => Ok(other.clone()),
        }
    };

    *context = match &*context {
        Value::Array(entries) => Value::Array(entries.iter().map(resolve).collect::<Result<_>>()?),
        entry => resolve(entry)?,
    };

    Ok(inlined)
}

/// RDF Dataset Canonicalization (RDFC-1.0) over an injected normalizer and loader
#[derive(Clone)]
pub struct RdfcCanonicalizer {
    normalizer: Arc<dyn RdfNormalizer>,
    loader: Arc<dyn ContextLoader>,
}

impl RdfcCanonicalizer {
    pub fn new(
        normalizer: impl RdfNormalizer + 'static,
        loader: impl ContextLoader + 'static,
    ) -> Self {
        Self {
            normalizer: Arc::new(normalizer),
            loader: Arc::new(loader),
        }
    }
}

impl fmt::Debug for RdfcCanonicalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RdfcCanonicalizer").finish_non_exhaustive()
    }
}

impl Canonicalizer for RdfcCanonicalizer {
    fn canonicalize(&self, node: &Value) -> Result<String> {
        if node.get("@context").is_none() {
            return Err(Error::Canonicalization(
                "RDF canonicalization requires an @context".into(),
            ));
        }

        let nquads = self.normalizer.normalize(node, self.loader.as_ref())?;

        debug!(
            len = nquads.len(),
            statements = nquads.lines().count(),
            "RDFC canonical form"
        );

        Ok(nquads)
    }
}
