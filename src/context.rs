//! Reconciliation of a document's `@context` against the one recorded in a proof.

use crate::json_tools::context_entries;
use serde_json::Value;
use std::fmt;

/// How a context mismatch affects verification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContextPolicy {
    /// Record and log mismatches, then verify against the proof's context
    #[default]
    Lenient,

    /// Any mismatch fails verification
    Strict,
}

/// A proof context entry that the document context does not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMismatch {
    /// Position in the proof's context
    pub index: usize,
    /// Entry in the proof's context
    pub expected: Value,
    /// Entry at the same position in the document's context, if any
    pub found: Option<Value>,
}

impl fmt::Display for ContextMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.found {
            Some(found) => write!(
                f,
                "@context[{}]: proof has {}, document has {found}",
                self.index, self.expected
            ),
            None => write!(
                f,
                "@context[{}]: proof has {}, document has no entry",
                self.index, self.expected
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The context to verify with; always the proof's context
    pub effective_context: Value,
    pub mismatches: Vec<ContextMismatch>,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Compare each entry of `proof_context` with the document entry at the same index.
///
/// A lone string is treated as a one-entry sequence. Extra trailing document
/// entries are not mismatches.
pub fn reconcile(document_context: &Value, proof_context: &Value) -> Reconciliation {
    let document_entries = context_entries(document_context);

    let mismatches = context_entries(proof_context)
        .into_iter()
        .enumerate()
        .filter_map(|(index, expected)| {
            let found = document_entries.get(index).copied();

            (found != Some(expected)).then(|| ContextMismatch {
                index,
                expected: expected.clone(),
                found: found.cloned(),
            })
        })
        .collect();

    Reconciliation {
        effective_context: proof_context.clone(),
        mismatches,
    }
}
