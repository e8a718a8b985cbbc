use crate::chain::ReferencePolicy;
use crate::context::{ContextMismatch, ContextPolicy};
use crate::document::Document;
use crate::proof::ProofPurpose;
use std::fmt;

/// Options for verifying a proof
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub(crate) context_policy: ContextPolicy,
    pub(crate) reference_policy: ReferencePolicy,
    pub(crate) expected_proof_purpose: Option<ProofPurpose>,
}

impl VerifyOptions {
    /// Lenient context handling, strict `previousProof` references, any proof purpose.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context_policy(mut self, policy: ContextPolicy) -> Self {
        self.context_policy = policy;
        self
    }

    pub fn with_reference_policy(mut self, policy: ReferencePolicy) -> Self {
        self.reference_policy = policy;
        self
    }

    /// Require the proof to have been made for `purpose`
    pub fn with_expected_proof_purpose(mut self, purpose: ProofPurpose) -> Self {
        self.expected_proof_purpose = Some(purpose);
        self
    }
}

/// Why a structurally valid proof did not verify
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    /// The signature does not match the signing message
    SignatureMismatch,

    /// The document context differs from the proof context under [`ContextPolicy::Strict`]
    ContextMismatch,

    /// The proof was made for another purpose
    ProofPurposeMismatch {
        expected: ProofPurpose,
        found: ProofPurpose,
    },
}

impl VerificationFailure {
    pub fn code(&self) -> &'static str {
        match self {
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
            Self::ContextMismatch => "CONTEXT_MISMATCH",
            Self::ProofPurposeMismatch { .. } => "PROOF_PURPOSE_MISMATCH",
        }
    }
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignatureMismatch => f.write_str("signature does not match"),
            Self::ContextMismatch => f.write_str("document context does not match proof context"),
            Self::ProofPurposeMismatch { expected, found } => {
                write!(f, "proof purpose was expected to be {expected}, found {found}")
            }
        }
    }
}

/// Outcome of verifying one proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub verified: bool,
    pub failures: Vec<VerificationFailure>,
    /// Context differences seen while verifying, whether or not they were fatal
    pub context_mismatches: Vec<ContextMismatch>,
    /// The unsecured document as verified, present only when `verified`
    pub verified_document: Option<Document>,
}

impl VerificationResult {
    pub(crate) fn from_failures(
        failures: Vec<VerificationFailure>,
        context_mismatches: Vec<ContextMismatch>,
        document: Document,
    ) -> Self {
        let verified = failures.is_empty();

        Self {
            verified,
            failures,
            context_mismatches,
            verified_document: verified.then_some(document),
        }
    }
}

/// Outcome of verifying every proof in a proof set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofSetVerification {
    /// True when every proof verified
    pub verified: bool,
    /// One result per proof, in proof set order
    pub results: Vec<VerificationResult>,
}

impl ProofSetVerification {
    pub(crate) fn new(results: Vec<VerificationResult>) -> Self {
        Self {
            verified: !results.is_empty() && results.iter().all(|r| r.verified),
            results,
        }
    }
}
