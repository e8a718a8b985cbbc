//! The `bip340-rdfc-2025` and `bip340-jcs-2025` cryptosuites

use crate::canonicalize::{Canonicalizer, JcsCanonicalizer, RdfcCanonicalizer};
use crate::chain::resolve_previous;
use crate::context::{ContextPolicy, reconcile};
use crate::document::{Document, ProofField, SecuredDocument};
use crate::error::{Error, Result};
use crate::hash::HashData;
use crate::key::{KeyPair, public_key_from_verification_method};
use crate::proof::{CryptoSuiteName, Proof, ProofConfig, ProofOptions, ProofValue};
use crate::schnorr::{bip340_sign, bip340_verify};
use crate::trace::ProofTrace;
use crate::verification::{
    ProofSetVerification, VerificationFailure, VerificationResult, VerifyOptions,
};
use std::fmt;
use tracing::{debug, warn};

/// A BIP-340 cryptosuite: a canonicalization strategy plus Schnorr signatures.
pub struct CryptoSuite {
    name: CryptoSuiteName,
    canonicalizer: Box<dyn Canonicalizer>,
}

impl fmt::Debug for CryptoSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoSuite")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl CryptoSuite {
    /// `bip340-jcs-2025`
    pub fn jcs() -> Self {
        Self {
            name: CryptoSuiteName::Jcs,
            canonicalizer: Box::new(JcsCanonicalizer),
        }
    }

    /// `bip340-rdfc-2025`
    pub fn rdfc(canonicalizer: RdfcCanonicalizer) -> Self {
        Self {
            name: CryptoSuiteName::Rdfc,
            canonicalizer: Box::new(canonicalizer),
        }
    }

    pub fn name(&self) -> CryptoSuiteName {
        self.name
    }

    /// Create a secured document carrying a single new proof.
    pub fn create_proof(
        &self,
        document: &Document,
        key_pair: &KeyPair,
        options: &ProofOptions,
    ) -> Result<SecuredDocument> {
        self.create_proof_with_trace(document, key_pair, options)
            .map(|(secured, _trace)| secured)
    }

    /// [`Self::create_proof`], also returning every intermediate value.
    pub fn create_proof_with_trace(
        &self,
        document: &Document,
        key_pair: &KeyPair,
        options: &ProofOptions,
    ) -> Result<(SecuredDocument, ProofTrace)> {
        let (proof, trace) = self.sign(document, &[], key_pair, options)?;
        let secured = document.clone().secure(ProofField::Single(proof));

        Ok((secured, trace))
    }

    /// Sign `document` with `previous` proofs embedded, returning the detached proof.
    pub(crate) fn sign(
        &self,
        document: &Document,
        previous: &[&Proof],
        key_pair: &KeyPair,
        options: &ProofOptions,
    ) -> Result<(Proof, ProofTrace)> {
        // Both suites canonicalize the proof configuration with the document's context
        let mut config = options.to_proof_config(self.name, key_pair.verification_method());
        config.context = Some(document.context().clone());

        let canonical_proof_config = self.configure_proof(&config)?;
        let canonical_document = self.transform(document, previous)?;
        let hash_data = HashData::combine(&canonical_document, &canonical_proof_config);

        debug!(
            cryptosuite = %self.name,
            document_hash = %hash_data.document_hash,
            proof_hash = %hash_data.proof_hash,
            message = %hash_data.message,
            "hashed proof input"
        );

        let aux_randomness = options.aux_randomness.bytes();
        let signature = bip340_sign(
            hash_data.message.as_bytes(),
            &key_pair.secret_scalar()?,
            &aux_randomness,
        )?;

        let trace = ProofTrace {
            cryptosuite: self.name,
            canonical_document,
            proof_config: serde_json::to_string_pretty(&config)?,
            canonical_proof_config,
            hash_data,
            aux_randomness,
            signature,
        };

        // RDFC proofs inherit the document context; JCS proofs keep their own copy
        if self.name == CryptoSuiteName::Rdfc {
            config.context = None;
        }

        Ok((
            Proof::from_config(config, ProofValue::from_signature(&signature)),
            trace,
        ))
    }

    /// Verify a document secured with a single proof.
    pub fn verify_proof(
        &self,
        secured: &SecuredDocument,
        options: &VerifyOptions,
    ) -> Result<VerificationResult> {
        let proof = secured.single_proof()?;

        self.verify_with_previous(secured.document(), proof, &[], options)
    }

    /// Verify every proof of a proof set in order.
    ///
    /// `previousProof` references are resolved against the proofs before the one being
    /// verified, using the reference policy in `options`.
    pub fn verify_proof_set(
        &self,
        secured: &SecuredDocument,
        options: &VerifyOptions,
    ) -> Result<ProofSetVerification> {
        let proofs = secured.proofs();

        let results = proofs
            .iter()
            .enumerate()
            .map(|(index, proof)| {
                let previous = resolve_previous(
                    proof.previous_proof(),
                    &proofs[..index],
                    options.reference_policy,
                )?;

                self.verify_with_previous(secured.document(), proof, &previous, options)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ProofSetVerification::new(results))
    }

    fn verify_with_previous(
        &self,
        document: &Document,
        proof: &Proof,
        previous: &[&Proof],
        options: &VerifyOptions,
    ) -> Result<VerificationResult> {
        if proof.config.cryptosuite != self.name {
            return Err(Error::UnsupportedCryptoSuite(
                proof.config.cryptosuite.to_string(),
            ));
        }

        let mut failures = Vec::new();

        if let Some(expected) = &options.expected_proof_purpose {
            if *expected != proof.config.proof_purpose {
                failures.push(VerificationFailure::ProofPurposeMismatch {
                    expected: expected.clone(),
                    found: proof.config.proof_purpose.clone(),
                });
            }
        }

        let mut config = proof.config.clone();
        let mut context_mismatches = Vec::new();

        let document = match (self.name, &proof.config.context) {
            (CryptoSuiteName::Rdfc, _) => {
                config.context = Some(document.context().clone());
                document.clone()
            }
            (CryptoSuiteName::Jcs, Some(proof_context)) => {
                let reconciliation = reconcile(document.context(), proof_context);

                for mismatch in &reconciliation.mismatches {
                    warn!(%mismatch, "document context differs from proof context");
                }

                if !reconciliation.is_consistent() && options.context_policy == ContextPolicy::Strict
                {
                    failures.push(VerificationFailure::ContextMismatch);
                }

                context_mismatches = reconciliation.mismatches;
                document.with_context(reconciliation.effective_context)
            }
            (CryptoSuiteName::Jcs, None) => document.clone(),
        };

        let canonical_proof_config = self.configure_proof(&config)?;
        let canonical_document = self.transform(&document, previous)?;
        let hash_data = HashData::combine(&canonical_document, &canonical_proof_config);

        let signature = proof.proof_value.signature()?;
        let public_key = public_key_from_verification_method(&config.verification_method)?;

        if !bip340_verify(&signature, hash_data.message.as_bytes(), &public_key)? {
            failures.push(VerificationFailure::SignatureMismatch);
        }

        debug!(
            cryptosuite = %self.name,
            id = proof.id().unwrap_or_default(),
            message = %hash_data.message,
            failures = failures.len(),
            "verified proof"
        );

        Ok(VerificationResult::from_failures(
            failures,
            context_mismatches,
            document,
        ))
    }

    fn transform(&self, document: &Document, previous: &[&Proof]) -> Result<String> {
        self.canonicalizer
            .canonicalize(&document.signing_value(previous)?)
    }

    fn configure_proof(&self, config: &ProofConfig) -> Result<String> {
        self.canonicalizer
            .canonicalize(&serde_json::to_value(config)?)
    }
}

/// Select a cryptosuite by its identifier.
///
/// `bip340-rdfc-2025` needs an RDF canonicalizer.
pub fn instantiate_cryptosuite(
    name: &str,
    rdfc: Option<RdfcCanonicalizer>,
) -> Result<CryptoSuite> {
    match name.parse()? {
        CryptoSuiteName::Jcs => Ok(CryptoSuite::jcs()),
        CryptoSuiteName::Rdfc => rdfc.map(CryptoSuite::rdfc).ok_or_else(|| {
            Error::UnsupportedCryptoSuite(format!("{name} requires an RDF normalizer"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixed_key_pair, fixture_options, rdfc_canonicalizer, test_document};
    use serde_json::json;

    #[test]
    fn test_suite_instantiation() {
        assert_eq!(
            instantiate_cryptosuite("bip340-jcs-2025", None).unwrap().name(),
            CryptoSuiteName::Jcs
        );
        assert_eq!(
            instantiate_cryptosuite("bip340-rdfc-2025", Some(rdfc_canonicalizer()))
                .unwrap()
                .name(),
            CryptoSuiteName::Rdfc
        );
        assert!(matches!(
            instantiate_cryptosuite("bip340-rdfc-2025", None),
            Err(Error::UnsupportedCryptoSuite(_))
        ));
        assert!(matches!(
            instantiate_cryptosuite("eddsa-jcs-2022", None),
            Err(Error::UnsupportedCryptoSuite(_))
        ));
    }

    #[test]
    fn test_rdfc_proof_has_no_context() {
        let suite = CryptoSuite::rdfc(rdfc_canonicalizer());
        let secured = suite
            .create_proof(&test_document(), &fixed_key_pair(), &fixture_options())
            .unwrap();

        let proof = secured.single_proof().unwrap();
        assert_eq!(proof.config.context, None);
        assert_eq!(proof.config.cryptosuite, CryptoSuiteName::Rdfc);
    }

    #[test]
    fn test_jcs_proof_keeps_context() {
        let document = test_document();
        let secured = CryptoSuite::jcs()
            .create_proof(&document, &fixed_key_pair(), &fixture_options())
            .unwrap();

        let proof = secured.single_proof().unwrap();
        assert_eq!(proof.config.context.as_ref(), Some(document.context()));
    }

    #[test]
    fn test_trace_matches_proof() {
        let (secured, trace) = CryptoSuite::jcs()
            .create_proof_with_trace(&test_document(), &fixed_key_pair(), &fixture_options())
            .unwrap();

        let proof = secured.single_proof().unwrap();
        assert_eq!(proof.proof_value.0, trace.signature_multibase());
        assert_eq!(trace.aux_randomness, [0xFF; 32]);
        assert_eq!(
            trace.hash_data,
            HashData::combine(&trace.canonical_document, &trace.canonical_proof_config)
        );

        let config: serde_json::Value = serde_json::from_str(&trace.proof_config).unwrap();
        assert_eq!(config["created"], "2023-02-24T23:36:38Z");
        assert_eq!(config["proofPurpose"], "assertionMethod");
    }

    #[test]
    fn test_wrong_suite_is_rejected() {
        let secured = CryptoSuite::jcs()
            .create_proof(&test_document(), &fixed_key_pair(), &fixture_options())
            .unwrap();

        assert!(matches!(
            CryptoSuite::rdfc(rdfc_canonicalizer()).verify_proof(&secured, &VerifyOptions::new()),
            Err(Error::UnsupportedCryptoSuite(_))
        ));
    }

    #[test]
    fn test_unexpected_proof_purpose() {
        let suite = CryptoSuite::jcs();
        let secured = suite
            .create_proof(&test_document(), &fixed_key_pair(), &fixture_options())
            .unwrap();

        let result = suite
            .verify_proof(
                &secured,
                &VerifyOptions::new()
                    .with_expected_proof_purpose(crate::ProofPurpose::Authentication),
            )
            .unwrap();

        assert!(!result.verified);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].code(), "PROOF_PURPOSE_MISMATCH");
    }

    #[test]
    fn test_malformed_proof_value() {
        let suite = CryptoSuite::jcs();
        let secured = suite
            .create_proof(&test_document(), &fixed_key_pair(), &fixture_options())
            .unwrap();

        let mut value = secured.to_value().unwrap();
        value["proof"]["proofValue"] = json!("not-multibase");
        let secured = SecuredDocument::from_json_value(value).unwrap();

        assert!(matches!(
            suite.verify_proof(&secured, &VerifyOptions::new()),
            Err(Error::InvalidProofValue(_))
        ));
    }
}
