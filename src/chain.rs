//! Proof sets, `previousProof` resolution and proof chain construction.

use crate::cryptosuite::CryptoSuite;
use crate::document::{Document, ProofField, SecuredDocument};
use crate::error::{Error, Result};
use crate::key::KeyPair;
use crate::proof::{PreviousProof, Proof, ProofOptions, ProofRef};
use serde_json::Number;
use tracing::info;

/// How non-string `previousProof` references are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReferencePolicy {
    /// Match any reference by its string form, so `456321` finds the proof with id `"456321"`.
    /// Only meant for building fixtures.
    Lenient,

    /// Only string references are accepted
    #[default]
    Strict,
}

/// An ordered set of proofs with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofSet {
    proofs: Vec<Proof>,
}

impl ProofSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a proof. Fails if another proof already uses its id.
    pub fn push(&mut self, proof: Proof) -> Result<()> {
        if let Some(id) = proof.id() {
            if self.get(id).is_some() {
                return Err(Error::DuplicateProofId(id.into()));
            }
        }

        self.proofs.push(proof);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Proof> {
        self.proofs.iter().find(|proof| proof.id() == Some(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proof> {
        self.proofs.iter()
    }

    pub fn len(&self) -> usize {
        self.proofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proofs.is_empty()
    }

    pub fn as_slice(&self) -> &[Proof] {
        &self.proofs
    }

    pub fn into_vec(self) -> Vec<Proof> {
        self.proofs
    }
}

impl TryFrom<Vec<Proof>> for ProofSet {
    type Error = Error;

    fn try_from(proofs: Vec<Proof>) -> Result<Self> {
        let mut set = Self::new();
        for proof in proofs {
            set.push(proof)?;
        }

        Ok(set)
    }
}

/// Find the proofs a `previousProof` value names, in reference order.
pub fn resolve_previous<'a>(
    previous_proof: Option<&PreviousProof>,
    proofs: &'a [Proof],
    policy: ReferencePolicy,
) -> Result<Vec<&'a Proof>> {
    let Some(previous_proof) = previous_proof else {
        return Ok(Vec::new());
    };

    previous_proof
        .refs()
        .iter()
        .map(|reference| {
            let id = match (reference, policy) {
                (ProofRef::Id(id), _) => id.clone(),
                (ProofRef::Number(_), ReferencePolicy::Lenient) => reference.to_string(),
                (ProofRef::Number(_), ReferencePolicy::Strict) => {
                    return Err(Error::InvalidProofReference(reference.to_string()));
                }
            };

            proofs
                .iter()
                .find(|proof| proof.id() == Some(id.as_str()))
                .ok_or(Error::MissingProofReference(id))
        })
        .collect()
}

/// [`resolve_previous`] with [`ReferencePolicy::Strict`]
pub fn resolve_previous_strict<'a>(
    previous_proof: Option<&PreviousProof>,
    proofs: &'a [Proof],
) -> Result<Vec<&'a Proof>> {
    resolve_previous(previous_proof, proofs, ReferencePolicy::Strict)
}

/// [`resolve_previous`] with [`ReferencePolicy::Lenient`]
pub fn resolve_previous_lenient<'a>(
    previous_proof: Option<&PreviousProof>,
    proofs: &'a [Proof],
) -> Result<Vec<&'a Proof>> {
    resolve_previous(previous_proof, proofs, ReferencePolicy::Lenient)
}

/// Builds a proof set over one document, one proof at a time.
///
/// Each new proof signs the document with the proofs it references embedded
/// as `proof`. References resolve leniently so malformed chains can be built.
#[derive(Debug)]
pub struct ProofChain<'a> {
    suite: &'a CryptoSuite,
    document: Document,
    proofs: ProofSet,
}

impl<'a> ProofChain<'a> {
    pub fn new(suite: &'a CryptoSuite, document: Document) -> Self {
        Self {
            suite,
            document,
            proofs: ProofSet::new(),
        }
    }

    /// Sign and append a proof; `options` may name earlier proofs as `previousProof`.
    pub fn add_proof(&mut self, key_pair: &KeyPair, options: &ProofOptions) -> Result<&Proof> {
        let previous = resolve_previous_lenient(
            options.previous_proof.as_ref(),
            self.proofs.as_slice(),
        )?;

        let (proof, _trace) = self
            .suite
            .sign(&self.document, &previous, key_pair, options)?;

        info!(
            cryptosuite = %self.suite.name(),
            id = proof.id().unwrap_or_default(),
            previous = previous.len(),
            "added proof to chain"
        );

        self.proofs.push(proof)?;

        Ok(&self.proofs.as_slice()[self.proofs.len() - 1])
    }

    pub fn proofs(&self) -> &ProofSet {
        &self.proofs
    }

    /// The document secured with every proof added so far.
    pub fn finish(self) -> SecuredDocument {
        self.document
            .secure(ProofField::Set(self.proofs.into_vec()))
    }
}

/// How each proof after the first refers to its predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousProofShape {
    /// `"previousProof": "<id>"`
    String,
    /// `"previousProof": ["<id>"]`
    Array,
}

/// A proof chain test vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainFixture {
    /// File stem, e.g. `2.0-previousProofStringOk`
    pub name: String,
    pub shape: PreviousProofShape,
    /// Ids for the proofs, in chain order; defaults to `urn:proof:<n>`
    pub proof_ids: Vec<ProofRef>,
    /// Whether the fixture verifies under strict reference resolution
    pub expect_verified: bool,
}

/// Numeric proof id used by the invalid-reference fixture
pub const NUMERIC_PROOF_ID: u64 = 456321;

/// The three `previousProof` conformance fixtures for a credential version (`1.1`, `2.0`).
pub fn conformance_fixtures(version: &str) -> Vec<ChainFixture> {
    vec![
        ChainFixture {
            name: format!("{version}-previousProofStringOk"),
            shape: PreviousProofShape::String,
            proof_ids: Vec::new(),
            expect_verified: true,
        },
        ChainFixture {
            name: format!("{version}-previousProofArrayOk"),
            shape: PreviousProofShape::Array,
            proof_ids: Vec::new(),
            expect_verified: true,
        },
        ChainFixture {
            name: format!("{version}-previousProofNotStringFail"),
            shape: PreviousProofShape::String,
            proof_ids: vec![ProofRef::Number(Number::from(NUMERIC_PROOF_ID))],
            expect_verified: false,
        },
    ]
}

impl ChainFixture {
    /// Secure `document` with one proof per key, each referencing the one before it.
    pub fn build(
        &self,
        suite: &CryptoSuite,
        document: &Document,
        chain_keys: &[KeyPair],
        options: &ProofOptions,
    ) -> Result<SecuredDocument> {
        secure_document(
            suite,
            document,
            chain_keys,
            self.shape,
            &self.proof_ids,
            options,
        )
    }
}

/// Build a linear proof chain: proof `n` references proof `n - 1`.
///
/// `proof_ids[n]` names proof `n` and is also the reference written into proof
/// `n + 1`, so a numeric id yields a numeric `previousProof`.
pub fn secure_document(
    suite: &CryptoSuite,
    document: &Document,
    chain_keys: &[KeyPair],
    shape: PreviousProofShape,
    proof_ids: &[ProofRef],
    options: &ProofOptions,
) -> Result<SecuredDocument> {
    let proof_ref = |index: usize| {
        proof_ids
            .get(index)
            .cloned()
            .unwrap_or_else(|| ProofRef::Id(format!("urn:proof:{}", index + 1)))
    };

    let mut chain = ProofChain::new(suite, document.clone());

    for (index, key_pair) in chain_keys.iter().enumerate() {
        let mut options = options.clone().with_id(proof_ref(index).to_string());

        if index > 0 {
            let previous = proof_ref(index - 1);
            options = options.with_previous_proof(match shape {
                PreviousProofShape::String => PreviousProof::One(previous),
                PreviousProofShape::Array => PreviousProof::Many(vec![previous]),
            });
        }

        chain.add_proof(key_pair, &options)?;
    }

    Ok(chain.finish())
}
