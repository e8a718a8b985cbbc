//! Data Integrity proofs with BIP-340 Schnorr signatures over secp256k1.
//!
//! Implements the `bip340-rdfc-2025` and `bip340-jcs-2025` cryptosuites: a document is
//! canonicalized, hashed together with its canonical proof configuration, and signed.
//!
//! ```no_run
//! use data_integrity_bip340::{CryptoSuite, Document, KeyPair, ProofOptions, VerifyOptions};
//!
//! # fn main() -> data_integrity_bip340::error::Result<()> {
//! let document = Document::from_file("unsigned.json")?;
//! let key_pair = KeyPair::from_file("keyPair.json")?;
//!
//! let suite = CryptoSuite::jcs();
//! let secured = suite.create_proof(&document, &key_pair, &ProofOptions::new())?;
//! let result = suite.verify_proof(&secured, &VerifyOptions::new())?;
//! assert!(result.verified);
//! # Ok(())
//! # }
//! ```
//!
//! RDF canonicalization is delegated to an [`RdfNormalizer`] supplied by the caller,
//! with remote contexts served by a [`ContextLoader`].

pub mod canonicalize;
pub mod chain;
pub mod context;
pub mod cryptosuite;
pub mod document;
pub mod error;
pub mod hash;
pub mod key;
pub mod proof;
pub mod schnorr;
pub mod trace;
pub mod verification;

mod json_tools;

#[cfg(test)]
mod test_support;

pub use canonicalize::{
    Canonicalizer, ContextLoader, JcsCanonicalizer, RdfNormalizer, RdfcCanonicalizer,
    StaticContextLoader,
};
pub use chain::{ChainFixture, PreviousProofShape, ProofChain, ProofSet, ReferencePolicy};
pub use context::{ContextMismatch, ContextPolicy, Reconciliation};
pub use cryptosuite::{CryptoSuite, instantiate_cryptosuite};
pub use document::{Document, ProofField, SecuredDocument};
pub use error::{Error, ProblemDetails};
pub use key::{KeyPair, SecretKey};
pub use proof::{CryptoSuiteName, PreviousProof, Proof, ProofOptions, ProofPurpose, ProofRef};
pub use schnorr::AuxRandomness;
pub use trace::ProofTrace;
pub use verification::{
    ProofSetVerification, VerificationFailure, VerificationResult, VerifyOptions,
};
