use crate::json_tools;
use data_integrity_multikey as multikey;
use onlyerror::Error;
use serde_json::{Value, json};

// Errors defined by the Data Integrity and BIP340 cryptosuite specifications.
pub trait ProblemDetails {
    fn details(&self) -> Option<Value> {
        None
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    Io(#[from] std::io::Error),

    /// JSON parse error
    Json(#[from] serde_json::Error),

    /// JSON value error
    JsonValue(#[from] json_tools::Error),

    /// The multibase or multicodec encoding of a key or signature is invalid
    #[error("Invalid key encoding: {0}")]
    InvalidKeyEncoding(#[source] multikey::Error),

    /// Key material has the wrong length or is not a valid secp256k1 key
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// A canonicalizer rejected its input
    #[error("Canonicalization failed: {0}")]
    Canonicalization(String),

    /// `previousProof` names an id that is not in the proof set
    #[error("Missing proof for id = {0}")]
    MissingProofReference(String),

    /// `previousProof` entry is not a string (strict resolution only)
    #[error("previousProof entry `{0}` is not a string")]
    InvalidProofReference(String),

    /// Two proofs in one proof set share an id
    #[error("Duplicate proof id `{0}`")]
    DuplicateProofId(String),

    /// Unsupported cryptographic suite
    #[error("Unsupported cryptographic suite: {0}")]
    UnsupportedCryptoSuite(String),

    /// Secured document does not contain a proof
    MissingProof,

    /// Secured document holds a proof set where a single proof was expected
    UnexpectedProofSet,

    /// Invalid document
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Invalid proofValue
    #[error("Invalid proofValue: {0}")]
    InvalidProofValue(String),

    /// Invalid verificationMethod
    #[error("Invalid verificationMethod `{0}`")]
    InvalidVerificationMethod(String),
}

impl From<multikey::Error> for Error {
    fn from(err: multikey::Error) -> Self {
        match err {
            multikey::Error::KeyLength(..) | multikey::Error::WrongCodec(..) => {
                Self::InvalidKeyMaterial(err.to_string())
            }
            _ => Self::InvalidKeyEncoding(err),
        }
    }
}

impl Error {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO_FAILURE",
            Self::Json(_) | Self::JsonValue(_) | Self::InvalidDocument(_) => "INVALID_DOCUMENT",
            Self::InvalidKeyEncoding(_) => "INVALID_KEY_ENCODING",
            Self::InvalidKeyMaterial(_) => "INVALID_KEY_MATERIAL",
            Self::Canonicalization(_) => "CANONICALIZATION_FAILURE",
            Self::MissingProofReference(_) => "MISSING_PROOF_REFERENCE",
            Self::InvalidProofReference(_) => "INVALID_PROOF_REFERENCE",
            Self::DuplicateProofId(_) => "DUPLICATE_PROOF_ID",
            Self::UnsupportedCryptoSuite(_) => "UNSUPPORTED_CRYPTOSUITE",
            Self::MissingProof | Self::UnexpectedProofSet => "PROOF_VERIFICATION_ERROR",
            Self::InvalidProofValue(_) => "INVALID_PROOF_VALUE",
            Self::InvalidVerificationMethod(_) => "INVALID_VERIFICATION_METHOD",
        }
    }
}

impl ProblemDetails for Error {
    fn details(&self) -> Option<Value> {
        Some(json!({
            "type": format!("https://w3id.org/security#{}", self.code()),
            "title": self.to_string(),
        }))
    }
}

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;
