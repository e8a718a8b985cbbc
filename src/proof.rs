use crate::error::{Error, Result};
use crate::schnorr::AuxRandomness;
use chrono::{DateTime, SecondsFormat, Utc};
use data_integrity_multikey as multikey;
use secp256k1::constants::SCHNORR_SIGNATURE_SIZE;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::{fmt, str::FromStr};

/// Types of proofs supported by the library
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofType {
    /// General Data Integrity Proof
    #[default]
    DataIntegrityProof,
}

impl fmt::Display for ProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataIntegrityProof")
    }
}

/// Purposes for cryptographic proofs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    /// Authentication of entity identified by a DID
    Authentication,
    /// Assertion method for making verifiable claims
    #[default]
    AssertionMethod,
    /// Capability invocation
    CapabilityInvocation,
    /// Capability delegation
    CapabilityDelegation,
    /// Other purposes
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for ProofPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofPurpose::Authentication => f.write_str("authentication"),
            ProofPurpose::AssertionMethod => f.write_str("assertionMethod"),
            ProofPurpose::CapabilityInvocation => f.write_str("capabilityInvocation"),
            ProofPurpose::CapabilityDelegation => f.write_str("capabilityDelegation"),
            ProofPurpose::Other(s) => f.write_str(s),
        }
    }
}

/// Cryptosuite identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum CryptoSuiteName {
    #[serde(rename = "bip340-jcs-2025")]
    Jcs,

    #[serde(rename = "bip340-rdfc-2025")]
    Rdfc,
}

impl CryptoSuiteName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jcs => "bip340-jcs-2025",
            Self::Rdfc => "bip340-rdfc-2025",
        }
    }
}

impl fmt::Display for CryptoSuiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CryptoSuiteName {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "bip340-jcs-2025" => Ok(Self::Jcs),
            "bip340-rdfc-2025" => Ok(Self::Rdfc),
            _ => Err(Error::UnsupportedCryptoSuite(name.into())),
        }
    }
}

/// A single `previousProof` reference.
///
/// References are expected to be proof ids, but numbers are accepted on input so
/// that malformed chains can be represented and rejected explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProofRef {
    Id(String),
    Number(Number),
}

impl ProofRef {
    /// The reference as a proof id, if it is a string.
    pub fn as_id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for ProofRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => f.write_str(id),
            // Integral floats print without a fractional part
            Self::Number(n) => match n.as_f64() {
                Some(float) if n.is_f64() => write!(f, "{float}"),
                _ => write!(f, "{n}"),
            },
        }
    }
}

impl From<&str> for ProofRef {
    fn from(id: &str) -> Self {
        Self::Id(id.into())
    }
}

/// Previous proof ID or array of IDs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreviousProof {
    One(ProofRef),
    Many(Vec<ProofRef>),
}

impl PreviousProof {
    /// References in declaration order.
    pub fn refs(&self) -> &[ProofRef] {
        match self {
            Self::One(one) => std::slice::from_ref(one),
            Self::Many(many) => many,
        }
    }
}

/// Proof configuration: every proof field except `proofValue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofConfig {
    /// Optional identifier for the proof
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Type of proof
    #[serde(rename = "type")]
    pub proof_type: ProofType,

    /// Cryptographic suite used for the proof
    pub cryptosuite: CryptoSuiteName,

    /// When the proof was created (XML Schema dateTime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// Verification method that can be used to verify the proof
    pub verification_method: String,

    /// Purpose of the proof
    pub proof_purpose: ProofPurpose,

    /// When the proof expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,

    /// Security domain for the proof
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Challenge to prevent replay attacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,

    /// Random value to increase privacy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Previous proof ID or array of IDs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_proof: Option<PreviousProof>,

    /// Optional JSON-LD context
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

/// `proofValue`: multibase base58btc encoding of a 64-byte BIP-340 signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofValue(pub String);

impl ProofValue {
    pub fn from_signature(signature: &[u8; SCHNORR_SIGNATURE_SIZE]) -> Self {
        Self(multikey::encode_multibase(signature))
    }

    /// Decode the signature bytes.
    pub fn signature(&self) -> Result<[u8; SCHNORR_SIGNATURE_SIZE]> {
        let bytes = multikey::decode_multibase(&self.0)
            .map_err(|e| Error::InvalidProofValue(e.to_string()))?;

        bytes.as_slice().try_into().map_err(|_| {
            Error::InvalidProofValue(format!(
                "expected {SCHNORR_SIGNATURE_SIZE} signature bytes, found {}",
                bytes.len()
            ))
        })
    }
}

impl fmt::Display for ProofValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Represents a cryptographic proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(flatten)]
    pub config: ProofConfig,

    /// Proof value (encoded binary data)
    pub proof_value: ProofValue,
}

impl Proof {
    pub fn from_config(config: ProofConfig, proof_value: ProofValue) -> Self {
        Self {
            config,
            proof_value,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.config.id.as_deref()
    }

    pub fn previous_proof(&self) -> Option<&PreviousProof> {
        self.config.previous_proof.as_ref()
    }
}

/// Options for creating a proof
#[derive(Debug, Clone, Default)]
pub struct ProofOptions {
    pub(crate) created: Option<DateTime<Utc>>,
    pub(crate) proof_purpose: ProofPurpose,
    pub(crate) id: Option<String>,
    pub(crate) previous_proof: Option<PreviousProof>,
    pub(crate) expires: Option<String>,
    pub(crate) domain: Option<String>,
    pub(crate) challenge: Option<String>,
    pub(crate) nonce: Option<String>,
    pub(crate) aux_randomness: AuxRandomness,
}

impl ProofOptions {
    /// Create proof options with the defaults: created now, `assertionMethod`, OS randomness.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the creation time (defaults to now)
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Set the proof purpose
    pub fn with_proof_purpose(mut self, purpose: ProofPurpose) -> Self {
        self.proof_purpose = purpose;
        self
    }

    /// Set the proof id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the previous proof reference(s)
    pub fn with_previous_proof(mut self, previous_proof: PreviousProof) -> Self {
        self.previous_proof = Some(previous_proof);
        self
    }

    /// Set the expiration time
    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(format_datetime(&expires));
        self
    }

    /// Set the security domain
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the challenge
    pub fn with_challenge(mut self, challenge: impl Into<String>) -> Self {
        self.challenge = Some(challenge.into());
        self
    }

    /// Set the nonce
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Set the BIP-340 auxiliary randomness source
    pub fn with_aux_randomness(mut self, aux_randomness: AuxRandomness) -> Self {
        self.aux_randomness = aux_randomness;
        self
    }

    pub(crate) fn to_proof_config(
        &self,
        cryptosuite: CryptoSuiteName,
        verification_method: String,
    ) -> ProofConfig {
        let created = self.created.unwrap_or_else(Utc::now);

        ProofConfig {
            id: self.id.clone(),
            proof_type: ProofType::DataIntegrityProof,
            cryptosuite,
            created: Some(format_datetime(&created)),
            verification_method,
            proof_purpose: self.proof_purpose.clone(),
            expires: self.expires.clone(),
            domain: self.domain.clone(),
            challenge: self.challenge.clone(),
            nonce: self.nonce.clone(),
            previous_proof: self.previous_proof.clone(),
            context: None,
        }
    }
}

/// XML Schema dateTime in UTC with second precision, e.g. `2023-02-24T23:36:38Z`.
fn format_datetime(datetime: &DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_proof_round_trips_through_json() {
        let value = json!({
            "id": "urn:proof:2",
            "type": "DataIntegrityProof",
            "cryptosuite": "bip340-jcs-2025",
            "created": "2023-02-24T23:36:38Z",
            "verificationMethod": "did:key:zQ3s#zQ3s",
            "proofPurpose": "assertionMethod",
            "previousProof": ["urn:proof:1"],
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "proofValue": "z3yZ"
        });

        let proof: Proof = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(proof.id(), Some("urn:proof:2"));
        assert_eq!(proof.config.cryptosuite, CryptoSuiteName::Jcs);
        assert_eq!(
            proof.previous_proof().unwrap().refs(),
            &[ProofRef::from("urn:proof:1")]
        );

        assert_eq!(serde_json::to_value(&proof).unwrap(), value);
    }

    #[test]
    fn test_numeric_previous_proof() {
        let previous: PreviousProof = serde_json::from_value(json!(456321)).unwrap();
        let refs = previous.refs();

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].as_id(), None);
        assert_eq!(refs[0].to_string(), "456321");
    }

    #[test]
    fn test_float_previous_proof_formatting() {
        let previous: PreviousProof = serde_json::from_str("[1e3, 2.5, 7]").unwrap();
        let refs: Vec<String> = previous.refs().iter().map(ToString::to_string).collect();

        assert_eq!(refs, ["1000", "2.5", "7"]);
    }

    #[test]
    fn test_custom_proof_purpose() {
        let purpose: ProofPurpose = serde_json::from_value(json!("customPurpose")).unwrap();
        assert_eq!(purpose, ProofPurpose::Other("customPurpose".into()));
        assert_eq!(purpose.to_string(), "customPurpose");
    }

    #[test]
    fn test_unknown_cryptosuite() {
        assert!(matches!(
            "ecdsa-rdfc-2019".parse::<CryptoSuiteName>(),
            Err(Error::UnsupportedCryptoSuite(_))
        ));
        assert_eq!(
            "bip340-rdfc-2025".parse::<CryptoSuiteName>().unwrap(),
            CryptoSuiteName::Rdfc
        );
    }

    #[test]
    fn test_created_format() {
        let created = DateTime::parse_from_rfc3339("2023-02-24T23:36:38Z")
            .unwrap()
            .with_timezone(&Utc);
        let config = ProofOptions::new()
            .with_created(created)
            .to_proof_config(CryptoSuiteName::Rdfc, "did:key:z#z".into());

        assert_eq!(config.created.as_deref(), Some("2023-02-24T23:36:38Z"));
        assert_eq!(config.proof_purpose, ProofPurpose::AssertionMethod);
    }

    #[test]
    fn test_proof_value_length() {
        let value = ProofValue(multikey::encode_multibase(&[1; 63]));
        assert!(matches!(
            value.signature(),
            Err(Error::InvalidProofValue(_))
        ));

        let signature = [7; SCHNORR_SIGNATURE_SIZE];
        assert_eq!(
            ProofValue::from_signature(&signature).signature().unwrap(),
            signature
        );
    }
}
