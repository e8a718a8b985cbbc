//! secp256k1 key pairs in the Multikey JSON format.

use crate::error::{Error, Result};
use data_integrity_multikey::{
    self as multikey, Codec, Multikey, extract_private_scalar, extract_x_only_public_key,
};
use rand::RngCore as _;
use secp256k1::{Secp256k1, XOnlyPublicKey};
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path};

pub use secp256k1::SecretKey;

/// Parity byte for the even-y lift of a BIP-340 x-only key
const EVEN_Y_PARITY: u8 = 0x02;

/// `did:key` URI scheme prefix
const DID_KEY_PREFIX: &str = "did:key:";

pub trait SecretKeyExt {
    /// Generate a new random secret key.
    fn generate() -> Self;
}

impl SecretKeyExt for SecretKey {
    fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        let mut bytes = [0; multikey::KEY_LEN];

        // Retry on out-of-range scalars
        loop {
            rng.fill_bytes(&mut bytes);
            if let Ok(secret_key) = Self::from_slice(&bytes) {
                return secret_key;
            }
        }
    }
}

/// A secp256k1 key pair, stored as a pair of base58btc multibase Multikeys.
///
/// The private key is `varint(0x1301) || scalar` and the public key is
/// `varint(0xe7) || 0x02 || x`, the even-y lift of the BIP-340 x-only key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    /// The public key
    pub public_key_multibase: String,
    /// The private key
    pub private_key_multibase: String,
}

impl KeyPair {
    /// Create a key pair from a secret key.
    pub fn from_secret_key(secret_key: &SecretKey) -> Self {
        let secp = Secp256k1::new();
        let (x_only, _parity) = secret_key.x_only_public_key(&secp);

        let mut public_bytes = Vec::with_capacity(1 + multikey::KEY_LEN);
        public_bytes.push(EVEN_Y_PARITY);
        public_bytes.extend_from_slice(&x_only.serialize());

        let public_key = Multikey::new(Codec::Secp256k1Pub, public_bytes);
        let private_key = Multikey::new(Codec::Secp256k1Priv, secret_key.secret_bytes().to_vec());

        Self {
            public_key_multibase: public_key.encode(),
            private_key_multibase: private_key.encode(),
        }
    }

    /// Generate a new random key pair.
    pub fn generate() -> Self {
        Self::from_secret_key(&SecretKey::generate())
    }

    /// Read a key pair from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_string(&content)
    }

    /// Parse a key pair from a JSON string.
    pub fn from_json_string(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the key pair as pretty JSON.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        Ok(())
    }

    /// The 32-byte private scalar (decoded bytes `[2..34]`).
    pub fn secret_scalar(&self) -> Result<[u8; multikey::KEY_LEN]> {
        let decoded = multikey::decode_multibase(&self.private_key_multibase)?;

        Ok(extract_private_scalar(&decoded)?)
    }

    /// The private scalar as a secp256k1 secret key.
    pub fn secret_key(&self) -> Result<SecretKey> {
        SecretKey::from_slice(&self.secret_scalar()?)
            .map_err(|e| Error::InvalidKeyMaterial(format!("private key: {e}")))
    }

    /// The 32-byte x-only public key (decoded bytes after the 3-byte prefix).
    pub fn x_only_public_key(&self) -> Result<[u8; multikey::KEY_LEN]> {
        let decoded = multikey::decode_multibase(&self.public_key_multibase)?;

        Ok(extract_x_only_public_key(&decoded)?)
    }

    /// The public key re-encoded as an x-only (`0x2561`) Multikey.
    pub fn x_only_multikey(&self) -> Result<String> {
        let x_only = self.x_only_public_key()?;

        Ok(Multikey::new(Codec::Secp256k1XOnly, x_only.to_vec()).encode())
    }

    /// `did:key:<publicKeyMultibase>#<publicKeyMultibase>`
    pub fn verification_method(&self) -> String {
        did_key_verification_method(&self.public_key_multibase)
    }

    /// Confirm that the public key belongs to the private scalar.
    pub fn check(&self) -> Result<()> {
        let secp = Secp256k1::new();
        let (derived, _parity) = self.secret_key()?.x_only_public_key(&secp);

        let stored = self.x_only_public_key()?;
        XOnlyPublicKey::from_slice(&stored)
            .map_err(|e| Error::InvalidKeyMaterial(format!("public key: {e}")))?;

        if derived.serialize() != stored {
            return Err(Error::InvalidKeyMaterial(
                "public key does not match private key".into(),
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key_multibase", &self.public_key_multibase)
            .field("private_key_multibase", &"<redacted>")
            .finish()
    }
}

/// Build the static `did:key` verification method URI for a public key.
pub fn did_key_verification_method(public_key_multibase: &str) -> String {
    format!("{DID_KEY_PREFIX}{public_key_multibase}#{public_key_multibase}")
}

/// Recover the x-only public key named by a verification method URI.
///
/// Only the fragment is decoded; the DID itself is not resolved.
pub fn public_key_from_verification_method(
    verification_method: &str,
) -> Result<[u8; multikey::KEY_LEN]> {
    let (_did, fragment) = verification_method
        .split_once('#')
        .ok_or_else(|| Error::InvalidVerificationMethod(verification_method.into()))?;

    if fragment.is_empty() {
        return Err(Error::InvalidVerificationMethod(verification_method.into()));
    }

    let key = Multikey::decode(fragment)?;

    Ok(key.x_only_public_key()?)
}
