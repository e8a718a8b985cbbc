//! BIP-340 Schnorr signing and verification.

use crate::error::{Error, Result};
use rand::RngCore as _;
use secp256k1::constants::{MESSAGE_SIZE, SCHNORR_SIGNATURE_SIZE, SECRET_KEY_SIZE};
use secp256k1::schnorr::Signature;
use secp256k1::{Keypair, Secp256k1, SecretKey, XOnlyPublicKey};

/// Auxiliary randomness fed to BIP-340 signing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuxRandomness {
    /// Fresh bytes from the operating system for every signature
    #[default]
    Secure,

    /// Caller-supplied bytes; signatures become reproducible
    Fixed([u8; 32]),
}

impl AuxRandomness {
    /// The all-`0xFF` value used by the published test fixtures.
    ///
    /// Test-fixture only. Never use this for real signatures.
    pub fn fixture() -> Self {
        Self::Fixed([0xFF; 32])
    }

    /// Resolve to the 32 bytes handed to the signer.
    pub fn bytes(&self) -> [u8; 32] {
        match self {
            Self::Secure => {
                let mut bytes = [0; 32];
                rand::rngs::OsRng.fill_bytes(&mut bytes);
                bytes
            }
            Self::Fixed(bytes) => *bytes,
        }
    }
}

/// Sign a 32-byte message with BIP-340 Schnorr
pub fn bip340_sign(
    message: &[u8; MESSAGE_SIZE],
    private_key_bytes: &[u8; SECRET_KEY_SIZE],
    aux_randomness: &[u8; 32],
) -> Result<[u8; SCHNORR_SIGNATURE_SIZE]> {
    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(private_key_bytes)
        .map_err(|e| Error::InvalidKeyMaterial(format!("Invalid secret key: {e}")))?;

    let keypair = Keypair::from_secret_key(&secp, &secret_key);
    let signature = secp.sign_schnorr_with_aux_rand(message, &keypair, aux_randomness);

    Ok(signature.serialize())
}

/// Verify a BIP-340 Schnorr signature.
///
/// A signature that does not match is `Ok(false)`. Only unusable key bytes are errors.
pub fn bip340_verify(
    signature: &[u8; SCHNORR_SIGNATURE_SIZE],
    message: &[u8; MESSAGE_SIZE],
    x_only_public_key: &[u8; 32],
) -> Result<bool> {
    let secp = Secp256k1::verification_only();
    let public_key = XOnlyPublicKey::from_slice(x_only_public_key)
        .map_err(|e| Error::InvalidKeyMaterial(format!("Invalid public key: {e}")))?;

    let Ok(signature) = Signature::from_slice(signature) else {
        return Ok(false);
    };

    Ok(secp
        .verify_schnorr(&signature, message, &public_key)
        .is_ok())
}
