use sha2::{Digest, Sha256};
use std::fmt;

/// A SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Hash(pub [u8; 32]);

impl Sha256Hash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sha256Hash").field(&hex::encode(self.0)).finish()
    }
}

/// Hash data using SHA-256
pub fn hash_sha256(data: impl AsRef<[u8]>) -> Sha256Hash {
    Sha256Hash(Sha256::digest(data).into())
}

/// The digests that make up a signing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashData {
    /// SHA-256 of the canonical proof configuration
    pub proof_hash: Sha256Hash,
    /// SHA-256 of the canonical document
    pub document_hash: Sha256Hash,
    /// SHA-256 of `proof_hash || document_hash`; the message that is signed
    pub message: Sha256Hash,
}

impl HashData {
    /// `SHA256(SHA256(canonical_proof_config) || SHA256(transformed_document))`
    pub fn combine(transformed_document: &str, canonical_proof_config: &str) -> Self {
        let proof_hash = hash_sha256(canonical_proof_config);
        let document_hash = hash_sha256(transformed_document);

        let mut hasher = Sha256::new();
        hasher.update(proof_hash.0);
        hasher.update(document_hash.0);
        let message = Sha256Hash(hasher.finalize().into());

        Self {
            proof_hash,
            document_hash,
            message,
        }
    }

    /// The 64-byte concatenation `proof_hash || document_hash`.
    pub fn combined(&self) -> [u8; 64] {
        let mut combined = [0; 64];
        combined[..32].copy_from_slice(&self.proof_hash.0);
        combined[32..].copy_from_slice(&self.document_hash.0);
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            hash_sha256("").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_combine_composition() {
        let hash_data = HashData::combine("document", "config");

        assert_eq!(hash_data.proof_hash, hash_sha256("config"));
        assert_eq!(hash_data.document_hash, hash_sha256("document"));
        assert_eq!(hash_data.message, hash_sha256(hash_data.combined()));
        assert_eq!(&hash_data.combined()[..32], hash_sha256("config").as_bytes());
    }

    #[test]
    fn test_combine_is_ordered() {
        let a = HashData::combine("x", "y");
        let b = HashData::combine("y", "x");

        assert_ne!(a.message, b.message);
    }

    #[test]
    fn test_combine_is_not_plain_concatenation() {
        let hash_data = HashData::combine("document", "config");

        assert_ne!(hash_data.message, hash_sha256("configdocument"));
    }
}
