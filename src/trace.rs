//! Intermediate values of a signing run, for test vectors and debugging.

use crate::document::SecuredDocument;
use crate::error::Result;
use crate::hash::HashData;
use crate::proof::CryptoSuiteName;
use data_integrity_multikey as multikey;
use secp256k1::constants::SCHNORR_SIGNATURE_SIZE;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Every intermediate value produced while creating one proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofTrace {
    pub cryptosuite: CryptoSuiteName,
    /// Canonical form of the document that was signed
    pub canonical_document: String,
    /// The proof configuration as pretty JSON, including `@context`
    pub proof_config: String,
    pub canonical_proof_config: String,
    pub hash_data: HashData,
    pub aux_randomness: [u8; 32],
    pub signature: [u8; SCHNORR_SIGNATURE_SIZE],
}

impl ProofTrace {
    pub fn signature_hex(&self) -> String {
        hex::encode(self.signature)
    }

    pub fn signature_multibase(&self) -> String {
        multikey::encode_multibase(&self.signature)
    }

    /// Write each value to its own file in `dir`, plus the signed document.
    ///
    /// File names carry a per-suite suffix: `canonDocDataInt.txt` for RDFC,
    /// `canonDocJCS.txt` for JCS, and so on.
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P, signed: &SecuredDocument) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let (suffix, final_hash) = match self.cryptosuite {
            CryptoSuiteName::Rdfc => ("DataInt", "finalHash"),
            CryptoSuiteName::Jcs => ("JCS", "hashData"),
        };

        let hash_data = &self.hash_data;
        let files = [
            ("canonDoc", "txt", self.canonical_document.clone()),
            ("docHash", "txt", hash_data.document_hash.to_string()),
            ("proofConfig", "json", self.proof_config.clone()),
            ("proofCanon", "txt", self.canonical_proof_config.clone()),
            ("proofHash", "txt", hash_data.proof_hash.to_string()),
            ("combinedHash", "txt", hex::encode(hash_data.combined())),
            (final_hash, "txt", hash_data.message.to_string()),
            ("randomAuxHex", "txt", hex::encode_upper(self.aux_randomness)),
            ("sigHex", "txt", self.signature_hex()),
            ("sigBTC58", "txt", self.signature_multibase()),
            ("signed", "json", signed.to_json_string()?),
        ];

        for (stem, extension, content) in files {
            let path = dir.join(format!("{stem}{suffix}.{extension}"));
            debug!(path = %path.display(), "writing artifact");
            fs::write(path, content)?;
        }

        Ok(())
    }
}
