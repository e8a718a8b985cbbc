use crate::chain::ProofSet;
use crate::error::{Error, Result};
use crate::json_tools::{context_from_object, into_object};
use crate::proof::Proof;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

const CONTEXT: &str = "@context";
const PROOF: &str = "proof";

/// An unsecured JSON-LD document.
///
/// Always carries an `@context` and never carries a `proof`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    /// The document data as a JSON object
    data: Map<String, Value>,
}

impl Document {
    /// Read a document from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_string(&content)
    }

    /// Parse a document from a JSON string.
    pub fn from_json_string(json: &str) -> Result<Self> {
        Self::from_json_value(serde_json::from_str(json)?)
    }

    /// Create a document from a JSON value.
    pub fn from_json_value(value: Value) -> Result<Self> {
        let data = into_object(value)?;
        context_from_object(&data, CONTEXT)?;

        if data.contains_key(PROOF) {
            return Err(Error::InvalidDocument(
                "unsecured document must not contain a proof".into(),
            ));
        }

        Ok(Self { data })
    }

    /// The `@context` value, a string or an array.
    pub fn context(&self) -> &Value {
        // Presence is checked on construction
        &self.data[CONTEXT]
    }

    /// A copy of this document with its `@context` replaced.
    pub fn with_context(&self, context: Value) -> Self {
        let mut data = self.data.clone();
        data.insert(CONTEXT.into(), context);

        Self { data }
    }

    pub fn get_data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone())
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.data)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// The JSON that is canonicalized when signing.
    ///
    /// Previous proofs in a chain are embedded as the `proof` array.
    pub(crate) fn signing_value(&self, previous: &[&Proof]) -> Result<Value> {
        let mut data = self.data.clone();

        if !previous.is_empty() {
            let proofs = previous
                .iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            data.insert(PROOF.into(), Value::Array(proofs));
        }

        Ok(Value::Object(data))
    }

    /// Attach a proof or proof set.
    pub fn secure(self, proof: ProofField) -> SecuredDocument {
        SecuredDocument {
            document: self,
            proof,
        }
    }
}

/// The `proof` member of a secured document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProofField {
    Single(Proof),
    Set(Vec<Proof>),
}

impl ProofField {
    pub fn as_slice(&self) -> &[Proof] {
        match self {
            Self::Single(proof) => std::slice::from_ref(proof),
            Self::Set(proofs) => proofs,
        }
    }
}

/// A document with one or more attached proofs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecuredDocument {
    document: Document,
    proof: ProofField,
}

impl SecuredDocument {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_string(&content)
    }

    pub fn from_json_string(json: &str) -> Result<Self> {
        Self::from_json_value(serde_json::from_str(json)?)
    }

    /// Split a secured JSON document into its unsecured document and proofs.
    pub fn from_json_value(value: Value) -> Result<Self> {
        let mut data = into_object(value)?;
        let proof = data.remove(PROOF).ok_or(Error::MissingProof)?;
        let proof = match serde_json::from_value::<ProofField>(proof)
            .map_err(|e| Error::InvalidDocument(format!("malformed proof: {e}")))?
        {
            ProofField::Set(proofs) => ProofField::Set(ProofSet::try_from(proofs)?.into_vec()),
            single => single,
        };

        Ok(Self {
            document: Document::from_json_value(Value::Object(data))?,
            proof,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn proof(&self) -> &ProofField {
        &self.proof
    }

    pub fn proofs(&self) -> &[Proof] {
        self.proof.as_slice()
    }

    /// The proof of a document secured with exactly one proof.
    pub fn single_proof(&self) -> Result<&Proof> {
        match &self.proof {
            ProofField::Single(proof) => Ok(proof),
            ProofField::Set(_) => Err(Error::UnexpectedProofSet),
        }
    }

    pub fn into_parts(self) -> (Document, ProofField) {
        (self.document, self.proof)
    }

    pub fn to_value(&self) -> Result<Value> {
        let mut data = self.document.data.clone();
        data.insert(PROOF.into(), serde_json::to_value(&self.proof)?);

        Ok(Value::Object(data))
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value()?)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_tools;
    use serde_json::json;

    fn secured_json() -> Value {
        json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "name": "x",
            "proof": {
                "type": "DataIntegrityProof",
                "cryptosuite": "bip340-rdfc-2025",
                "created": "2023-02-24T23:36:38Z",
                "verificationMethod": "did:key:zQ3s#zQ3s",
                "proofPurpose": "assertionMethod",
                "proofValue": "z5"
            }
        })
    }

    #[test]
    fn test_document_serialization() {
        let doc = Document::from_json_string(
            r#"{"@context": "https://www.w3.org/ns/credentials/v2", "myWebsite": "https://hello.world.example/"}"#,
        )
        .unwrap();
        let json = doc.to_json_string().unwrap();
        let doc2 = Document::from_json_string(&json).unwrap();

        assert_eq!(doc, doc2);
        assert_eq!(doc.get("myWebsite"), doc2.get("myWebsite"));
    }

    #[test]
    fn test_document_requires_context() {
        assert!(matches!(
            Document::from_json_value(json!({"name": "x"})),
            Err(Error::JsonValue(json_tools::Error::JsonMissingElement(_)))
        ));
        assert!(matches!(
            Document::from_json_value(json!({"@context": 5})),
            Err(Error::JsonValue(_))
        ));
        assert!(matches!(
            Document::from_json_value(json!(["@context"])),
            Err(Error::JsonValue(json_tools::Error::ExpectedJsonObject))
        ));
    }

    #[test]
    fn test_document_rejects_proof() {
        assert!(matches!(
            Document::from_json_value(secured_json()),
            Err(Error::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_secured_document_split() {
        let secured = SecuredDocument::from_json_value(secured_json()).unwrap();

        assert!(secured.document().get(PROOF).is_none());
        assert_eq!(secured.proofs().len(), 1);
        assert!(secured.single_proof().is_ok());
        assert_eq!(secured.to_value().unwrap(), secured_json());
    }

    #[test]
    fn test_secured_document_proof_set() {
        let mut value = secured_json();
        let proof = value["proof"].take();
        value["proof"] = json!([proof.clone(), proof]);

        let secured = SecuredDocument::from_json_value(value).unwrap();
        assert_eq!(secured.proofs().len(), 2);
        assert!(matches!(
            secured.single_proof(),
            Err(Error::UnexpectedProofSet)
        ));
    }

    #[test]
    fn test_secured_document_rejects_duplicate_proof_ids() {
        let mut value = secured_json();
        let mut proof = value["proof"].take();
        proof["id"] = json!("urn:proof:1");
        value["proof"] = json!([proof.clone(), proof]);

        assert!(matches!(
            SecuredDocument::from_json_value(value),
            Err(Error::DuplicateProofId(id)) if id == "urn:proof:1"
        ));
    }

    #[test]
    fn test_secured_document_without_proof() {
        assert!(matches!(
            SecuredDocument::from_json_value(json!({"@context": "https://a.example/"})),
            Err(Error::MissingProof)
        ));
    }

    #[test]
    fn test_signing_value_embeds_previous_proofs() {
        let secured = SecuredDocument::from_json_value(secured_json()).unwrap();
        let proof = secured.single_proof().unwrap();

        let plain = secured.document().signing_value(&[]).unwrap();
        assert!(plain.get(PROOF).is_none());

        let chained = secured.document().signing_value(&[proof]).unwrap();
        assert_eq!(chained[PROOF], json!([secured_json()["proof"]]));
    }
}
