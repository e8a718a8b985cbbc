//! Shared fixtures for unit and scenario tests.

use crate::canonicalize::{
    ContextLoader, RdfNormalizer, RdfcCanonicalizer, StaticContextLoader, inline_contexts,
};
use crate::error::Result;
use crate::{Document, KeyPair, ProofOptions, SecretKey};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

pub(crate) const CREDENTIALS_V2: &str = "https://www.w3.org/ns/credentials/v2";

pub(crate) const FIXTURE_CREATED: &str = "2023-02-24T23:36:38Z";

/// A reduced stand-in for the credentials v2 context with the terms the tests use.
pub(crate) fn credentials_v2_context() -> Value {
    json!({
        "@context": {
            "@protected": true,
            "id": "@id",
            "type": "@type",
            "name": "https://schema.org/name",
            "description": "https://schema.org/description",
            "issuer": {"@id": "https://www.w3.org/2018/credentials#issuer", "@type": "@id"},
            "validFrom": "https://www.w3.org/2018/credentials#validFrom",
            "credentialSubject": "https://www.w3.org/2018/credentials#credentialSubject",
            "DataIntegrityProof": "https://w3id.org/security#DataIntegrityProof",
            "cryptosuite": "https://w3id.org/security#cryptosuite",
            "created": "http://purl.org/dc/terms/created",
            "verificationMethod": "https://w3id.org/security#verificationMethod",
            "proofPurpose": "https://w3id.org/security#proofPurpose",
            "previousProof": "https://w3id.org/security#previousProof",
            "proof": "https://w3id.org/security#proof"
        }
    })
}

pub(crate) fn test_loader() -> StaticContextLoader {
    StaticContextLoader::new().with_context(CREDENTIALS_V2, credentials_v2_context())
}

/// Deterministic stand-in for an RDF normalizer.
///
/// Emits one statement per top-level member, with the predicate expanded
/// through the inlined context, sorted in code point order. Enough structure
/// to exercise ordering, context dependence and tamper sensitivity.
pub(crate) struct TestNormalizer;

impl RdfNormalizer for TestNormalizer {
    fn normalize(&self, document: &Value, loader: &dyn ContextLoader) -> Result<String> {
        let inlined = inline_contexts(document, loader)?;

        let mut terms = Map::new();
        for entry in crate::json_tools::context_entries(&inlined["@context"]) {
            if let Value::Object(definitions) = entry {
                terms.extend(definitions.clone());
            }
        }

        let mut statements = Vec::new();
        if let Value::Object(members) = &inlined {
            for (key, value) in members.iter().filter(|(key, _)| *key != "@context") {
                let predicate = match terms.get(key) {
                    Some(Value::String(iri)) => iri.clone(),
                    Some(Value::Object(definition)) => definition["@id"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string(),
                    _ => format!("urn:undefined:{key}"),
                };
                let object = serde_jcs::to_string(value).unwrap_or_default();

                statements.push(format!("_:c14n0 <{predicate}> {object} .\n"));
            }
        }

        statements.sort();

        Ok(statements.concat())
    }
}

pub(crate) fn rdfc_canonicalizer() -> RdfcCanonicalizer {
    RdfcCanonicalizer::new(TestNormalizer, test_loader())
}

pub(crate) fn test_document() -> Document {
    Document::from_json_value(json!({
        "@context": [
            CREDENTIALS_V2,
            {"myWebsite": "https://vocabulary.example/myWebsite"}
        ],
        "myWebsite": "https://hello.world.example/"
    }))
    .unwrap()
}

pub(crate) fn fixed_key_pair() -> KeyPair {
    KeyPair::from_secret_key(&SecretKey::from_slice(&[0x5a; 32]).unwrap())
}

pub(crate) fn fixture_created() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXTURE_CREATED)
        .unwrap()
        .with_timezone(&Utc)
}

pub(crate) fn fixture_options() -> ProofOptions {
    ProofOptions::new()
        .with_created(fixture_created())
        .with_aux_randomness(crate::AuxRandomness::fixture())
}
