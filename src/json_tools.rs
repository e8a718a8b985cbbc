use onlyerror::Error;
use serde_json::{Map, Value};
use std::fmt::Display;

#[derive(Error, Debug)]
pub enum Error {
    /// Unexpected JSON type
    #[error("Object key `{0}` was expected to be type `{1}`")]
    UnexpectedJsonType(String, ExpectedType),

    /// Missing object key
    #[error("Object key `{0}` does not exist")]
    JsonMissingElement(String),

    /// Expected a JSON object
    ExpectedJsonObject,
}

#[derive(Debug)]
pub enum ExpectedType {
    StringOrArray,
}

impl Display for ExpectedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpectedType::StringOrArray => write!(f, "String or Array"),
        }
    }
}

/// Returns the value as a JSON object map.
pub(crate) fn into_object(value: Value) -> Result<Map<String, Value>, Error> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::ExpectedJsonObject),
    }
}

/// Returns map[key] if it is a JSON-LD context: a string or an array of strings and objects.
pub(crate) fn context_from_object<'value>(
    map: &'value Map<String, Value>,
    key: &str,
) -> Result<&'value Value, Error> {
    let context = map
        .get(key)
        .ok_or_else(|| Error::JsonMissingElement(key.into()))?;

    match context {
        Value::String(_) => Ok(context),
        Value::Array(entries) if entries.iter().all(|e| e.is_string() || e.is_object()) => {
            Ok(context)
        }
        _ => Err(Error::UnexpectedJsonType(
            key.into(),
            ExpectedType::StringOrArray,
        )),
    }
}

/// Iterate a context as an ordered sequence; a lone string is a one-entry sequence.
pub(crate) fn context_entries(context: &Value) -> Vec<&Value> {
    match context {
        Value::Array(entries) => entries.iter().collect(),
        other => vec![other],
    }
}
