//! Structured output: shape descriptors and decoding
//!
//! Each call site that wants a record back names the shape it expects by
//! implementing `StructuredOutput`. Decoding is a tagged result; a response
//! that does not fit the shape is a `DecodeError`, never a default value.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name and JSON schema of an expected record shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: serde_json::Value,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// A record shape agreed between a call site and the model
pub trait StructuredOutput: DeserializeOwned + Send + 'static {
    fn schema() -> ResponseSchema;
}

/// The model's answer did not match the expected shape
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to decode '{schema}' response: {message}")]
pub struct DecodeError {
    pub schema: String,
    pub message: String,
}

impl DecodeError {
    pub fn new(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            message: message.into(),
        }
    }
}

/// Decode model text into `T`.
///
/// Models often wrap JSON in markdown fences or a sentence of prose, so the
/// outermost `{ ... }` span is decoded first. When that span does not fit,
/// each balanced object in the text is tried left to right.
pub fn decode_structured<T: StructuredOutput>(text: &str) -> Result<T, DecodeError> {
    let schema = T::schema();
    let json_str = extract_json(text)
        .ok_or_else(|| DecodeError::new(&schema.name, "no JSON object in response"))?;

    let error = match serde_json::from_str(json_str) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    json_objects(text)
        .find_map(|value| serde_json::from_value(value).ok())
        .ok_or_else(|| DecodeError::new(&schema.name, error.to_string()))
}

/// Extract JSON object from a string (handles markdown code blocks)
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;

    if start < end {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Objects that parse starting at each `{` in `text`
fn json_objects(text: &str) -> impl Iterator<Item = serde_json::Value> + '_ {
    text.match_indices('{').filter_map(|(start, _)| {
        serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<serde_json::Value>()
            .next()
            .and_then(Result::ok)
            .filter(serde_json::Value::is_object)
    })
}
