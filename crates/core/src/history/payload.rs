#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Version written into every stored payload envelope.
pub const PAYLOAD_FORMAT_VERSION: u16 = 1;

/// Serialized state of one object (or reference row) before or after a change.
#[derive(Clone, Debug, PartialEq)]
pub struct Payload(JsonValue);

/// Encoding a stored blob was found in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadFormat {
    /// `{"v": <version>, "data": <state>}`
    Envelope,
    /// Bare JSON text, as written before payloads were versioned.
    Legacy,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported payload format version {0}")]
    UnsupportedVersion(u16),
}

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    v: u16,
    data: &'a JsonValue,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EnvelopeIn {
    v: u16,
    data: JsonValue,
}

impl Payload {
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &JsonValue {
        &self.0
    }

    pub fn into_json(self) -> JsonValue {
        self.0
    }

    pub fn encode(&self) -> Result<Vec<u8>, PayloadError> {
        Ok(serde_json::to_vec(&EnvelopeOut {
            v: PAYLOAD_FORMAT_VERSION,
            data: &self.0,
        })?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        Self::decode_with_format(bytes).map(|(payload, _)| payload)
    }

    pub fn decode_with_format(bytes: &[u8]) -> Result<(Self, PayloadFormat), PayloadError> {
        if let Ok(envelope) = serde_json::from_slice::<EnvelopeIn>(bytes) {
            if envelope.v != PAYLOAD_FORMAT_VERSION {
                return Err(PayloadError::UnsupportedVersion(envelope.v));
            }
            return Ok((Self(envelope.data), PayloadFormat::Envelope));
        }
        let value = serde_json::from_slice::<JsonValue>(bytes)?;
        Ok((Self(value), PayloadFormat::Legacy))
    }
}

impl From<JsonValue> for Payload {
    fn from(value: JsonValue) -> Self {
        Self(value)
    }
}
