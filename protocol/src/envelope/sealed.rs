//! The transmissible output of [`seal`](super::HybridEnvelope::seal).
//!
//! On its own a `SealedEnvelope` is just two byte strings. How they travel
//! is the transport's business; this module offers two encodings for
//! callers that don't want to invent one:
//!
//! - JSON, with both fields hex-encoded:
//!   `{"wrapped_key":"9f3a...","ciphertext":"0c11..."}`
//! - bincode, with both fields as length-prefixed raw bytes.
//!
//! Neither encoding carries a version or algorithm tag.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::EnvelopeError;

/// `{wrapped_key, ciphertext}` where `ciphertext = iv || blocks`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEnvelope {
    /// The per-message symmetric key, encrypted to the recipient's public key.
    #[serde(with = "hex_bytes")]
    pub wrapped_key: Vec<u8>,

    /// The payload, encrypted under the symmetric key, IV first.
    #[serde(with = "hex_bytes")]
    pub ciphertext: Vec<u8>,
}

impl SealedEnvelope {
    pub fn new(wrapped_key: Vec<u8>, ciphertext: Vec<u8>) -> Self {
        Self {
            wrapped_key,
            ciphertext,
        }
    }

    /// Encode as JSON with hex fields.
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(|e| EnvelopeError::Encoding(e.to_string()))
    }

    /// Decode from the JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(json).map_err(|e| EnvelopeError::Encoding(e.to_string()))
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        bincode::serialize(self).map_err(|e| EnvelopeError::Encoding(e.to_string()))
    }

    /// Decode from the bytes produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        bincode::deserialize(bytes).map_err(|e| EnvelopeError::Encoding(e.to_string()))
    }
}

impl fmt::Debug for SealedEnvelope {
    // Ciphertexts can be megabytes. Lengths are enough for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedEnvelope")
            .field("wrapped_key_len", &self.wrapped_key.len())
            .field("ciphertext_len", &self.ciphertext.len())
            .finish()
    }
}

/// Hex strings for human-readable formats, raw bytes for binary ones.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            bytes.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(s).map_err(serde::de::Error::custom)
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}
