//! Stage Result Codec
//!
//! Wraps the serialized output of a stage so it can be handed to the next
//! invocation (inside a [`WorkflowState`](super::WorkflowState)) or back to
//! the caller once the workflow finishes.
//!
//! The payload is JSON and is buffered in full, so a result can be decoded
//! any number of times into whatever shape the consumer expects.

use std::fmt;
use std::io::{Cursor, Read};
use std::sync::Arc;

use serde::de::{self, DeserializeOwned, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::CodecError;

/// A lazily-decodable, serialized stage result.
///
/// Cloning is cheap: clones share the same buffered bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct StageResult {
    payload: Arc<[u8]>,
}

impl StageResult {
    /// Serializes `value` into a new result.
    ///
    /// Fails for values JSON cannot represent, such as maps keyed by
    /// non-string types.
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Self, CodecError> {
        let bytes = serde_json::to_vec(value).map_err(CodecError::Encode)?;
        Ok(Self::from_bytes(bytes))
    }

    /// Wraps an already-serialized payload, e.g. one read back from a store.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Arc::from(bytes.into()),
        }
    }

    /// Decodes the payload into `T`.
    ///
    /// The buffered bytes are left untouched, so repeated calls (with the
    /// same or different target types) all see the full payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        serde_json::from_slice(&self.payload).map_err(CodecError::Decode)
    }

    /// Returns a streaming reader over the payload.
    ///
    /// Each call starts from the beginning; reading never drains the result.
    pub fn reader(&self) -> impl Read + '_ {
        Cursor::new(&self.payload[..])
    }

    /// Raw serialized bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.payload.to_vec()
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Payload as text, if it is valid UTF-8 (always true for encoded results).
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

impl fmt::Debug for StageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(text) => f.debug_tuple("StageResult").field(&text).finish(),
            None => f
                .debug_tuple("StageResult")
                .field(&format_args!("<{} bytes>", self.len()))
                .finish(),
        }
    }
}

impl fmt::Display for StageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.payload))
    }
}

// Persisted as the JSON text itself so any serde format can carry it.
// Payloads that are not UTF-8 go out as bytes, which text formats write as
// a sequence of numbers; `visit_seq` reads those back.
impl Serialize for StageResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_str() {
            Some(text) => serializer.serialize_str(text),
            None => serializer.serialize_bytes(&self.payload),
        }
    }
}

impl<'de> Deserialize<'de> for StageResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PayloadVisitor;

        impl<'de> Visitor<'de> for PayloadVisitor {
            type Value = StageResult;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a serialized stage result")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(StageResult::from_bytes(v.as_bytes()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(StageResult::from_bytes(v))
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(StageResult::from_bytes(v))
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                Ok(StageResult::from_bytes(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                Ok(StageResult::from_bytes(bytes))
            }
        }

        deserializer.deserialize_any(PayloadVisitor)
    }
}
