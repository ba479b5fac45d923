//! CBOR and JSON codecs for live events.
//!
//! Binary frames carry CBOR (compact, self-describing), text frames carry
//! JSON. The size check runs before any parsing so oversized input never
//! reaches the deserializer.

use bytes::BufMut;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    errors::{ProtocolError, Result},
    event::{ClientCommand, ServerEvent},
};

/// Maximum accepted encoded payload size (1 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Maximum accepted history body size (64 MiB).
///
/// A history response carries the whole retained transcript in one body, so
/// it gets its own limit rather than the per-event one.
pub const MAX_HISTORY_SIZE: usize = 64 * 1024 * 1024;

pub(crate) fn check_size(bytes: &[u8]) -> Result<()> {
    check_limit(bytes, MAX_PAYLOAD_SIZE)
}

pub(crate) fn check_limit(bytes: &[u8], max: usize) -> Result<()> {
    if bytes.len() > max {
        return Err(ProtocolError::PayloadTooLarge { size: bytes.len(), max });
    }
    Ok(())
}

fn encode_cbor<T: Serialize>(value: &T, dst: &mut impl BufMut) -> Result<()> {
    ciborium::ser::into_writer(value, dst.writer())
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))
}

fn decode_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    check_size(bytes)?;
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}

fn encode_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| ProtocolError::JsonEncode(e.to_string()))
}

fn decode_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    check_size(text.as_bytes())?;
    serde_json::from_str(text).map_err(|e| ProtocolError::JsonDecode(e.to_string()))
}

impl ServerEvent {
    /// Encode as CBOR into `dst`.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        encode_cbor(self, dst)
    }

    /// Decode from CBOR bytes.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if `bytes` exceeds
    ///   [`MAX_PAYLOAD_SIZE`]
    /// - `ProtocolError::CborDecode` if the bytes are not a valid event
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_cbor(bytes)
    }

    /// Encode as JSON text.
    pub fn to_json(&self) -> Result<String> {
        encode_json(self)
    }

    /// Decode from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        decode_json(text)
    }
}

impl ClientCommand {
    /// Encode as CBOR into `dst`.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        encode_cbor(self, dst)
    }

    /// Encode as CBOR into a fresh buffer.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Decode from CBOR bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_cbor(bytes)
    }

    /// Encode as JSON text.
    pub fn to_json(&self) -> Result<String> {
        encode_json(self)
    }

    /// Decode from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        decode_json(text)
    }
}
