//! CBOR helpers built on cbor4ii
//!
//! WebAuthn structures that use integer map keys (COSE keys) must be encoded in
//! CTAP2 canonical form: keys sorted by their encoded bytes, definite lengths,
//! shortest integer encodings. [`MapBuilder`] produces that form; serde-derived
//! structs are used for the text-keyed maps (attestation object, extensions).

use std::collections::BTreeMap;

use cbor4ii::core::dec::{Decode, IgnoredAny, Read};
use cbor4ii::core::enc::{Encode, Write};
use cbor4ii::core::types::Map;
use cbor4ii::core::utils::{BufWriter, SliceReader};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, WebAuthnError};

/// Dynamic CBOR value
pub type Value = cbor4ii::core::Value;

/// Encode a value to CBOR bytes
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    cbor4ii::serde::to_vec(Vec::new(), value).map_err(encode_failed)
}

/// Decode CBOR bytes to a value
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    cbor4ii::serde::from_slice(data)
        .map_err(|e| WebAuthnError::Encoding(format!("CBOR decoding failed: {e:?}")))
}

/// Wrapper for i32 that sorts by CBOR encoding order (for canonical CBOR)
///
/// Unsigned keys encode with major type 0 and therefore precede every
/// negative key; among negatives, -1 (0x20) precedes -2 (0x21).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CborOrderedI32(i32);

impl PartialOrd for CborOrderedI32 {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CborOrderedI32 {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        let (a, b) = (self.0, other.0);
        match (a >= 0, b >= 0) {
            (true, true) => a.cmp(&b),
            (false, false) => b.cmp(&a),
            (true, false) => core::cmp::Ordering::Less,
            (false, true) => core::cmp::Ordering::Greater,
        }
    }
}

/// Build a canonical CBOR map with integer keys
///
/// Values are encoded as they are inserted; [`MapBuilder::build`] then writes
/// the map header and the entries in canonical key order. Inserting the same
/// key twice keeps the last value.
#[derive(Debug, Default)]
pub struct MapBuilder {
    entries: BTreeMap<CborOrderedI32, Vec<u8>>,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a serde-encodable value
    pub fn insert<T: Serialize>(mut self, key: i32, value: T) -> Result<Self> {
        let encoded = encode(&value)?;
        self.entries.insert(CborOrderedI32(key), encoded);
        Ok(self)
    }

    /// Insert an optional value (only if Some)
    pub fn insert_opt<T: Serialize>(self, key: i32, value: Option<T>) -> Result<Self> {
        match value {
            Some(v) => self.insert(key, v),
            None => Ok(self),
        }
    }

    /// Insert a CBOR byte string
    pub fn insert_bytes(self, key: i32, bytes: &[u8]) -> Result<Self> {
        self.insert(key, serde_bytes::Bytes::new(bytes))
    }

    /// Encode the map
    pub fn build(self) -> Result<Vec<u8>> {
        let mut writer = BufWriter::new(Vec::new());
        Map::bounded(self.entries.len(), &mut writer).map_err(encode_failed)?;
        for (key, value) in self.entries {
            key.0.encode(&mut writer).map_err(encode_failed)?;
            writer.push(&value).map_err(encode_failed)?;
        }
        Ok(writer.into_inner())
    }
}

/// Parse a CBOR map with integer keys
pub struct MapParser {
    map: BTreeMap<i32, Value>,
}

impl MapParser {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let map: BTreeMap<i32, Value> = decode(data)?;
        Ok(Self { map })
    }

    pub fn contains_key(&self, key: i32) -> bool {
        self.map.contains_key(&key)
    }

    /// Get a required integer value
    pub fn get_int(&self, key: i32) -> Result<i128> {
        match self.map.get(&key) {
            Some(Value::Integer(value)) => Ok(*value),
            Some(_) => Err(WebAuthnError::Encoding(format!(
                "map key {key} is not an integer"
            ))),
            None => Err(missing(key)),
        }
    }

    /// Get a required byte string
    pub fn get_bytes(&self, key: i32) -> Result<&[u8]> {
        match self.map.get(&key) {
            Some(Value::Bytes(bytes)) => Ok(bytes),
            Some(_) => Err(WebAuthnError::Encoding(format!(
                "map key {key} is not a byte string"
            ))),
            None => Err(missing(key)),
        }
    }
}

fn missing(key: i32) -> WebAuthnError {
    WebAuthnError::Encoding(format!("missing map key {key}"))
}

fn encode_failed<E: std::fmt::Debug>(err: E) -> WebAuthnError {
    WebAuthnError::Encoding(format!("CBOR encoding failed: {err:?}"))
}

/// Length in bytes of the first complete CBOR data item in `data`
///
/// Authenticator data embeds the COSE key without a length prefix, so the
/// parser has to walk the item to find where it ends.
pub fn item_len(data: &[u8]) -> Result<usize> {
    let mut reader = SliceReader::new(data);
    IgnoredAny::decode(&mut reader).map_err(malformed)?;
    let rest = reader.fill(data.len()).map_err(malformed)?;
    Ok(data.len() - rest.as_ref().len())
}

fn malformed<E: std::fmt::Debug>(err: E) -> WebAuthnError {
    WebAuthnError::Encoding(format!("CBOR item is malformed: {err:?}"))
}
