//! Byte encodings used on the LCD wire.
//!
//! # Responsibilities
//! - Derive transaction identifiers (sha256 of amino bytes)
//! - Validate transaction hashes reported by the backend
//! - Decode base64/hex payloads with errors mapped to `LcdError`
//! - Accept integers encoded either as JSON numbers or decimal strings
//! - Percent-encode caller input placed into request URLs

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::ser::SerializeSeq;
use serde::{de, Deserialize, Deserializer, Serializer};
use sha2::{Digest, Sha256};
use url::form_urlencoded::byte_serialize;

use crate::lcd::error::{LcdError, LcdResult};

/// Uppercase hex sha256 digest of the given bytes.
pub fn sha256_identifier(bytes: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode_upper(hasher.finalize())
}

/// True when `hash` is non-empty uppercase hex made of whole byte pairs.
pub fn is_strict_tx_hash(hash: &str) -> bool {
    !hash.is_empty()
        && hash.len() % 2 == 0
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}

pub fn decode_base64(field: &str, value: &str) -> LcdResult<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|e| LcdError::MalformedResponse(format!("{} is not valid base64: {}", field, e)))
}

pub fn encode_base64(bytes: impl AsRef<[u8]>) -> String {
    BASE64.encode(bytes)
}

pub fn decode_hex(field: &str, value: &str) -> LcdResult<Vec<u8>> {
    hex::decode(value)
        .map_err(|e| LcdError::MalformedResponse(format!("{} is not valid hex: {}", field, e)))
}

/// Percent-encode a query string key or value so `&`, `=` and `#` stay literal.
pub fn encode_query_component(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// Percent-encode a single URL path segment.
pub fn encode_path_segment(value: &str) -> String {
    // form encoding writes a space as '+', which is literal inside a path
    byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Parse a base-10 height string.
pub fn parse_height(field: &str, value: &str) -> LcdResult<u64> {
    value
        .parse::<u64>()
        .map_err(|e| LcdError::Protocol(format!("{} '{}' is not a valid height: {}", field, value, e)))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

/// Deserialize a `u64` sent either as a JSON number or as a decimal string.
pub fn u64_from_str_or_num<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) if s.is_empty() => Ok(0),
        NumberOrString::String(s) => s.parse().map_err(de::Error::custom),
    }
}

/// Deserialize an explicit JSON `null` as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn serialize_base64<S, T>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: AsRef<[u8]>,
{
    serializer.serialize_str(&encode_base64(bytes))
}

pub fn serialize_base64_opt<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match bytes {
        Some(b) => serializer.serialize_some(&encode_base64(b)),
        None => serializer.serialize_none(),
    }
}

pub fn serialize_base64_list<S>(list: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut seq = serializer.serialize_seq(Some(list.len()))?;
    for bytes in list {
        seq.serialize_element(&encode_base64(bytes))?;
    }
    seq.end()
}
