// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Dynamically-typed CBOR value tree.
//!
//! VICAL payloads mix strongly-typed mandatory fields with open-ended extension
//! maps, so the payload is first decoded into a [`CborValue`] tree and then
//! coerced field by field.
//!
//! A few well-known tags are resolved while decoding:
//! - tag 0 (RFC 3339 text) and tag 1 (epoch seconds) become [`CborValue::DateTime`]
//! - tag 2 (unsigned bignum) becomes [`CborValue::BigUint`]
//!
//! Every other tag, and a well-known tag whose content does not fit it, is kept
//! as [`CborValue::Tag`]; typed fields reject those during coercion while opaque
//! extension maps carry them through. Indefinite-length byte and
//! text strings are concatenated; indefinite-length arrays and maps are rejected.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use minicbor::data::Type;
use minicbor::Decoder;
use num_bigint::BigUint;

use crate::error::{cbor_error, VicalParseError};
use crate::settings::ParseSettings;

pub const TAG_DATE_TIME_TEXT: u64 = 0;
pub const TAG_DATE_TIME_EPOCH: u64 = 1;
pub const TAG_POSITIVE_BIGNUM: u64 = 2;

/// Map key. COSE labels and VICAL field names are `Int` or `Text`; extension maps may use any key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    /// Any other key (bool, float, array, out-of-range integer, ...) as its raw CBOR encoding.
    Encoded(Vec<u8>),
}

impl From<i64> for MapKey {
    fn from(value: i64) -> Self {
        MapKey::Int(value)
    }
}

impl From<&str> for MapKey {
    fn from(value: &str) -> Self {
        MapKey::Text(value.to_string())
    }
}

pub type CborMap = BTreeMap<MapKey, CborValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum CborValue {
    /// Major types 0 and 1; covers the full CBOR integer range.
    Integer(i128),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<CborValue>),
    Map(CborMap),
    Tag(u64, Box<CborValue>),
    Bool(bool),
    Float(f64),
    Simple(u8),
    Null,
    Undefined,
    DateTime(DateTime<Utc>),
    BigUint(BigUint),
}

impl CborValue {
    /// Short name of the value's shape, used in type error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            CborValue::Integer(_) => "integer",
            CborValue::Bytes(_) => "byte string",
            CborValue::Text(_) => "text",
            CborValue::Array(_) => "array",
            CborValue::Map(_) => "map",
            CborValue::Tag(..) => "tag",
            CborValue::Bool(_) => "bool",
            CborValue::Float(_) => "float",
            CborValue::Simple(_) => "simple value",
            CborValue::Null => "null",
            CborValue::Undefined => "undefined",
            CborValue::DateTime(_) => "date/time",
            CborValue::BigUint(_) => "bignum",
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CborValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&CborMap> {
        match self {
            CborValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[CborValue]> {
        match self {
            CborValue::Array(a) => Some(a.as_slice()),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, CborValue::Null | CborValue::Undefined)
    }
}

/// Decode one complete CBOR item from `bytes`.
///
/// Trailing data after the item is rejected unless the settings allow it.
pub fn decode_cbor_value(bytes: &[u8], settings: &ParseSettings) -> Result<CborValue, VicalParseError> {
    if bytes.is_empty() {
        return Err(VicalParseError::new("empty input"));
    }

    let mut dec = Decoder::new(bytes);
    let value = decode_value(&mut dec, 0, settings.max_depth)?;

    if !settings.allow_trailing_bytes && dec.position() != bytes.len() {
        return Err(VicalParseError::new(format!(
            "trailing bytes after CBOR item ({} of {} bytes consumed)",
            dec.position(),
            bytes.len()
        )));
    }

    Ok(value)
}

fn decode_value(dec: &mut Decoder<'_>, depth: usize, max_depth: usize) -> Result<CborValue, VicalParseError> {
    if depth > max_depth {
        return Err(VicalParseError::new(format!(
            "CBOR nesting exceeds maximum depth of {max_depth}"
        )));
    }

    match dec.datatype().map_err(|e| cbor_error("failed to read CBOR type", e))? {
        Type::Null => {
            dec.null().map_err(|e| cbor_error("failed to read null", e))?;
            Ok(CborValue::Null)
        }
        Type::Undefined => {
            dec.undefined().map_err(|e| cbor_error("failed to read undefined", e))?;
            Ok(CborValue::Undefined)
        }
        Type::Bool => {
            let b = dec.bool().map_err(|e| cbor_error("failed to read bool", e))?;
            Ok(CborValue::Bool(b))
        }
        Type::Simple => {
            let s = dec.simple().map_err(|e| cbor_error("failed to read simple value", e))?;
            Ok(CborValue::Simple(s))
        }
        Type::U8
        | Type::U16
        | Type::U32
        | Type::U64
        | Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int => {
            let i = dec.int().map_err(|e| cbor_error("failed to read integer", e))?;
            Ok(CborValue::Integer(i128::from(i)))
        }
        Type::F16 => {
            let f = dec.f16().map_err(|e| cbor_error("failed to read float", e))?;
            Ok(CborValue::Float(f64::from(f)))
        }
        Type::F32 => {
            let f = dec.f32().map_err(|e| cbor_error("failed to read float", e))?;
            Ok(CborValue::Float(f64::from(f)))
        }
        Type::F64 => {
            let f = dec.f64().map_err(|e| cbor_error("failed to read float", e))?;
            Ok(CborValue::Float(f))
        }
        Type::Bytes => {
            let b = dec.bytes().map_err(|e| cbor_error("failed to read byte string", e))?;
            Ok(CborValue::Bytes(b.to_vec()))
        }
        Type::BytesIndef => {
            let mut out = Vec::new();
            for chunk in dec
                .bytes_iter()
                .map_err(|e| cbor_error("failed to read byte string", e))?
            {
                out.extend_from_slice(chunk.map_err(|e| cbor_error("failed to read byte string chunk", e))?);
            }
            Ok(CborValue::Bytes(out))
        }
        Type::String => {
            let s = dec.str().map_err(|e| cbor_error("failed to read text string", e))?;
            Ok(CborValue::Text(s.to_string()))
        }
        Type::StringIndef => {
            let mut out = String::new();
            for chunk in dec
                .str_iter()
                .map_err(|e| cbor_error("failed to read text string", e))?
            {
                out.push_str(chunk.map_err(|e| cbor_error("failed to read text string chunk", e))?);
            }
            Ok(CborValue::Text(out))
        }
        Type::Array => {
            let len = dec
                .array()
                .map_err(|e| cbor_error("failed to read array", e))?
                .ok_or_else(|| VicalParseError::new("indefinite-length arrays are not supported"))?;
            // Preallocation is capped independently of the declared length.
            let mut out = Vec::with_capacity(len.min(1024) as usize);
            for _ in 0..len {
                out.push(decode_value(dec, depth + 1, max_depth)?);
            }
            Ok(CborValue::Array(out))
        }
        Type::Map => {
            let len = dec
                .map()
                .map_err(|e| cbor_error("failed to read map", e))?
                .ok_or_else(|| VicalParseError::new("indefinite-length maps are not supported"))?;
            let mut out = BTreeMap::new();
            for _ in 0..len {
                let key = decode_map_key(dec, depth + 1, max_depth)?;
                let value = decode_value(dec, depth + 1, max_depth)?;
                out.insert(key, value);
            }
            Ok(CborValue::Map(out))
        }
        Type::Tag => {
            let tag = dec.tag().map_err(|e| cbor_error("failed to read CBOR tag", e))?.as_u64();
            let inner = decode_value(dec, depth + 1, max_depth)?;
            Ok(match resolve_tag(tag, &inner) {
                Ok(Some(resolved)) => resolved,
                Ok(None) | Err(_) => CborValue::Tag(tag, Box::new(inner)),
            })
        }
        Type::ArrayIndef => Err(VicalParseError::new("indefinite-length arrays are not supported")),
        Type::MapIndef => Err(VicalParseError::new("indefinite-length maps are not supported")),
        other => Err(VicalParseError::new(format!("unsupported CBOR item type: {other:?}"))),
    }
}

fn decode_map_key(dec: &mut Decoder<'_>, depth: usize, max_depth: usize) -> Result<MapKey, VicalParseError> {
    let start = dec.position();
    match dec.datatype().map_err(|e| cbor_error("failed to read CBOR type", e))? {
        Type::U8
        | Type::U16
        | Type::U32
        | Type::U64
        | Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int => {
            let i = dec
                .int()
                .map_err(|e| cbor_error("failed to decode int map key", e))?;
            match i64::try_from(i128::from(i)) {
                Ok(i) => Ok(MapKey::Int(i)),
                Err(_) => Ok(MapKey::Encoded(dec.input()[start..dec.position()].to_vec())),
            }
        }
        Type::String => {
            let s = dec
                .str()
                .map_err(|e| cbor_error("failed to decode text map key", e))?;
            Ok(MapKey::Text(s.to_string()))
        }
        Type::Bytes => {
            let b = dec
                .bytes()
                .map_err(|e| cbor_error("failed to decode byte string map key", e))?;
            Ok(MapKey::Bytes(b.to_vec()))
        }
        _ => {
            // Decoded for validation and depth accounting; the key keeps its raw encoding.
            decode_value(dec, depth, max_depth)?;
            Ok(MapKey::Encoded(dec.input()[start..dec.position()].to_vec()))
        }
    }
}

/// Resolve a well-known tag into its native value.
///
/// `Ok(None)` for tags that are not resolved; `Err` when a well-known tag has content
/// that does not fit it.
pub(crate) fn resolve_tag(tag: u64, inner: &CborValue) -> Result<Option<CborValue>, VicalParseError> {
    let resolved = match (tag, inner) {
        (TAG_DATE_TIME_TEXT, CborValue::Text(s)) => CborValue::DateTime(datetime_from_rfc3339(s, "tag 0 date/time")?),
        (TAG_DATE_TIME_TEXT, other) => {
            return Err(VicalParseError::wrong_type("tag 0 date/time", "text", other.type_name()))
        }
        (TAG_DATE_TIME_EPOCH, CborValue::Integer(secs)) => {
            CborValue::DateTime(datetime_from_epoch_int(*secs, "tag 1 date/time")?)
        }
        (TAG_DATE_TIME_EPOCH, CborValue::Float(secs)) => {
            CborValue::DateTime(datetime_from_epoch_float(*secs, "tag 1 date/time")?)
        }
        (TAG_DATE_TIME_EPOCH, other) => {
            return Err(VicalParseError::wrong_type("tag 1 date/time", "a number", other.type_name()))
        }
        (TAG_POSITIVE_BIGNUM, CborValue::Bytes(b)) => CborValue::BigUint(BigUint::from_bytes_be(b)),
        (TAG_POSITIVE_BIGNUM, other) => {
            return Err(VicalParseError::wrong_type("tag 2 bignum", "a byte string", other.type_name()))
        }
        _ => return Ok(None),
    };
    Ok(Some(resolved))
}

pub(crate) fn datetime_from_rfc3339(s: &str, what: &str) -> Result<DateTime<Utc>, VicalParseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| VicalParseError::with_source(format!("{what} is not a valid RFC 3339 timestamp: {s:?}"), e))
}

pub(crate) fn datetime_from_epoch_int(secs: i128, what: &str) -> Result<DateTime<Utc>, VicalParseError> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| VicalParseError::new(format!("{what} epoch seconds out of range: {secs}")))
}

pub(crate) fn datetime_from_epoch_float(secs: f64, what: &str) -> Result<DateTime<Utc>, VicalParseError> {
    if !secs.is_finite() || secs.abs() > i64::MAX as f64 {
        return Err(VicalParseError::new(format!("{what} epoch seconds out of range: {secs}")));
    }

    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
        .ok_or_else(|| VicalParseError::new(format!("{what} epoch seconds out of range: {secs}")))
}
