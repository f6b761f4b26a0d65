// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Field coercions from [`CborValue`] to model types.
//!
//! Each function takes the field path (`what`) so errors name the offending field.

use chrono::{DateTime, Utc};
use num_bigint::BigUint;

use crate::cbor_value::{
    datetime_from_epoch_float, datetime_from_epoch_int, datetime_from_rfc3339, resolve_tag, CborMap, CborValue,
    MapKey, TAG_DATE_TIME_EPOCH, TAG_DATE_TIME_TEXT, TAG_POSITIVE_BIGNUM,
};
use crate::error::VicalParseError;

/// Field lookup over a decoded map, scoped for error messages.
pub(crate) struct Fields<'a> {
    map: &'a CborMap,
    scope: String,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(value: &'a CborValue, scope: &str) -> Result<Self, VicalParseError> {
        let what = if scope.is_empty() { "payload" } else { scope };
        match value {
            CborValue::Map(map) => Ok(Self {
                map,
                scope: scope.to_string(),
            }),
            other => Err(VicalParseError::wrong_type(what, "a map", other.type_name())),
        }
    }

    pub(crate) fn required(&self, name: &str) -> Result<&'a CborValue, VicalParseError> {
        self.map
            .get(&MapKey::Text(name.to_string()))
            .ok_or_else(|| VicalParseError::missing_field(&self.scope, name))
    }

    /// Absent, `null` and `undefined` all mean "not supplied".
    pub(crate) fn optional(&self, name: &str) -> Option<&'a CborValue> {
        self.map
            .get(&MapKey::Text(name.to_string()))
            .filter(|v| !v.is_absent())
    }

    /// Dotted path of a field inside this scope.
    pub(crate) fn path(&self, name: &str) -> String {
        if self.scope.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", self.scope)
        }
    }
}

/// Natural string form of any scalar; tolerates encoders that emit numbers for text fields.
pub(crate) fn to_string(value: &CborValue, what: &str) -> Result<String, VicalParseError> {
    match value {
        CborValue::Text(s) => Ok(s.clone()),
        CborValue::Integer(i) => Ok(i.to_string()),
        CborValue::Float(f) => Ok(f.to_string()),
        CborValue::Bool(b) => Ok(b.to_string()),
        CborValue::BigUint(n) => Ok(n.to_string()),
        CborValue::DateTime(dt) => Ok(dt.to_rfc3339()),
        other => Err(VicalParseError::wrong_type(what, "a scalar", other.type_name())),
    }
}

pub(crate) fn to_non_empty_string(value: &CborValue, what: &str) -> Result<String, VicalParseError> {
    let s = to_string(value, what)?;
    if s.is_empty() {
        return Err(VicalParseError::new(format!("{what} must not be empty")));
    }
    Ok(s)
}

pub(crate) fn to_bytes(value: &CborValue, what: &str) -> Result<Vec<u8>, VicalParseError> {
    match value {
        CborValue::Bytes(b) => Ok(b.clone()),
        other => Err(VicalParseError::wrong_type(what, "a byte string", other.type_name())),
    }
}

pub(crate) fn to_u64(value: &CborValue, what: &str) -> Result<u64, VicalParseError> {
    match value {
        CborValue::Integer(i) => {
            u64::try_from(*i).map_err(|_| VicalParseError::new(format!("{what} out of range: {i}")))
        }
        other => Err(VicalParseError::wrong_type(what, "an unsigned integer", other.type_name())),
    }
}

/// Date rule: native date/time passes through, text is RFC 3339, numbers are epoch seconds.
pub(crate) fn to_datetime(value: &CborValue, what: &str) -> Result<DateTime<Utc>, VicalParseError> {
    match value {
        CborValue::DateTime(dt) => Ok(*dt),
        CborValue::Text(s) => datetime_from_rfc3339(s, what),
        CborValue::Integer(secs) => datetime_from_epoch_int(*secs, what),
        CborValue::Float(secs) => datetime_from_epoch_float(*secs, what),
        CborValue::Tag(tag @ (TAG_DATE_TIME_TEXT | TAG_DATE_TIME_EPOCH), inner) => Err(malformed_tag(*tag, inner, what)),
        other => Err(VicalParseError::wrong_type(what, "a date/time", other.type_name())),
    }
}

/// Certificate serial numbers may be up to 20 bytes, so they are always widened to `BigUint`.
pub(crate) fn to_serial(value: &CborValue, what: &str) -> Result<BigUint, VicalParseError> {
    match value {
        CborValue::BigUint(n) => Ok(n.clone()),
        CborValue::Integer(i) => u128::try_from(*i)
            .map(BigUint::from)
            .map_err(|_| VicalParseError::new(format!("{what} must not be negative: {i}"))),
        CborValue::Bytes(b) => Ok(BigUint::from_bytes_be(b)),
        CborValue::Tag(TAG_POSITIVE_BIGNUM, inner) => Err(malformed_tag(TAG_POSITIVE_BIGNUM, inner, what)),
        other => Err(VicalParseError::wrong_type(
            what,
            "an unsigned integer or byte string",
            other.type_name(),
        )),
    }
}

/// Error for a well-known tag the decoder left unresolved because its content did not fit.
fn malformed_tag(tag: u64, inner: &CborValue, what: &str) -> VicalParseError {
    match resolve_tag(tag, inner) {
        Err(e) => e.context(what),
        Ok(_) => VicalParseError::new(format!("{what} has a malformed tag {tag}")),
    }
}

pub(crate) fn to_text_list(value: &CborValue, what: &str) -> Result<Vec<String>, VicalParseError> {
    let items = match value {
        CborValue::Array(items) => items,
        other => return Err(VicalParseError::wrong_type(what, "an array of text", other.type_name())),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            CborValue::Text(s) => Ok(s.clone()),
            other => Err(VicalParseError::wrong_type(&format!("{what}[{i}]"), "text", other.type_name())),
        })
        .collect()
}

pub(crate) fn to_map(value: &CborValue, what: &str) -> Result<CborMap, VicalParseError> {
    match value {
        CborValue::Map(m) => Ok(m.clone()),
        other => Err(VicalParseError::wrong_type(what, "a map", other.type_name())),
    }
}
