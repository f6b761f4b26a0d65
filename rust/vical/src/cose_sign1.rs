// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Sign1 envelope handling.
//!
//! A VICAL is carried as:
//!
//! ```text
//! COSE_Sign1 = [ protected : bstr,
//!               unprotected : map,
//!               payload : bstr,
//!               signature : bstr ]
//! ```
//!
//! optionally wrapped in CBOR tag 18. This module unwraps the envelope and
//! extracts the header fields a verifier needs. Signatures are never checked here.

use minicbor::Encoder;
use tracing::warn;

use crate::cbor_value::{decode_cbor_value, CborMap, CborValue, MapKey};
use crate::error::VicalParseError;
use crate::settings::ParseSettings;

/// Standard CBOR tag number used for COSE_Sign1.
pub const COSE_SIGN1_TAG: u64 = 18;

/// Context string for COSE Sig_structure for COSE_Sign1.
pub const SIG_STRUCTURE_CONTEXT_SIGNATURE1: &str = "Signature1";

pub const HEADER_LABEL_ALG: i64 = 1;
pub const HEADER_LABEL_KID: i64 = 4;
pub const HEADER_LABEL_X5CHAIN: i64 = 33;

#[derive(Debug, Clone, PartialEq)]
pub struct CoseSign1Envelope {
    /// Serialized protected header map, exactly as signed.
    pub protected: Vec<u8>,
    pub unprotected: CborMap,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

impl CoseSign1Envelope {
    /// All certificates in the unprotected `x5chain` header, leaf first.
    ///
    /// Returns `None` if the header is absent or is neither a bstr nor an array of bstr.
    pub fn certificate_chain(&self) -> Option<Vec<&[u8]>> {
        match self.unprotected.get(&MapKey::Int(HEADER_LABEL_X5CHAIN))? {
            CborValue::Bytes(b) => Some(vec![b.as_slice()]),
            CborValue::Array(items) => items.iter().map(CborValue::as_bytes).collect(),
            _ => None,
        }
    }

    /// Encode the COSE Sig_structure for this envelope (empty external AAD).
    ///
    /// These are the bytes the signature was computed over.
    pub fn sig_structure(&self) -> Result<Vec<u8>, VicalParseError> {
        let encode_err = |e: minicbor::encode::Error<std::convert::Infallible>| {
            VicalParseError::new(format!("failed to encode Sig_structure: {e}"))
        };

        let mut out = Vec::with_capacity(32 + self.protected.len() + self.payload.len());
        let mut enc = Encoder::new(&mut out);
        enc.array(4).map_err(encode_err)?;
        enc.str(SIG_STRUCTURE_CONTEXT_SIGNATURE1).map_err(encode_err)?;
        enc.bytes(&self.protected).map_err(encode_err)?;
        enc.bytes(&[]).map_err(encode_err)?; // external_aad
        enc.bytes(&self.payload).map_err(encode_err)?;
        Ok(out)
    }
}

/// Unwrap a decoded top-level value into its four COSE_Sign1 parts.
///
/// Accepts a bare 4-element array or the same array under tag 18. Any other
/// tag, a non-array, or the wrong element count is a structural error.
pub fn unwrap_cose_sign1(value: &CborValue) -> Result<CoseSign1Envelope, VicalParseError> {
    let items = match value {
        CborValue::Array(items) => items,
        CborValue::Tag(COSE_SIGN1_TAG, inner) => match &**inner {
            CborValue::Array(items) => items,
            other => {
                return Err(VicalParseError::new(format!(
                    "COSE_Sign1 tag 18 must wrap an array, got {}",
                    other.type_name()
                )))
            }
        },
        CborValue::Tag(tag, _) => {
            return Err(VicalParseError::new(format!(
                "unexpected CBOR tag {tag} (expected COSE_Sign1 tag 18 or no tag)"
            )))
        }
        other => {
            return Err(VicalParseError::new(format!(
                "COSE_Sign1 must be a 4-element array, got {}",
                other.type_name()
            )))
        }
    };

    let [protected, unprotected, payload, signature] = items.as_slice() else {
        return Err(VicalParseError::new(format!(
            "COSE_Sign1 array length was {} (expected 4 elements)",
            items.len()
        )));
    };

    let protected = byte_element(protected, "protected header")?;
    let unprotected = match unprotected {
        CborValue::Map(m) => m.clone(),
        other => {
            return Err(VicalParseError::wrong_type(
                "unprotected header",
                "a map",
                other.type_name(),
            ))
        }
    };
    let payload = byte_element(payload, "payload")?;
    let signature = byte_element(signature, "signature")?;

    Ok(CoseSign1Envelope {
        protected,
        unprotected,
        payload,
        signature,
    })
}

fn byte_element(value: &CborValue, what: &str) -> Result<Vec<u8>, VicalParseError> {
    match value {
        CborValue::Bytes(b) => Ok(b.clone()),
        other => Err(VicalParseError::wrong_type(what, "a byte string", other.type_name())),
    }
}

/// Decode the serialized protected header map. An empty bstr is an empty map.
pub fn decode_protected_header(protected: &[u8], settings: &ParseSettings) -> Result<CborMap, VicalParseError> {
    if protected.is_empty() {
        return Ok(CborMap::new());
    }

    match decode_cbor_value(protected, settings).map_err(|e| e.context("failed to decode protected header"))? {
        CborValue::Map(m) => Ok(m),
        other => Err(VicalParseError::wrong_type(
            "protected header",
            "a map",
            other.type_name(),
        )),
    }
}

/// The `alg` (label 1) header value. Negative ids are ordinary algorithm ids.
pub fn extract_algorithm(protected: &CborMap) -> Result<i64, VicalParseError> {
    match protected.get(&MapKey::Int(HEADER_LABEL_ALG)) {
        None => Err(VicalParseError::missing_field("protected header", "alg (1)")),
        Some(CborValue::Integer(i)) => i64::try_from(*i)
            .map_err(|_| VicalParseError::new(format!("protected header alg (1) out of range: {i}"))),
        Some(other) => Err(VicalParseError::wrong_type(
            "protected header alg (1)",
            "an integer",
            other.type_name(),
        )),
    }
}

/// The `kid` (label 4) header value, preferring the protected header.
pub fn extract_key_id(protected: &CborMap, unprotected: &CborMap) -> Option<Vec<u8>> {
    let key = MapKey::Int(HEADER_LABEL_KID);
    protected
        .get(&key)
        .or_else(|| unprotected.get(&key))
        .and_then(CborValue::as_bytes)
        .map(<[u8]>::to_vec)
}

/// The end-entity certificate from the unprotected `x5chain` (label 33) header.
///
/// The header is advisory: a malformed chain yields `None` rather than an error.
pub fn extract_signer_certificate(unprotected: &CborMap) -> Option<Vec<u8>> {
    match unprotected.get(&MapKey::Int(HEADER_LABEL_X5CHAIN))? {
        CborValue::Bytes(b) => Some(b.clone()),
        CborValue::Array(items) => match items.first() {
            Some(CborValue::Bytes(b)) => Some(b.clone()),
            Some(other) => {
                warn!(kind = other.type_name(), "ignoring x5chain whose first element is not a byte string");
                None
            }
            None => {
                warn!("ignoring empty x5chain");
                None
            }
        },
        other => {
            warn!(kind = other.type_name(), "ignoring x5chain that is neither a bstr nor an array");
            None
        }
    }
}
