// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::Read;

use tracing::debug;

use crate::algorithms::algorithm_name;
use crate::cbor_value::decode_cbor_value;
use crate::cose_sign1::{
    decode_protected_header, extract_algorithm, extract_key_id, extract_signer_certificate, unwrap_cose_sign1,
};
use crate::error::VicalParseError;
use crate::model::SignedVical;
use crate::payload::decode_vical_payload;
use crate::settings::ParseSettings;

/// Parse a COSE_Sign1-wrapped VICAL with default settings.
pub fn parse_vical(input: &[u8]) -> Result<SignedVical, VicalParseError> {
    parse_vical_with_settings(input, &ParseSettings::default())
}

/// Parse a COSE_Sign1-wrapped VICAL.
///
/// The whole structure is validated in one pass; the first problem aborts the parse.
/// The signature is not verified.
pub fn parse_vical_with_settings(input: &[u8], settings: &ParseSettings) -> Result<SignedVical, VicalParseError> {
    let top = decode_cbor_value(input, settings).map_err(|e| e.context("malformed VICAL CBOR"))?;
    let envelope = unwrap_cose_sign1(&top)?;
    debug!(
        payload_len = envelope.payload.len(),
        signature_len = envelope.signature.len(),
        "unwrapped COSE_Sign1 envelope"
    );

    let protected = decode_protected_header(&envelope.protected, settings)?;
    let algorithm = extract_algorithm(&protected)?;
    debug!(algorithm, name = algorithm_name(algorithm), "read protected header");

    let key_id = extract_key_id(&protected, &envelope.unprotected);
    let signer_certificate = extract_signer_certificate(&envelope.unprotected);

    let vical = decode_vical_payload(&envelope.payload, settings)?;

    Ok(SignedVical {
        envelope,
        vical,
        algorithm,
        key_id,
        signer_certificate,
        raw: input.to_vec(),
    })
}

/// Read and parse a VICAL from `reader`, rejecting inputs longer than `max_len` bytes.
pub fn parse_vical_from_reader_with_max_len(
    reader: impl Read,
    max_len: usize,
) -> Result<SignedVical, VicalParseError> {
    parse_vical_from_reader_with_settings(reader, max_len, &ParseSettings::default())
}

/// Like [`parse_vical_from_reader_with_max_len`], with explicit parse settings.
pub fn parse_vical_from_reader_with_settings(
    reader: impl Read,
    max_len: usize,
    settings: &ParseSettings,
) -> Result<SignedVical, VicalParseError> {
    let mut buf = Vec::new();
    let limit = u64::try_from(max_len).unwrap_or(u64::MAX).saturating_add(1);
    reader
        .take(limit)
        .read_to_end(&mut buf)
        .map_err(|e| VicalParseError::with_source(format!("failed to read VICAL: {e}"), e))?;

    if buf.len() > max_len {
        return Err(VicalParseError::new(format!(
            "VICAL exceeds maximum length of {max_len} bytes"
        )));
    }

    parse_vical_with_settings(&buf, settings)
}
