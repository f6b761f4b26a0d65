// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! VICAL payload decoding and validation.
//!
//! ```text
//! VICAL = {
//!   "version" : tstr,
//!   "vicalProvider" : tstr,
//!   "date" : tdate,
//!   ? "vicalIssueID" : uint,
//!   ? "nextUpdate" : tdate,
//!   "certificateInfos" : [* CertificateInfo],
//!   ? "extensions" : { * tstr => any }
//! }
//! ```

use tracing::debug;

use crate::cbor_value::{decode_cbor_value, CborValue};
use crate::coerce::{self, Fields};
use crate::error::VicalParseError;
use crate::model::{CertificateInfo, Vical};
use crate::settings::ParseSettings;

/// Decode the payload bytes of the envelope into a validated [`Vical`].
pub fn decode_vical_payload(payload: &[u8], settings: &ParseSettings) -> Result<Vical, VicalParseError> {
    let value = decode_cbor_value(payload, settings).map_err(|e| e.context("undecodable VICAL payload CBOR"))?;
    vical_from_value(&value)
}

/// Validate an already decoded payload value.
pub fn vical_from_value(value: &CborValue) -> Result<Vical, VicalParseError> {
    let fields = Fields::new(value, "")?;

    // Presence of every mandatory field is checked before any coercion.
    let version = fields.required("version")?;
    let vical_provider = fields.required("vicalProvider")?;
    let date = fields.required("date")?;
    let certificate_infos = fields.required("certificateInfos")?;

    let version = coerce::to_non_empty_string(version, "version")?;
    let vical_provider = coerce::to_non_empty_string(vical_provider, "vicalProvider")?;
    let date = coerce::to_datetime(date, "date")?;

    let vical_issue_id = fields
        .optional("vicalIssueID")
        .map(|v| coerce::to_u64(v, "vicalIssueID"))
        .transpose()?;
    let next_update = fields
        .optional("nextUpdate")
        .map(|v| coerce::to_datetime(v, "nextUpdate"))
        .transpose()?;

    let certificate_infos = match certificate_infos {
        CborValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| certificate_info_from_value(index, item))
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(VicalParseError::wrong_type(
                "certificateInfos",
                "an array",
                other.type_name(),
            ))
        }
    };

    let extensions = fields
        .optional("extensions")
        .map(|v| coerce::to_map(v, "extensions"))
        .transpose()?;

    debug!(
        version = %version,
        provider = %vical_provider,
        certificates = certificate_infos.len(),
        "decoded VICAL payload"
    );

    Ok(Vical {
        version,
        vical_provider,
        date,
        vical_issue_id,
        next_update,
        certificate_infos,
        extensions,
    })
}

fn certificate_info_from_value(index: usize, value: &CborValue) -> Result<CertificateInfo, VicalParseError> {
    let scope = format!("certificateInfos[{index}]");
    let fields = Fields::new(value, &scope)?;

    let certificate = fields.required("certificate")?;
    let serial_number = fields.required("serialNumber")?;
    let ski = fields.required("ski")?;
    let doc_type = fields.required("docType")?;

    let optional_string = |name: &str| {
        fields
            .optional(name)
            .map(|v| coerce::to_string(v, &fields.path(name)))
            .transpose()
    };
    let optional_bytes = |name: &str| {
        fields
            .optional(name)
            .map(|v| coerce::to_bytes(v, &fields.path(name)))
            .transpose()
    };
    let optional_datetime = |name: &str| {
        fields
            .optional(name)
            .map(|v| coerce::to_datetime(v, &fields.path(name)))
            .transpose()
    };

    Ok(CertificateInfo {
        certificate: coerce::to_bytes(certificate, &fields.path("certificate"))?,
        serial_number: coerce::to_serial(serial_number, &fields.path("serialNumber"))?,
        ski: coerce::to_bytes(ski, &fields.path("ski"))?,
        doc_type: coerce::to_text_list(doc_type, &fields.path("docType"))?,
        certificate_profile: fields
            .optional("certificateProfile")
            .map(|v| coerce::to_text_list(v, &fields.path("certificateProfile")))
            .transpose()?,
        issuing_authority: optional_string("issuingAuthority")?,
        issuing_country: optional_string("issuingCountry")?,
        state_or_province_name: optional_string("stateOrProvinceName")?,
        issuer: optional_bytes("issuer")?,
        subject: optional_bytes("subject")?,
        not_before: optional_datetime("notBefore")?,
        not_after: optional_datetime("notAfter")?,
        extensions: fields
            .optional("extensions")
            .map(|v| coerce::to_map(v, &fields.path("extensions")))
            .transpose()?,
    })
}
