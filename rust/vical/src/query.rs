// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Read-only lookups over a validated [`Vical`].

use std::collections::BTreeMap;

use crate::model::{CertificateInfo, Vical};

/// ISO 18013-5 mobile driving licence doc type.
pub const MDL_DOC_TYPE: &str = "org.iso.18013.5.1.mDL";

/// Certificates trusted for `doc_type`, in list order.
pub fn filter_by_doc_type<'a>(vical: &'a Vical, doc_type: &str) -> Vec<&'a CertificateInfo> {
    vical
        .certificate_infos
        .iter()
        .filter(|c| c.supports_doc_type(doc_type))
        .collect()
}

pub fn filter_mdl(vical: &Vical) -> Vec<&CertificateInfo> {
    filter_by_doc_type(vical, MDL_DOC_TYPE)
}

/// First certificate whose issuing country equals `country` exactly (no case folding).
pub fn find_by_country<'a>(vical: &'a Vical, country: &str) -> Option<&'a CertificateInfo> {
    vical
        .certificate_infos
        .iter()
        .find(|c| c.issuing_country.as_deref() == Some(country))
}

/// First certificate whose subject key identifier equals `ski` byte for byte.
pub fn find_by_ski<'a>(vical: &'a Vical, ski: &[u8]) -> Option<&'a CertificateInfo> {
    vical.certificate_infos.iter().find(|c| c.ski == ski)
}

/// Index certificates supporting `doc_type` (default: mDL) by issuing country.
///
/// Certificates without a country are skipped. When a country repeats, the later
/// certificate in list order replaces the earlier one.
pub fn build_trust_anchors<'a>(vical: &'a Vical, doc_type: Option<&str>) -> BTreeMap<String, &'a CertificateInfo> {
    let doc_type = doc_type.unwrap_or(MDL_DOC_TYPE);

    let mut anchors = BTreeMap::new();
    for cert in &vical.certificate_infos {
        if !cert.supports_doc_type(doc_type) {
            continue;
        }
        match cert.issuing_country.as_deref() {
            Some(country) if !country.is_empty() => {
                anchors.insert(country.to_string(), cert);
            }
            _ => {}
        }
    }
    anchors
}
