// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Validated VICAL data model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use num_bigint::BigUint;

use crate::algorithms::algorithm_name;
use crate::cbor_value::CborMap;
use crate::cose_sign1::CoseSign1Envelope;
use crate::error::VicalParseError;
use crate::query;

/// A parsed and structurally validated VICAL, with everything an external
/// verifier needs to check its signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedVical {
    pub envelope: CoseSign1Envelope,
    pub vical: Vical,
    /// COSE `alg` from the protected header.
    pub algorithm: i64,
    /// COSE `kid`, if either header carries one.
    pub key_id: Option<Vec<u8>>,
    /// End-entity certificate from `x5chain`, DER encoded.
    pub signer_certificate: Option<Vec<u8>>,
    /// The exact input bytes.
    pub raw: Vec<u8>,
}

impl SignedVical {
    pub fn algorithm_name(&self) -> &'static str {
        algorithm_name(self.algorithm)
    }

    /// COSE Sig_structure bytes covered by the envelope signature.
    pub fn sig_structure(&self) -> Result<Vec<u8>, VicalParseError> {
        self.envelope.sig_structure()
    }
}

/// The VICAL payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Vical {
    pub version: String,
    pub vical_provider: String,
    pub date: DateTime<Utc>,
    pub vical_issue_id: Option<u64>,
    pub next_update: Option<DateTime<Utc>>,
    pub certificate_infos: Vec<CertificateInfo>,
    pub extensions: Option<CborMap>,
}

/// One trusted IACA root certificate entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateInfo {
    /// DER-encoded X.509 certificate; not parsed.
    pub certificate: Vec<u8>,
    pub serial_number: BigUint,
    /// Subject key identifier.
    pub ski: Vec<u8>,
    pub doc_type: Vec<String>,
    pub certificate_profile: Option<Vec<String>>,
    pub issuing_authority: Option<String>,
    /// ISO 3166-1 or ISO 3166-2 code, e.g. `"KR"` or `"US-CA"`.
    pub issuing_country: Option<String>,
    pub state_or_province_name: Option<String>,
    /// DER-encoded issuer Name.
    pub issuer: Option<Vec<u8>>,
    /// DER-encoded subject Name.
    pub subject: Option<Vec<u8>>,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
    pub extensions: Option<CborMap>,
}

impl CertificateInfo {
    pub fn supports_doc_type(&self, doc_type: &str) -> bool {
        self.doc_type.iter().any(|d| d == doc_type)
    }
}

impl Vical {
    pub fn len(&self) -> usize {
        self.certificate_infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificate_infos.is_empty()
    }

    /// Distinct doc types across all certificates, in first-seen order.
    pub fn doc_types(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for d in self.certificate_infos.iter().flat_map(|c| c.doc_type.iter()) {
            if !out.contains(&d.as_str()) {
                out.push(d.as_str());
            }
        }
        out
    }

    /// Distinct issuing countries, in first-seen order.
    pub fn countries(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for c in self.certificate_infos.iter().filter_map(|c| c.issuing_country.as_deref()) {
            if !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }

    pub fn filter_by_doc_type(&self, doc_type: &str) -> Vec<&CertificateInfo> {
        query::filter_by_doc_type(self, doc_type)
    }

    pub fn filter_mdl(&self) -> Vec<&CertificateInfo> {
        query::filter_mdl(self)
    }

    pub fn find_by_country(&self, country: &str) -> Option<&CertificateInfo> {
        query::find_by_country(self, country)
    }

    pub fn find_by_ski(&self, ski: &[u8]) -> Option<&CertificateInfo> {
        query::find_by_ski(self, ski)
    }

    pub fn build_trust_anchors(&self, doc_type: Option<&str>) -> BTreeMap<String, &CertificateInfo> {
        query::build_trust_anchors(self, doc_type)
    }
}
