// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared helpers for `vical` integration tests.
//!
//! Fixtures are assembled from a small CBOR value enum so individual tests can
//! drop or replace single fields and observe the resulting error.

#![allow(dead_code)]

use minicbor::data::Tag;
use minicbor::Encoder;
use num_bigint::BigUint;
use vical::{CborMap, CborValue, CertificateInfo, MapKey, Vical, MDL_DOC_TYPE};

/// Minimal set of CBOR key types used by these tests.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TestCborKey {
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    /// Pre-encoded CBOR written verbatim.
    Raw(Vec<u8>),
}

impl TestCborKey {
    pub(crate) fn encode(&self, enc: &mut Encoder<Vec<u8>>) {
        match self {
            TestCborKey::Int(i) => {
                enc.i64(*i).unwrap();
            }
            TestCborKey::Text(s) => {
                enc.str(s).unwrap();
            }
            TestCborKey::Bytes(b) => {
                enc.bytes(b).unwrap();
            }
            TestCborKey::Raw(raw) => {
                enc.writer_mut().extend_from_slice(raw);
            }
        }
    }
}

/// Minimal set of CBOR value types used by these tests.
#[derive(Clone, Debug)]
pub(crate) enum TestCborValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<TestCborValue>),
    Map(Vec<(TestCborKey, TestCborValue)>),
    Tag(u64, Box<TestCborValue>),
    /// Pre-encoded CBOR written verbatim.
    Raw(Vec<u8>),
}

impl TestCborValue {
    pub(crate) fn encode(&self, enc: &mut Encoder<Vec<u8>>) {
        match self {
            TestCborValue::Int(i) => {
                enc.i64(*i).unwrap();
            }
            TestCborValue::Float(f) => {
                enc.f64(*f).unwrap();
            }
            TestCborValue::Bool(b) => {
                enc.bool(*b).unwrap();
            }
            TestCborValue::Null => {
                enc.null().unwrap();
            }
            TestCborValue::Bytes(b) => {
                enc.bytes(b).unwrap();
            }
            TestCborValue::Text(s) => {
                enc.str(s).unwrap();
            }
            TestCborValue::Array(items) => {
                enc.array(items.len() as u64).unwrap();
                for it in items {
                    it.encode(enc);
                }
            }
            TestCborValue::Map(entries) => {
                enc.map(entries.len() as u64).unwrap();
                for (k, v) in entries {
                    k.encode(enc);
                    v.encode(enc);
                }
            }
            TestCborValue::Tag(tag, inner) => {
                enc.tag(Tag::new(*tag)).unwrap();
                inner.encode(enc);
            }
            TestCborValue::Raw(raw) => {
                enc.writer_mut().extend_from_slice(raw);
            }
        }
    }

    pub(crate) fn to_cbor(&self) -> Vec<u8> {
        let mut enc = Encoder::new(Vec::new());
        self.encode(&mut enc);
        enc.into_writer()
    }

    /// Converts the subset of decoded values that can appear in extension maps.
    pub(crate) fn from_value(value: &CborValue) -> Self {
        match value {
            CborValue::Integer(i) => TestCborValue::Int(i64::try_from(*i).unwrap()),
            CborValue::Float(f) => TestCborValue::Float(*f),
            CborValue::Bool(b) => TestCborValue::Bool(*b),
            CborValue::Null => TestCborValue::Null,
            CborValue::Bytes(b) => TestCborValue::Bytes(b.clone()),
            CborValue::Text(s) => TestCborValue::Text(s.clone()),
            CborValue::Array(items) => TestCborValue::Array(items.iter().map(Self::from_value).collect()),
            CborValue::Map(m) => TestCborValue::Map(map_entries(m)),
            CborValue::Tag(tag, inner) => TestCborValue::Tag(*tag, Box::new(Self::from_value(inner))),
            other => panic!("unsupported extension value in fixture: {other:?}"),
        }
    }
}

pub(crate) fn text(s: &str) -> TestCborValue {
    TestCborValue::Text(s.to_string())
}

pub(crate) fn key(s: &str) -> TestCborKey {
    TestCborKey::Text(s.to_string())
}

pub(crate) type Entries = Vec<(TestCborKey, TestCborValue)>;

fn map_entries(m: &CborMap) -> Entries {
    m.iter()
        .map(|(k, v)| {
            let k = match k {
                MapKey::Int(i) => TestCborKey::Int(*i),
                MapKey::Text(s) => TestCborKey::Text(s.clone()),
                MapKey::Bytes(b) => TestCborKey::Bytes(b.clone()),
                MapKey::Encoded(raw) => TestCborKey::Raw(raw.clone()),
            };
            (k, TestCborValue::from_value(v))
        })
        .collect()
}

/// Returns `entries` without the field named `name`.
pub(crate) fn without(entries: &Entries, name: &str) -> Entries {
    entries.iter().filter(|(k, _)| *k != key(name)).cloned().collect()
}

/// Returns `entries` with the field named `name` replaced (or added).
pub(crate) fn with(entries: &Entries, name: &str, value: TestCborValue) -> Entries {
    let mut out = without(entries, name);
    out.push((key(name), value));
    out
}

/// Encodes a protected header map as CBOR bytes.
pub(crate) fn encode_protected_header_bytes(entries: &[(i64, TestCborValue)]) -> Vec<u8> {
    let mut enc = Encoder::new(Vec::new());
    enc.map(entries.len() as u64).unwrap();
    for (k, v) in entries {
        enc.i64(*k).unwrap();
        v.encode(&mut enc);
    }
    enc.into_writer()
}

/// Protected header `{1: -7}` (ES256).
pub(crate) fn es256_protected() -> Vec<u8> {
    encode_protected_header_bytes(&[(1, TestCborValue::Int(-7))])
}

/// Encodes a COSE_Sign1 message from components.
///
/// This is a focused test helper, not a general-purpose COSE encoder.
pub(crate) fn encode_cose_sign1(
    include_tag_18: bool,
    protected_bstr_contents: &[u8],
    unprotected_entries: &[(TestCborKey, TestCborValue)],
    payload: &[u8],
    signature: &[u8],
) -> Vec<u8> {
    let mut enc = Encoder::new(Vec::new());

    if include_tag_18 {
        enc.tag(Tag::new(18)).unwrap();
    }

    enc.array(4).unwrap();
    enc.bytes(protected_bstr_contents).unwrap();
    enc.map(unprotected_entries.len() as u64).unwrap();
    for (k, v) in unprotected_entries {
        k.encode(&mut enc);
        v.encode(&mut enc);
    }
    enc.bytes(payload).unwrap();
    enc.bytes(signature).unwrap();

    enc.into_writer()
}

/// Wraps a payload map in a tagged ES256 COSE_Sign1 with a one-certificate x5chain.
pub(crate) fn sign1_with_payload(payload: &Entries) -> Vec<u8> {
    let payload = TestCborValue::Map(payload.clone()).to_cbor();
    encode_cose_sign1(
        true,
        &es256_protected(),
        &[(
            TestCborKey::Int(33),
            TestCborValue::Array(vec![TestCborValue::Bytes(b"signer-der".to_vec())]),
        )],
        &payload,
        &[0x5a; 64],
    )
}

/// A well-formed certificate record with only the mandatory fields.
pub(crate) fn minimal_certificate_entries(n: u8) -> Entries {
    vec![
        (key("certificate"), TestCborValue::Bytes(vec![0x30, 0x82, n])),
        (key("serialNumber"), TestCborValue::Int(i64::from(n) + 1)),
        (key("ski"), TestCborValue::Bytes(vec![n; 20])),
        (key("docType"), TestCborValue::Array(vec![text(MDL_DOC_TYPE)])),
    ]
}

/// A well-formed payload with `certs` as `certificateInfos`.
pub(crate) fn payload_entries(certs: Vec<Entries>) -> Entries {
    vec![
        (key("version"), text("1.0")),
        (key("vicalProvider"), text("Example Provider")),
        (
            key("date"),
            TestCborValue::Tag(0, Box::new(text("2024-03-01T12:00:00Z"))),
        ),
        (
            key("certificateInfos"),
            TestCborValue::Array(certs.into_iter().map(TestCborValue::Map).collect()),
        ),
    ]
}

fn epoch(dt: &chrono::DateTime<chrono::Utc>) -> TestCborValue {
    TestCborValue::Tag(1, Box::new(TestCborValue::Int(dt.timestamp())))
}

fn text_array(items: &[String]) -> TestCborValue {
    TestCborValue::Array(items.iter().map(|s| TestCborValue::Text(s.clone())).collect())
}

fn serial(n: &BigUint) -> TestCborValue {
    TestCborValue::Tag(2, Box::new(TestCborValue::Bytes(n.to_bytes_be())))
}

/// Encodes a model certificate the way a VICAL provider would.
pub(crate) fn certificate_entries_from_model(c: &CertificateInfo) -> Entries {
    let mut e = vec![
        (key("certificate"), TestCborValue::Bytes(c.certificate.clone())),
        (key("serialNumber"), serial(&c.serial_number)),
        (key("ski"), TestCborValue::Bytes(c.ski.clone())),
        (key("docType"), text_array(&c.doc_type)),
    ];
    if let Some(p) = &c.certificate_profile {
        e.push((key("certificateProfile"), text_array(p)));
    }
    if let Some(s) = &c.issuing_authority {
        e.push((key("issuingAuthority"), text(s)));
    }
    if let Some(s) = &c.issuing_country {
        e.push((key("issuingCountry"), text(s)));
    }
    if let Some(s) = &c.state_or_province_name {
        e.push((key("stateOrProvinceName"), text(s)));
    }
    if let Some(b) = &c.issuer {
        e.push((key("issuer"), TestCborValue::Bytes(b.clone())));
    }
    if let Some(b) = &c.subject {
        e.push((key("subject"), TestCborValue::Bytes(b.clone())));
    }
    if let Some(dt) = &c.not_before {
        e.push((key("notBefore"), epoch(dt)));
    }
    if let Some(dt) = &c.not_after {
        e.push((key("notAfter"), epoch(dt)));
    }
    if let Some(m) = &c.extensions {
        e.push((key("extensions"), TestCborValue::Map(map_entries(m))));
    }
    e
}

/// Encodes a model VICAL payload.
pub(crate) fn payload_entries_from_model(v: &Vical) -> Entries {
    let mut e = vec![
        (key("version"), text(&v.version)),
        (key("vicalProvider"), text(&v.vical_provider)),
        (key("date"), epoch(&v.date)),
        (
            key("certificateInfos"),
            TestCborValue::Array(
                v.certificate_infos
                    .iter()
                    .map(|c| TestCborValue::Map(certificate_entries_from_model(c)))
                    .collect(),
            ),
        ),
    ];
    if let Some(id) = v.vical_issue_id {
        e.push((key("vicalIssueID"), TestCborValue::Int(i64::try_from(id).unwrap())));
    }
    if let Some(dt) = &v.next_update {
        e.push((key("nextUpdate"), epoch(dt)));
    }
    if let Some(m) = &v.extensions {
        e.push((key("extensions"), TestCborValue::Map(map_entries(m))));
    }
    e
}

/// A model certificate with only the mandatory fields set.
pub(crate) fn model_certificate(n: u8, country: Option<&str>, doc_types: &[&str]) -> CertificateInfo {
    CertificateInfo {
        certificate: vec![0x30, 0x82, n],
        serial_number: BigUint::from(u32::from(n) + 1),
        ski: vec![n; 20],
        doc_type: doc_types.iter().map(|s| s.to_string()).collect(),
        certificate_profile: None,
        issuing_authority: None,
        issuing_country: country.map(str::to_string),
        state_or_province_name: None,
        issuer: None,
        subject: None,
        not_before: None,
        not_after: None,
        extensions: None,
    }
}

/// A model list around `certs`.
pub(crate) fn model_vical(certs: Vec<CertificateInfo>) -> Vical {
    Vical {
        version: "1.0".to_string(),
        vical_provider: "Example Provider".to_string(),
        date: chrono::DateTime::from_timestamp(1_709_294_400, 0).unwrap(),
        vical_issue_id: None,
        next_update: None,
        certificate_infos: certs,
        extensions: None,
    }
}

pub(crate) fn ext_map(entries: &[(&str, CborValue)]) -> CborMap {
    entries
        .iter()
        .map(|(k, v)| (MapKey::Text(k.to_string()), v.clone()))
        .collect()
}
