// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Decoder and indexer for ISO 18013-5 Verified Issuer Certificate Authority Lists (VICAL).
//!
//! A VICAL is a COSE_Sign1 message whose payload lists trusted IACA root
//! certificates. This crate turns the untrusted bytes into a validated
//! [`SignedVical`] and offers lookups over its certificates. It never verifies
//! the signature; [`SignedVical`] exposes the algorithm, signer certificate and
//! Sig_structure bytes a verifier needs.

mod algorithms;
mod api;
mod cbor_value;
mod coerce;
mod cose_sign1;
mod error;
mod model;
mod payload;
mod query;
mod settings;

pub use algorithms::{algorithm_name, CoseAlgorithm};
pub use cbor_value::{decode_cbor_value, CborMap, CborValue, MapKey};
pub use cose_sign1::{
    decode_protected_header, extract_algorithm, extract_key_id, extract_signer_certificate, unwrap_cose_sign1,
    CoseSign1Envelope, COSE_SIGN1_TAG, HEADER_LABEL_ALG, HEADER_LABEL_KID, HEADER_LABEL_X5CHAIN,
    SIG_STRUCTURE_CONTEXT_SIGNATURE1,
};
pub use error::VicalParseError;
pub use model::{CertificateInfo, SignedVical, Vical};
pub use payload::{decode_vical_payload, vical_from_value};
pub use query::{build_trust_anchors, filter_by_doc_type, filter_mdl, find_by_country, find_by_ski, MDL_DOC_TYPE};
pub use settings::{ParseSettings, DEFAULT_MAX_DEPTH};

pub use api::{
    parse_vical, parse_vical_from_reader_with_max_len, parse_vical_from_reader_with_settings, parse_vical_with_settings,
};
