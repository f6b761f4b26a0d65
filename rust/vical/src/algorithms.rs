// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// COSE signature algorithms commonly used to sign a VICAL (IANA COSE Algorithms registry).
///
/// The decoder accepts any algorithm id; this enum only names the known ones.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i64)]
pub enum CoseAlgorithm {
    /// ECDSA w/ SHA-256.
    ES256 = -7,
    /// EdDSA.
    EdDSA = -8,
    /// ECDSA w/ SHA-384.
    ES384 = -35,
    /// ECDSA w/ SHA-512.
    ES512 = -36,
}

impl CoseAlgorithm {
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            -7 => Some(Self::ES256),
            -8 => Some(Self::EdDSA),
            -35 => Some(Self::ES384),
            -36 => Some(Self::ES512),
            _ => None,
        }
    }

    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ES256 => "ES256",
            Self::EdDSA => "EdDSA",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
        }
    }
}

/// Human-readable name for a COSE algorithm id; `"unknown"` for unregistered ids.
pub fn algorithm_name(id: i64) -> &'static str {
    CoseAlgorithm::from_id(id).map_or("unknown", CoseAlgorithm::name)
}
