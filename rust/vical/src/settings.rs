// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Default maximum CBOR nesting depth accepted by the value decoder.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Limits and strictness knobs for VICAL parsing.
///
/// The decoder itself places no bound on input size; callers that read untrusted
/// input should pass these settings to `parse_vical_from_reader_with_settings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSettings {
    pub(crate) max_depth: usize,
    pub(crate) allow_trailing_bytes: bool,
}

impl ParseSettings {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            allow_trailing_bytes: false,
        }
    }

    /// Maximum nesting depth of arrays, maps and tags (applies to the outer message and the payload).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Accept data after the top-level CBOR item instead of rejecting it.
    pub fn with_trailing_bytes_allowed(mut self, allow: bool) -> Self {
        self.allow_trailing_bytes = allow;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn allow_trailing_bytes(&self) -> bool {
        self.allow_trailing_bytes
    }
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self::new()
    }
}
