// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The single error kind produced while decoding a VICAL.
///
/// Sub-kinds (bad CBOR, bad envelope shape, missing or mistyped fields) are
/// distinguished by message only. Any error means the list must not be trusted.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct VicalParseError {
    message: String,
    #[source]
    source: Option<BoxedSource>,
}

impl VicalParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// A mandatory field was absent. `scope` is empty for top-level fields.
    pub fn missing_field(scope: &str, name: &str) -> Self {
        if scope.is_empty() {
            Self::new(format!("missing mandatory field `{name}`"))
        } else {
            Self::new(format!("{scope}: missing mandatory field `{name}`"))
        }
    }

    pub fn wrong_type(what: &str, expected: &str, got: &str) -> Self {
        Self::new(format!("{what} must be {expected}, got {got}"))
    }

    /// Wraps `self` as the source of a new error whose message is prefixed with `context`.
    pub fn context(self, context: &str) -> Self {
        let message = format!("{context}: {}", self.message);
        Self {
            message,
            source: Some(Box::new(self)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub(crate) fn cbor_error(message: &str, e: minicbor::decode::Error) -> VicalParseError {
    VicalParseError::with_source(format!("{message}: {e}"), e)
}
