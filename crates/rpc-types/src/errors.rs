//! # Error Types
//!
//! Errors raised while validating fields and crossing the transport boundary.

use thiserror::Error;

/// A single field failed its type or shape constraints.
///
/// Scoped to that field: callers reading a message treat the field as absent
/// and keep going.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown {type_name} value: {name}")]
    UnknownVariant { type_name: &'static str, name: String },

    #[error("value {value} out of range for {type_name}")]
    OutOfRange { type_name: &'static str, value: String },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid {type_name}: {reason}")]
    InvalidShape {
        type_name: &'static str,
        reason: String,
    },

    #[error("list is empty")]
    EmptyList,

    #[error("list element {index} is absent")]
    NullElement { index: usize },

    #[error("list mixes typed structs with untyped stores")]
    MixedList,

    #[error("element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("field {field}: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Attach the field name this error was raised for.
    #[must_use]
    pub fn in_field(self, field: &str) -> Self {
        ValidationError::Field {
            field: field.to_owned(),
            source: Box::new(self),
        }
    }

    /// Attach the list index this error was raised for.
    #[must_use]
    pub fn at_index(self, index: usize) -> Self {
        ValidationError::Element {
            index,
            source: Box::new(self),
        }
    }
}

/// A whole inbound payload could not be turned into an envelope.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("{category} {kind} is missing its correlation id")]
    MissingCorrelationId { kind: String, category: String },

    #[error("notification {kind} must not carry a correlation id")]
    UnexpectedCorrelationId { kind: String },
}

/// An outbound envelope could not be serialized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("serialization failed: {0}")]
    Serialization(String),
}
