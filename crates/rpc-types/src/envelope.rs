//! # Message Envelope
//!
//! The wrapper for every message crossing the transport boundary.
//!
//! ## Properties
//!
//! - **Category**: request, response or notification, fixed at construction.
//! - **Correlation**: requests and responses carry a `correlation_id`;
//!   notifications never do.
//! - **Pairing**: a response answers the request with the same correlation id;
//!   envelope content plays no part in the match.

use crate::errors::DecodeError;
use crate::kind::MessageKind;
use crate::params::ParamStore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a message plays in an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageCategory {
    Request,
    Response,
    Notification,
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Response => write!(f, "response"),
            Self::Notification => write!(f, "notification"),
        }
    }
}

/// Identifier pairing a response with its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(u32);

impl CorrelationId {
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message kind, category and correlation id wrapped around its parameters.
///
/// Only the parameters are mutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope", into = "WireEnvelope")]
pub struct Envelope {
    kind: MessageKind,
    category: MessageCategory,
    correlation_id: Option<CorrelationId>,
    params: ParamStore,
}

impl Envelope {
    /// Create a request awaiting the response with the same correlation id.
    #[must_use]
    pub fn request(kind: MessageKind, correlation_id: CorrelationId, params: ParamStore) -> Self {
        Self {
            kind,
            category: MessageCategory::Request,
            correlation_id: Some(correlation_id),
            params,
        }
    }

    /// Create a response to the request with `correlation_id`.
    #[must_use]
    pub fn response(kind: MessageKind, correlation_id: CorrelationId, params: ParamStore) -> Self {
        Self {
            kind,
            category: MessageCategory::Response,
            correlation_id: Some(correlation_id),
            params,
        }
    }

    /// Create an uncorrelated notification.
    #[must_use]
    pub fn notification(kind: MessageKind, params: ParamStore) -> Self {
        Self {
            kind,
            category: MessageCategory::Notification,
            correlation_id: None,
            params,
        }
    }

    /// Rebuild an envelope from decoded parts, enforcing the correlation rules.
    pub fn from_parts(
        kind: MessageKind,
        category: MessageCategory,
        correlation_id: Option<CorrelationId>,
        params: ParamStore,
    ) -> Result<Self, DecodeError> {
        match (category, correlation_id) {
            (MessageCategory::Notification, Some(_)) => {
                Err(DecodeError::UnexpectedCorrelationId {
                    kind: kind.to_string(),
                })
            }
            (MessageCategory::Request | MessageCategory::Response, None) => {
                Err(DecodeError::MissingCorrelationId {
                    kind: kind.to_string(),
                    category: category.to_string(),
                })
            }
            _ => Ok(Self {
                kind,
                category,
                correlation_id,
                params,
            }),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    #[must_use]
    pub fn category(&self) -> MessageCategory {
        self.category
    }

    #[must_use]
    pub fn correlation_id(&self) -> Option<CorrelationId> {
        self.correlation_id
    }

    #[must_use]
    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParamStore {
        &mut self.params
    }

    #[must_use]
    pub fn into_params(self) -> ParamStore {
        self.params
    }

    #[must_use]
    pub fn is_request(&self) -> bool {
        self.category == MessageCategory::Request
    }

    #[must_use]
    pub fn is_response(&self) -> bool {
        self.category == MessageCategory::Response
    }

    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.category == MessageCategory::Notification
    }

    /// Whether this envelope is the response to `request`.
    #[must_use]
    pub fn is_reply_to(&self, request: &Envelope) -> bool {
        self.is_response()
            && request.is_request()
            && self.correlation_id.is_some()
            && self.correlation_id == request.correlation_id
    }
}

/// Wire shape of an envelope.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelope {
    kind: MessageKind,
    category: MessageCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correlation_id: Option<CorrelationId>,
    #[serde(default)]
    parameters: ParamStore,
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = DecodeError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        Envelope::from_parts(wire.kind, wire.category, wire.correlation_id, wire.parameters)
    }
}

impl From<Envelope> for WireEnvelope {
    fn from(envelope: Envelope) -> Self {
        WireEnvelope {
            kind: envelope.kind,
            category: envelope.category,
            correlation_id: envelope.correlation_id,
            parameters: envelope.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_reply_pairing_by_correlation_id() {
        let request =
            Envelope::request(MessageKind::SHOW, CorrelationId::new(7), ParamStore::new());

        let mut params = ParamStore::new();
        params.insert("success", Value::Bool(true));
        let reply = Envelope::response(MessageKind::SHOW, CorrelationId::new(7), params);
        let other = Envelope::response(MessageKind::SHOW, CorrelationId::new(8), ParamStore::new());

        assert!(reply.is_reply_to(&request));
        assert!(!other.is_reply_to(&request));
        assert!(!request.is_reply_to(&request));
    }

    #[test]
    fn test_from_parts_enforces_correlation_rules() {
        let missing = Envelope::from_parts(
            MessageKind::SHOW,
            MessageCategory::Request,
            None,
            ParamStore::new(),
        );
        assert!(matches!(missing, Err(DecodeError::MissingCorrelationId { .. })));

        let unexpected = Envelope::from_parts(
            MessageKind::ON_COMMAND,
            MessageCategory::Notification,
            Some(CorrelationId::new(1)),
            ParamStore::new(),
        );
        assert!(matches!(
            unexpected,
            Err(DecodeError::UnexpectedCorrelationId { .. })
        ));
    }

    #[test]
    fn test_wire_shape() {
        let envelope = Envelope::notification(MessageKind::ON_COMMAND, ParamStore::new());
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"kind":"OnCommand","category":"notification","parameters":{}}"#);

        let decoded: Envelope = serde_json::from_str(
            r#"{"kind":"Show","category":"response","correlationId":3,"parameters":{"success":true}}"#,
        )
        .unwrap();
        assert_eq!(decoded.correlation_id(), Some(CorrelationId::new(3)));
        assert_eq!(decoded.params().get("success"), Some(&Value::Bool(true)));
    }
}
