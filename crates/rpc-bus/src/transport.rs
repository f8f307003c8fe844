//! # Transport Boundary
//!
//! The session talks to the physical link only through [`Transport`] for
//! outbound frames and an [`InboundSink`](crate::InboundSink) for inbound
//! ones. [`WireCodec`] turns frames into envelopes and back.

use async_trait::async_trait;
use rpc_types::{DecodeError, EncodeError, Envelope};
use thiserror::Error;

/// Errors raised by a transport or the inbound sink.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport disconnected")]
    Disconnected,

    #[error("transport I/O failure: {0}")]
    Io(String),

    /// The session is no longer accepting inbound frames.
    #[error("inbound channel closed")]
    InboundClosed,

    /// The inbound queue is full; retry or use the awaiting `deliver`.
    #[error("inbound queue full")]
    InboundFull,
}

/// Outbound half of the physical link.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Hand one encoded frame to the link.
    async fn send(&self, frame: Vec<u8>) -> Result<(), TransportError>;
}

/// Frame format on the link.
pub trait WireCodec: Send + Sync {
    fn decode(&self, frame: &[u8]) -> Result<Envelope, DecodeError>;

    fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, EncodeError>;
}

/// JSON frames: `{"kind", "category", "correlationId"?, "parameters"}`.
///
/// Parameter order is preserved in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl WireCodec for JsonCodec {
    fn decode(&self, frame: &[u8]) -> Result<Envelope, DecodeError> {
        serde_json::from_slice(frame).map_err(|e| DecodeError::Malformed(e.to_string()))
    }

    fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(envelope).map_err(|e| EncodeError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpc_types::{CorrelationId, MessageKind, ParamStore, Value};

    #[test]
    fn test_json_codec_preserves_order() {
        let mut params = ParamStore::new();
        params.insert("zeta", Value::Integer(1));
        params.insert("alpha", Value::Integer(2));
        let envelope = Envelope::request(MessageKind::SHOW, CorrelationId::new(4), params);

        let frame = JsonCodec.encode(&envelope).unwrap();
        assert_eq!(
            String::from_utf8(frame.clone()).unwrap(),
            r#"{"kind":"Show","category":"request","correlationId":4,"parameters":{"zeta":1,"alpha":2}}"#
        );

        let decoded = JsonCodec.decode(&frame).unwrap();
        assert_eq!(decoded.params().keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        assert!(matches!(
            JsonCodec.decode(b"not json"),
            Err(DecodeError::Malformed(_))
        ));
        assert!(JsonCodec
            .decode(br#"{"kind":"Show","category":"request","parameters":{}}"#)
            .is_err());
    }
}
