//! Test utilities for sessions.
//!
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use rpc_bus::test_utils::{session_for_tests, RecordingTransport};
//! use std::sync::Arc;
//!
//! let transport = Arc::new(RecordingTransport::new());
//! let session = session_for_tests(transport.clone());
//! assert_eq!(transport.send_count(), 0);
//! assert!(!session.is_running());
//! ```

use crate::session::RpcSession;
use crate::transport::{JsonCodec, Transport, TransportError, WireCodec};
use async_trait::async_trait;
use parking_lot::Mutex;
use rpc_types::{CorrelationId, Envelope, MessageKind, ParamStore, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A transport that records every frame it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    frames: Mutex<Vec<Vec<u8>>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send fail with `Disconnected`.
    pub fn fail_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn send_count(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().clone()
    }

    /// Sent frames decoded with [`JsonCodec`]; undecodable frames are skipped.
    pub fn sent_envelopes(&self) -> Vec<Envelope> {
        self.frames
            .lock()
            .iter()
            .filter_map(|frame| JsonCodec.decode(frame).ok())
            .collect()
    }

    /// Kinds of the sent envelopes, in send order.
    pub fn sent_kinds(&self) -> Vec<MessageKind> {
        self.sent_envelopes()
            .iter()
            .map(|envelope| envelope.kind().clone())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Disconnected);
        }
        self.frames.lock().push(frame);
        Ok(())
    }
}

/// A session over `transport` with default configuration, not yet started.
pub fn session_for_tests(transport: Arc<RecordingTransport>) -> RpcSession {
    RpcSession::builder(transport).build()
}

/// JSON frame for a response to the request with `correlation_id`.
pub fn response_frame(kind: MessageKind, correlation_id: u32, success: bool) -> Vec<u8> {
    let mut params = ParamStore::new();
    params.insert("success", Value::Bool(success));
    params.insert("resultCode", Value::from(if success { "SUCCESS" } else { "REJECTED" }));
    encode(&Envelope::response(kind, CorrelationId::new(correlation_id), params))
}

/// JSON frame for a notification.
pub fn notification_frame(kind: MessageKind, params: ParamStore) -> Vec<u8> {
    encode(&Envelope::notification(kind, params))
}

fn encode(envelope: &Envelope) -> Vec<u8> {
    // Envelopes built from plain values always serialize
    JsonCodec.encode(envelope).unwrap_or_default()
}

/// Poll `condition` every few milliseconds until it holds or `timeout` passes.
pub async fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
