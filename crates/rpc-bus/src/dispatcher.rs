//! # Inbound Dispatch
//!
//! Classifies each inbound envelope and routes it:
//!
//! 1. **Response** with an outstanding correlation id: resolves the waiting
//!    request and never reaches the registry. Unknown or duplicate ids are
//!    logged and dropped.
//! 2. **Notification**: every handler registered for its kind, in order.
//! 3. **Command notification** carrying a command id: additionally the command
//!    handler for that id.
//! 4. **Request** from the peer: logged and dropped.
//!
//! Handler snapshots are taken before the first handler runs. A failing or
//! panicking handler is logged and the remaining handlers still run.

use crate::config::SessionConfig;
use crate::errors::{HandlerError, SessionError};
use crate::registry::NotificationHandler;
use crate::session::RpcSession;
use crate::telemetry;
use rpc_types::{CorrelationId, Envelope, MessageCategory, MessageKind, ResultCode};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Completed the request with this correlation id.
    Resolved(CorrelationId),
    /// Response with no outstanding request; dropped.
    UnmatchedResponse(CorrelationId),
    /// Notification handed to `handlers` kind handlers, plus the command
    /// handler when `command` is set.
    Delivered { handlers: usize, command: bool },
    /// Notification nobody listens for.
    Unhandled,
    /// Request from the peer; dropped.
    DroppedRequest,
    /// The session was not running; dropped.
    NotRunning,
    /// The frame did not decode; dropped.
    Malformed,
}

/// Routes decoded envelopes to pending requests and registered handlers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    command_kind: MessageKind,
    command_id_key: String,
}

impl Dispatcher {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            command_kind: config.command_kind.clone(),
            command_id_key: config.command_id_key.clone(),
        }
    }

    /// Decode and dispatch one raw frame.
    pub fn dispatch_frame(&self, session: &RpcSession, frame: &[u8]) -> DispatchOutcome {
        match session.codec().decode(frame) {
            Ok(envelope) => self.dispatch(session, envelope),
            Err(err) => {
                warn!(
                    session_id = %session.id(),
                    bytes = frame.len(),
                    error = %err,
                    "Dropping undecodable frame"
                );
                session.report_error("decode inbound frame", &err);
                DispatchOutcome::Malformed
            }
        }
    }

    pub fn dispatch(&self, session: &RpcSession, envelope: Envelope) -> DispatchOutcome {
        if !session.is_running() {
            debug!(
                session_id = %session.id(),
                state = %session.state(),
                kind = %envelope.kind(),
                "Dropping frame, session not running"
            );
            return DispatchOutcome::NotRunning;
        }

        if telemetry::is_debug_enabled() {
            debug!(
                kind = %envelope.kind(),
                category = %envelope.category(),
                correlation_id = ?envelope.correlation_id().map(CorrelationId::value),
                params = ?envelope.params(),
                "Inbound envelope"
            );
        }

        match envelope.category() {
            MessageCategory::Response => self.resolve(session, envelope),
            MessageCategory::Notification => self.fan_out(session, &envelope),
            MessageCategory::Request => {
                warn!(
                    kind = %envelope.kind(),
                    correlation_id = ?envelope.correlation_id().map(CorrelationId::value),
                    "Dropping inbound request from peer"
                );
                DispatchOutcome::DroppedRequest
            }
        }
    }

    fn resolve(&self, session: &RpcSession, envelope: Envelope) -> DispatchOutcome {
        let Some(correlation_id) = envelope.correlation_id() else {
            return DispatchOutcome::Malformed;
        };

        if !session.pending().is_pending(&correlation_id) {
            warn!(
                correlation_id = %correlation_id,
                kind = %envelope.kind(),
                "Dropping response with no outstanding request"
            );
            return DispatchOutcome::UnmatchedResponse(correlation_id);
        }

        if session.pending().complete(correlation_id, response_outcome(envelope)) {
            DispatchOutcome::Resolved(correlation_id)
        } else {
            DispatchOutcome::UnmatchedResponse(correlation_id)
        }
    }

    fn fan_out(&self, session: &RpcSession, envelope: &Envelope) -> DispatchOutcome {
        let handlers = session.registry().handlers_for(envelope.kind());
        let command_handler = self.command_handler(session, envelope);

        if handlers.is_empty() && command_handler.is_none() {
            debug!(kind = %envelope.kind(), "No handlers for notification");
            return DispatchOutcome::Unhandled;
        }

        for handler in &handlers {
            invoke(session, envelope, handler);
        }
        if let Some(handler) = &command_handler {
            invoke(session, envelope, handler);
        }

        DispatchOutcome::Delivered {
            handlers: handlers.len(),
            command: command_handler.is_some(),
        }
    }

    fn command_handler(
        &self,
        session: &RpcSession,
        envelope: &Envelope,
    ) -> Option<NotificationHandler> {
        if envelope.kind() != &self.command_kind {
            return None;
        }

        match envelope.params().get_typed::<u32>(&self.command_id_key) {
            Ok(Some(command_id)) => {
                let handler = session.registry().command_handler(command_id);
                if handler.is_none() {
                    debug!(command_id, "No handler for command");
                }
                handler
            }
            Ok(None) => {
                debug!(key = %self.command_id_key, "Command notification without command id");
                None
            }
            Err(err) => {
                warn!(error = %err, "Malformed command id");
                None
            }
        }
    }
}

/// Map a response to the caller's result: `success = false` is a rejection.
fn response_outcome(envelope: Envelope) -> Result<Envelope, SessionError> {
    let params = envelope.params();
    match params.get_typed::<bool>("success") {
        Ok(Some(false)) => Err(SessionError::Rejected {
            result_code: params.get_typed::<ResultCode>("resultCode").ok().flatten(),
            info: params.get_typed::<String>("info").ok().flatten(),
        }),
        _ => Ok(envelope),
    }
}

fn invoke(session: &RpcSession, envelope: &Envelope, handler: &NotificationHandler) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| handler(envelope, session)))
        .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(payload.as_ref()))));

    if let Err(err) = result {
        error!(
            session_id = %session.id(),
            kind = %envelope.kind(),
            error = %err,
            "Notification handler failed"
        );
        session.report_error("notification handler", &err);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{session_for_tests, RecordingTransport};
    use rpc_types::{ParamStore, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn on_command(cmd_id: i64) -> Envelope {
        let mut params = ParamStore::new();
        params.insert("cmdID", Value::Integer(cmd_id));
        Envelope::notification(MessageKind::ON_COMMAND, params)
    }

    fn counter() -> (
        Arc<AtomicUsize>,
        impl Fn(&Envelope, &RpcSession) -> Result<(), HandlerError> + Send + Sync + 'static,
    ) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = count.clone();
        (count, move |_: &Envelope, _: &RpcSession| {
            handle.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_not_running_drops() {
        let session = session_for_tests(Arc::new(RecordingTransport::new()));
        let (count, handler) = counter();
        session.register_notification_handler(MessageKind::ON_COMMAND, handler);

        assert_eq!(
            session.dispatcher().dispatch(&session, on_command(1)),
            DispatchOutcome::NotRunning
        );
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panicking_handler_does_not_stop_others() {
        let session = session_for_tests(Arc::new(RecordingTransport::new()));
        session.start().unwrap();

        session.register_notification_handler(MessageKind::ON_COMMAND, |_, _| {
            panic!("boom");
        });
        session.register_notification_handler(MessageKind::ON_COMMAND, |_, _| {
            Err(HandlerError::failed("nope"))
        });
        let (count, handler) = counter();
        session.register_notification_handler(MessageKind::ON_COMMAND, handler);

        let outcome = session.dispatcher().dispatch(&session, on_command(1));
        assert_eq!(
            outcome,
            DispatchOutcome::Delivered {
                handlers: 3,
                command: false
            }
        );
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_command_handler_without_kind_handler() {
        let session = session_for_tests(Arc::new(RecordingTransport::new()));
        session.start().unwrap();
        let (count, handler) = counter();
        session.register_command_handler(5, handler);

        assert_eq!(
            session.dispatcher().dispatch(&session, on_command(5)),
            DispatchOutcome::Delivered {
                handlers: 0,
                command: true
            }
        );
        assert_eq!(
            session.dispatcher().dispatch(&session, on_command(6)),
            DispatchOutcome::Unhandled
        );
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_peer_request_and_unknown_response_are_dropped() {
        let session = session_for_tests(Arc::new(RecordingTransport::new()));
        session.start().unwrap();

        let request =
            Envelope::request(MessageKind::SHOW, CorrelationId::new(1), ParamStore::new());
        assert_eq!(
            session.dispatcher().dispatch(&session, request),
            DispatchOutcome::DroppedRequest
        );

        let response =
            Envelope::response(MessageKind::SHOW, CorrelationId::new(77), ParamStore::new());
        assert_eq!(
            session.dispatcher().dispatch(&session, response),
            DispatchOutcome::UnmatchedResponse(CorrelationId::new(77))
        );
    }

    #[tokio::test]
    async fn test_unknown_kind_is_ignored() {
        let session = session_for_tests(Arc::new(RecordingTransport::new()));
        session.start().unwrap();

        let envelope =
            Envelope::notification(MessageKind::new("OnWayPointChange"), ParamStore::new());
        assert_eq!(
            session.dispatcher().dispatch(&session, envelope),
            DispatchOutcome::Unhandled
        );
        assert_eq!(
            session.dispatcher().dispatch_frame(&session, b"{"),
            DispatchOutcome::Malformed
        );
    }

    #[test]
    fn test_rejection_mapping() {
        let params: ParamStore = serde_json::from_str(
            r#"{"success":false,"resultCode":"DISALLOWED","info":"not now"}"#,
        )
        .unwrap();
        let envelope = Envelope::response(MessageKind::SHOW, CorrelationId::new(1), params);

        assert_eq!(
            response_outcome(envelope),
            Err(SessionError::Rejected {
                result_code: Some(ResultCode::Disallowed),
                info: Some("not now".to_string()),
            })
        );

        let ok = Envelope::response(MessageKind::SHOW, CorrelationId::new(2), ParamStore::new());
        assert!(response_outcome(ok).is_ok());
    }
}
