//! # RPC Session
//!
//! One session per connection to a head unit. It owns the listener registry,
//! the pending request store, the lifecycle, and the single dispatch task
//! that drains the inbound queue in arrival order.
//!
//! ## Flow
//!
//! ```text
//! outbound: facade → Envelope → WireCodec::encode → Transport::send
//! inbound:  InboundSink::deliver → queue → dispatch task → Dispatcher
//!                                                          ├→ pending request
//!                                                          └→ registry handlers
//! ```
//!
//! `RpcSession` is a cheap handle; clones share the same session.

use crate::config::SessionConfig;
use crate::dispatcher::Dispatcher;
use crate::errors::{HandlerError, SessionError};
use crate::lifecycle::{Lifecycle, LifecycleError, LifecycleState};
use crate::pending::{PendingRequestStore, PendingResponse};
use crate::registry::{HandlerId, ListenerRegistry};
use crate::transport::{JsonCodec, Transport, TransportError, WireCodec};
use parking_lot::Mutex;
use rpc_types::{CorrelationId, Envelope, Facade, HmiLevel, MessageKind, ParamStore};
use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Callbacks for session-level events.
pub trait SessionListener: Send + Sync {
    /// The session is running and delivering notifications.
    fn on_start(&self, _session: &RpcSession) {}

    /// The session was destroyed. Called exactly once.
    fn on_destroy(&self) {}

    /// A frame failed to decode or a handler failed.
    fn on_error(&self, _context: &str, _error: &(dyn StdError + 'static)) {}
}

/// A message queued for sending without a typed facade at hand.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Request { kind: MessageKind, params: ParamStore },
    Notification { kind: MessageKind, params: ParamStore },
}

impl OutboundMessage {
    pub fn request<F: Facade>(message: F) -> Self {
        Self::Request {
            kind: F::KIND,
            params: message.into_params(),
        }
    }

    pub fn notification<F: Facade>(message: F) -> Self {
        Self::Notification {
            kind: F::KIND,
            params: message.into_params(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &MessageKind {
        match self {
            Self::Request { kind, .. } | Self::Notification { kind, .. } => kind,
        }
    }
}

type StartPredicate = Arc<dyn Fn(&Envelope) -> bool + Send + Sync>;

/// Messages sent once, the first time a trigger notification matches.
pub struct InitialSequence {
    trigger: MessageKind,
    predicate: StartPredicate,
    batch: Vec<OutboundMessage>,
}

impl InitialSequence {
    pub fn new<P>(trigger: MessageKind, predicate: P, batch: Vec<OutboundMessage>) -> Self
    where
        P: Fn(&Envelope) -> bool + Send + Sync + 'static,
    {
        Self {
            trigger,
            predicate: Arc::new(predicate),
            batch,
        }
    }

    /// Send `batch` on the first `OnHMIStatus` reporting HMI level `FULL`
    /// with `firstRun` set.
    pub fn on_first_hmi_full(batch: Vec<OutboundMessage>) -> Self {
        Self::new(
            MessageKind::ON_HMI_STATUS,
            |envelope| {
                let params = envelope.params();
                matches!(params.get_typed::<HmiLevel>("hmiLevel"), Ok(Some(HmiLevel::Full)))
                    && matches!(params.get_typed::<bool>("firstRun"), Ok(Some(true)))
            },
            batch,
        )
    }

    #[must_use]
    pub fn trigger(&self) -> &MessageKind {
        &self.trigger
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}

/// Entry point for inbound frames, handed to the transport.
#[derive(Clone)]
pub struct InboundSink {
    sender: mpsc::Sender<Vec<u8>>,
    lifecycle: Arc<Lifecycle>,
    session_id: Uuid,
}

impl InboundSink {
    /// Queue one inbound frame, waiting for room if the queue is full.
    ///
    /// Frames arriving while the session is not running are dropped.
    pub async fn deliver(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        if !self.accepting(&frame) {
            return Ok(());
        }

        match self.sender.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(frame)) => {
                warn!(
                    session_id = %self.session_id,
                    capacity = self.sender.max_capacity(),
                    "Inbound queue full, applying back-pressure"
                );
                self.sender
                    .send(frame)
                    .await
                    .map_err(|_| TransportError::InboundClosed)
            }
            Err(TrySendError::Closed(_)) => Err(TransportError::InboundClosed),
        }
    }

    /// Queue one inbound frame without waiting.
    pub fn try_deliver(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        if !self.accepting(&frame) {
            return Ok(());
        }

        self.sender.try_send(frame).map_err(|err| match err {
            TrySendError::Full(_) => {
                warn!(session_id = %self.session_id, "Inbound queue full, frame rejected");
                TransportError::InboundFull
            }
            TrySendError::Closed(_) => TransportError::InboundClosed,
        })
    }

    fn accepting(&self, frame: &[u8]) -> bool {
        let state = self.lifecycle.state();
        if state == LifecycleState::Running {
            return true;
        }
        debug!(
            session_id = %self.session_id,
            state = %state,
            bytes = frame.len(),
            "Dropping inbound frame, session not running"
        );
        false
    }
}

struct SessionInner {
    id: Uuid,
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    codec: Arc<dyn WireCodec>,
    dispatcher: Dispatcher,
    registry: ListenerRegistry,
    pending: Arc<PendingRequestStore>,
    lifecycle: Arc<Lifecycle>,
    listener: Option<Arc<dyn SessionListener>>,
    initial_sequence: Mutex<Option<InitialSequence>>,
    next_correlation_id: AtomicU32,
    inbound_tx: mpsc::Sender<Vec<u8>>,
    inbound_rx: Mutex<Option<mpsc::Receiver<Vec<u8>>>>,
    dispatch_task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if let Some(task) = self.dispatch_task.get_mut().take() {
            task.abort();
        }
    }
}

/// Builder for [`RpcSession`].
pub struct RpcSessionBuilder {
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    codec: Arc<dyn WireCodec>,
    listener: Option<Arc<dyn SessionListener>>,
    initial_sequence: Option<InitialSequence>,
}

impl RpcSessionBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn codec(mut self, codec: Arc<dyn WireCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn initial_sequence(mut self, sequence: InitialSequence) -> Self {
        self.initial_sequence = Some(sequence);
        self
    }

    pub fn build(self) -> RpcSession {
        let (inbound_tx, inbound_rx) = mpsc::channel(self.config.inbound_capacity.max(1));

        RpcSession {
            inner: Arc::new(SessionInner {
                id: Uuid::new_v4(),
                dispatcher: Dispatcher::new(&self.config),
                config: self.config,
                transport: self.transport,
                codec: self.codec,
                registry: ListenerRegistry::new(),
                pending: Arc::new(PendingRequestStore::new()),
                lifecycle: Arc::new(Lifecycle::new()),
                listener: self.listener,
                initial_sequence: Mutex::new(self.initial_sequence),
                next_correlation_id: AtomicU32::new(1),
                inbound_tx,
                inbound_rx: Mutex::new(Some(inbound_rx)),
                dispatch_task: Mutex::new(None),
            }),
        }
    }
}

/// Handle to one RPC session.
#[derive(Clone)]
pub struct RpcSession {
    inner: Arc<SessionInner>,
}

impl RpcSession {
    /// Start building a session over `transport`, with JSON frames by default.
    pub fn builder(transport: Arc<dyn Transport>) -> RpcSessionBuilder {
        RpcSessionBuilder {
            config: SessionConfig::default(),
            transport,
            codec: Arc::new(JsonCodec),
            listener: None,
            initial_sequence: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.inner.lifecycle.state()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.lifecycle.is_running()
    }

    /// Sink the transport feeds inbound frames into.
    #[must_use]
    pub fn inbound_sink(&self) -> InboundSink {
        InboundSink {
            sender: self.inner.inbound_tx.clone(),
            lifecycle: Arc::clone(&self.inner.lifecycle),
            session_id: self.inner.id,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ListenerRegistry {
        &self.inner.registry
    }

    /// Requests sent and not yet answered.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.inner.pending.pending_count()
    }

    /// Start delivering notifications.
    ///
    /// Must be called from within a tokio runtime. A session starts at most once.
    pub fn start(&self) -> Result<(), LifecycleError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| LifecycleError::NoRuntime)?;
        self.inner.lifecycle.begin_start()?;

        let receiver = self
            .inner
            .inbound_rx
            .lock()
            .take()
            .ok_or(LifecycleError::AlreadyStarted)?;

        if let Some(sequence) = self.inner.initial_sequence.lock().take() {
            self.install_initial_sequence(sequence);
        }

        self.inner.lifecycle.finish_start()?;
        let task = runtime.spawn(dispatch_loop(Arc::downgrade(&self.inner), receiver));
        *self.inner.dispatch_task.lock() = Some(task);

        info!(
            session_id = %self.inner.id,
            app = %self.inner.config.app_name,
            "Session started"
        );

        if let Some(listener) = &self.inner.listener {
            listener.on_start(self);
        }
        Ok(())
    }

    /// Stop delivering notifications and cancel outstanding requests.
    ///
    /// A stopped session cannot be started again.
    pub fn stop(&self) -> Result<(), LifecycleError> {
        self.inner.lifecycle.begin_stop()?;
        self.shutdown();
        self.inner.lifecycle.finish_stop()?;

        info!(session_id = %self.inner.id, "Session stopped");
        Ok(())
    }

    /// End the session for good: stop, drop every handler and notify the listener.
    pub fn destroy(&self) -> Result<(), LifecycleError> {
        let previous = self.inner.lifecycle.destroy()?;
        self.shutdown();
        self.inner.registry.unregister_all();

        info!(
            session_id = %self.inner.id,
            previous_state = %previous,
            "Session destroyed"
        );

        if let Some(listener) = &self.inner.listener {
            listener.on_destroy();
        }
        Ok(())
    }

    pub fn register_notification_handler<F>(&self, kind: MessageKind, handler: F) -> HandlerId
    where
        F: Fn(&Envelope, &RpcSession) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.inner.registry.register(kind, handler)
    }

    /// Set the handler for a command id; returns true if one was replaced.
    pub fn register_command_handler<F>(&self, command_id: u32, handler: F) -> bool
    where
        F: Fn(&Envelope, &RpcSession) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.inner.registry.register_command(command_id, handler)
    }

    pub fn unregister_handler(&self, id: HandlerId) -> bool {
        self.inner.registry.unregister(id)
    }

    /// Send a request and return once it is handed to the transport.
    pub async fn send_request<F: Facade>(
        &self,
        message: F,
    ) -> Result<PendingResponse, SessionError> {
        self.send_request_params(F::KIND, message.into_params()).await
    }

    /// Send a request and wait for its response.
    pub async fn request<F: Facade>(&self, message: F) -> Result<Envelope, SessionError> {
        self.send_request(message).await?.wait().await
    }

    pub async fn send_notification<F: Facade>(&self, message: F) -> Result<(), SessionError> {
        self.send_notification_params(F::KIND, message.into_params()).await
    }

    /// Send an untyped message. Requests return their pending response.
    pub async fn send(
        &self,
        message: OutboundMessage,
    ) -> Result<Option<PendingResponse>, SessionError> {
        match message {
            OutboundMessage::Request { kind, params } => {
                self.send_request_params(kind, params).await.map(Some)
            }
            OutboundMessage::Notification { kind, params } => {
                self.send_notification_params(kind, params).await.map(|()| None)
            }
        }
    }

    pub async fn send_request_params(
        &self,
        kind: MessageKind,
        params: ParamStore,
    ) -> Result<PendingResponse, SessionError> {
        self.inner.lifecycle.ensure_running()?;

        let correlation_id = self.next_correlation_id();
        let envelope = Envelope::request(kind, correlation_id, params);
        let frame = self.inner.codec.encode(&envelope)?;

        // Registered before sending so a fast response cannot be missed.
        // Holding the lifecycle lock means a concurrent stop either fails the
        // registration or cancels the entry afterwards.
        let receiver = self
            .inner
            .lifecycle
            .while_running(|| self.inner.pending.register(correlation_id, envelope.kind()))?;

        if !self.inner.pending.is_pending(&correlation_id) {
            debug!(
                correlation_id = %correlation_id,
                kind = %envelope.kind(),
                "Request cancelled before send"
            );
            return Err(SessionError::Cancelled);
        }

        if let Err(err) = self.inner.transport.send(frame).await {
            self.inner.pending.cancel(&correlation_id);
            warn!(
                correlation_id = %correlation_id,
                kind = %envelope.kind(),
                error = %err,
                "Failed to send request"
            );
            return Err(err.into());
        }

        debug!(correlation_id = %correlation_id, kind = %envelope.kind(), "Sent request");

        Ok(PendingResponse::new(
            correlation_id,
            receiver,
            self.inner.config.request_timeout,
            Arc::clone(&self.inner.pending),
        ))
    }

    pub async fn send_notification_params(
        &self,
        kind: MessageKind,
        params: ParamStore,
    ) -> Result<(), SessionError> {
        self.inner.lifecycle.ensure_running()?;

        let envelope = Envelope::notification(kind, params);
        let frame = self.inner.codec.encode(&envelope)?;
        // Stop may have run while encoding
        self.inner.lifecycle.ensure_running()?;
        self.inner.transport.send(frame).await?;

        debug!(kind = %envelope.kind(), "Sent notification");
        Ok(())
    }

    pub(crate) fn codec(&self) -> &dyn WireCodec {
        self.inner.codec.as_ref()
    }

    pub(crate) fn pending(&self) -> &PendingRequestStore {
        &self.inner.pending
    }

    #[cfg(test)]
    pub(crate) fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub(crate) fn report_error(&self, context: &str, error: &(dyn StdError + 'static)) {
        if let Some(listener) = &self.inner.listener {
            listener.on_error(context, error);
        }
    }

    fn next_correlation_id(&self) -> CorrelationId {
        CorrelationId::new(self.inner.next_correlation_id.fetch_add(1, Ordering::Relaxed))
    }

    fn shutdown(&self) {
        if let Some(task) = self.inner.dispatch_task.lock().take() {
            task.abort();
        }
        let cancelled = self.inner.pending.cancel_all();
        if cancelled > 0 {
            debug!(
                session_id = %self.inner.id,
                cancelled,
                "Cancelled pending requests on shutdown"
            );
        }
    }

    fn install_initial_sequence(&self, sequence: InitialSequence) {
        let InitialSequence {
            trigger,
            predicate,
            batch,
        } = sequence;
        let batch = Arc::new(batch);
        let fired = AtomicBool::new(false);

        self.inner.registry.register(trigger, move |envelope, session| {
            if !predicate(envelope) || fired.swap(true, Ordering::SeqCst) {
                return Ok(());
            }

            let session = session.clone();
            let batch = Arc::clone(&batch);
            tokio::spawn(async move { session.send_batch(&batch).await });
            Ok(())
        });
    }

    async fn send_batch(&self, batch: &[OutboundMessage]) {
        info!(session_id = %self.inner.id, count = batch.len(), "Sending initial sequence");

        for message in batch {
            match self.send(message.clone()).await {
                Ok(Some(pending)) => {
                    let kind = message.kind().clone();
                    tokio::spawn(async move {
                        if let Err(err) = pending.wait().await {
                            warn!(kind = %kind, error = %err, "Initial sequence request failed");
                        }
                    });
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        kind = %message.kind(),
                        error = %err,
                        "Failed to send initial sequence message"
                    );
                }
            }
        }
    }
}

async fn dispatch_loop(session: Weak<SessionInner>, mut receiver: mpsc::Receiver<Vec<u8>>) {
    while let Some(frame) = receiver.recv().await {
        let Some(inner) = session.upgrade() else {
            break;
        };
        let handle = RpcSession { inner };
        handle.inner.dispatcher.dispatch_frame(&handle, &frame);
    }
    debug!("Dispatch loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{session_for_tests, RecordingTransport};
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingListener {
        started: AtomicUsize,
        destroyed: AtomicUsize,
    }

    impl SessionListener for CountingListener {
        fn on_start(&self, _session: &RpcSession) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }

        fn on_destroy(&self) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_start_requires_runtime() {
        let session = session_for_tests(Arc::new(RecordingTransport::new()));
        assert_eq!(session.start(), Err(LifecycleError::NoRuntime));
        assert_eq!(session.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_destroy_notifies_once() {
        let listener = Arc::new(CountingListener::default());
        let session = RpcSession::builder(Arc::new(RecordingTransport::new()))
            .listener(listener.clone())
            .build();

        session.start().unwrap();
        assert_eq!(listener.started.load(Ordering::SeqCst), 1);
        session.register_command_handler(1, |_, _| Ok(()));

        session.destroy().unwrap();
        assert_eq!(session.destroy(), Err(LifecycleError::Destroyed));
        assert_eq!(listener.destroyed.load(Ordering::SeqCst), 1);
        assert_eq!(session.registry().handler_count(), 0);
        assert_eq!(session.state(), LifecycleState::Destroyed);
    }

    #[tokio::test]
    async fn test_correlation_ids_increase() {
        let transport = Arc::new(RecordingTransport::new());
        let session = session_for_tests(transport.clone());
        session.start().unwrap();

        let first = session
            .send_request_params(MessageKind::SHOW, ParamStore::new())
            .await
            .unwrap();
        let second = session
            .send_request_params(MessageKind::SHOW, ParamStore::new())
            .await
            .unwrap();

        assert_eq!(first.correlation_id(), CorrelationId::new(1));
        assert_eq!(second.correlation_id(), CorrelationId::new(2));
        assert_eq!(session.pending_requests(), 2);
    }

    #[tokio::test]
    async fn test_failed_send_leaves_nothing_pending() {
        let transport = Arc::new(RecordingTransport::new());
        transport.fail_sends(true);
        let session = session_for_tests(transport.clone());
        session.start().unwrap();

        let result = session
            .send_request_params(MessageKind::SHOW, ParamStore::new())
            .await;
        assert!(matches!(
            result,
            Err(SessionError::Transport(TransportError::Disconnected))
        ));
        assert_eq!(session.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_frames_before_start_are_dropped() {
        let session = session_for_tests(Arc::new(RecordingTransport::new()));
        let sink = session.inbound_sink();

        assert!(sink.try_deliver(b"{}".to_vec()).is_ok());
        session.start().unwrap();
        session.stop().unwrap();
        assert!(sink.deliver(b"{}".to_vec()).await.is_ok());
    }
}
