//! Pending Request Store - pairs inbound responses with waiting callers.
//!
//! Flow:
//! 1. `send_request` allocates a correlation id and calls `register()`
//! 2. The encoded request is handed to the transport
//! 3. The dispatch loop receives the response and calls `complete()`
//! 4. The caller awaits its [`PendingResponse`] or times out
//!
//! Stopping the session calls `cancel_all()`, so nothing waits forever.
//! Dropping a [`PendingResponse`] unregisters its request.

use crate::errors::SessionError;
use dashmap::DashMap;
use rpc_types::{CorrelationId, Envelope, MessageKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// What a waiting caller eventually receives.
pub type ResponseResult = Result<Envelope, SessionError>;

/// A request waiting for its response
struct PendingRequest {
    sender: oneshot::Sender<ResponseResult>,
    created_at: Instant,
    /// Request kind (for logging)
    kind: MessageKind,
}

/// Counters for the pending request store
#[derive(Debug, Default)]
pub struct PendingStats {
    pub total_registered: AtomicU64,
    pub total_completed: AtomicU64,
    pub total_timeouts: AtomicU64,
    /// Cancelled by the session, or abandoned by the caller
    pub total_cancelled: AtomicU64,
}

/// Correlation id → waiting caller.
#[derive(Default)]
pub struct PendingRequestStore {
    pending: DashMap<CorrelationId, PendingRequest>,
    stats: PendingStats,
}

impl PendingRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request and get the receiver for its outcome.
    pub fn register(
        &self,
        correlation_id: CorrelationId,
        kind: &MessageKind,
    ) -> oneshot::Receiver<ResponseResult> {
        let (tx, rx) = oneshot::channel();

        let request = PendingRequest {
            sender: tx,
            created_at: Instant::now(),
            kind: kind.clone(),
        };

        self.pending.insert(correlation_id, request);
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(
            correlation_id = %correlation_id,
            kind = %kind,
            "Registered pending request"
        );

        rx
    }

    /// Resolve a pending request.
    ///
    /// Returns false if the id is unknown, already completed, or expired.
    pub fn complete(&self, correlation_id: CorrelationId, result: ResponseResult) -> bool {
        let Some((_, pending)) = self.pending.remove(&correlation_id) else {
            warn!(
                correlation_id = %correlation_id,
                "Response for unknown or already resolved correlation id"
            );
            return false;
        };

        let response_time = pending.created_at.elapsed();
        match pending.sender.send(result) {
            Ok(()) => {
                self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    kind = %pending.kind,
                    response_time_ms = response_time.as_millis(),
                    "Completed pending request"
                );
                true
            }
            Err(_) => {
                // Caller dropped its PendingResponse
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    kind = %pending.kind,
                    "Pending request receiver dropped"
                );
                false
            }
        }
    }

    /// Drop a request without resolving it.
    pub fn cancel(&self, correlation_id: &CorrelationId) -> bool {
        if self.pending.remove(correlation_id).is_some() {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Drop a request whose caller gave up waiting.
    pub fn expire(&self, correlation_id: &CorrelationId, waited: Duration) -> bool {
        let Some((_, pending)) = self.pending.remove(correlation_id) else {
            return false;
        };
        self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
        warn!(
            correlation_id = %correlation_id,
            kind = %pending.kind,
            timeout_ms = waited.as_millis(),
            "Request timed out"
        );
        true
    }

    /// Resolve every outstanding request with `Cancelled`.
    ///
    /// Returns the number of requests cancelled.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<CorrelationId> = self.pending.iter().map(|entry| *entry.key()).collect();
        let mut cancelled = 0;

        for id in ids {
            if let Some((_, pending)) = self.pending.remove(&id) {
                // The receiver may already be gone; the count still reflects the cancel
                let _ = pending.sender.send(Err(SessionError::Cancelled));
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                cancelled += 1;
            }
        }

        if cancelled > 0 {
            debug!(cancelled, "Cancelled outstanding requests");
        }
        cancelled
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.contains_key(correlation_id)
    }

    #[must_use]
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

/// Handle to the outcome of one sent request.
///
/// The request has already been handed to the transport when this exists.
#[must_use = "a pending response does nothing unless awaited"]
pub struct PendingResponse {
    correlation_id: CorrelationId,
    receiver: oneshot::Receiver<ResponseResult>,
    timeout: Duration,
    store: Arc<PendingRequestStore>,
}

impl PendingResponse {
    pub(crate) fn new(
        correlation_id: CorrelationId,
        receiver: oneshot::Receiver<ResponseResult>,
        timeout: Duration,
        store: Arc<PendingRequestStore>,
    ) -> Self {
        Self {
            correlation_id,
            receiver,
            timeout,
            store,
        }
    }

    #[must_use]
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Wait for the response, the timeout, or cancellation.
    pub async fn wait(mut self) -> ResponseResult {
        match tokio::time::timeout(self.timeout, &mut self.receiver).await {
            Ok(Ok(result)) => result,
            // Sender dropped without a result
            Ok(Err(_)) => Err(SessionError::Cancelled),
            Err(_) => {
                self.store.expire(&self.correlation_id, self.timeout);
                Err(SessionError::Timeout(self.timeout))
            }
        }
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        // No-op once the request was resolved, expired or cancelled
        self.store.cancel(&self.correlation_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpc_types::ParamStore;

    fn response(id: u32) -> Envelope {
        Envelope::response(MessageKind::SHOW, CorrelationId::new(id), ParamStore::new())
    }

    #[tokio::test]
    async fn test_register_and_complete() {
        let store = PendingRequestStore::new();
        let id = CorrelationId::new(1);

        let rx = store.register(id, &MessageKind::SHOW);
        assert!(store.is_pending(&id));

        assert!(store.complete(id, Ok(response(1))));
        assert!(!store.complete(id, Ok(response(1))));

        let envelope = rx.await.unwrap().unwrap();
        assert_eq!(envelope.correlation_id(), Some(id));
        assert_eq!(store.pending_count(), 0);
        assert_eq!(store.stats().total_completed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_dropped_response_releases_entry() {
        let store = Arc::new(PendingRequestStore::new());
        let id = CorrelationId::new(5);
        let rx = store.register(id, &MessageKind::SHOW);

        let pending = PendingResponse::new(id, rx, Duration::from_secs(5), Arc::clone(&store));
        assert!(store.is_pending(&id));

        drop(pending);
        assert!(!store.is_pending(&id));
        assert_eq!(store.stats().total_cancelled.load(Ordering::Relaxed), 1);
        assert!(!store.complete(id, Ok(response(5))));
    }

    #[tokio::test]
    async fn test_resolved_response_drop_counts_nothing() {
        let store = Arc::new(PendingRequestStore::new());
        let id = CorrelationId::new(6);
        let rx = store.register(id, &MessageKind::SHOW);
        let pending = PendingResponse::new(id, rx, Duration::from_secs(5), Arc::clone(&store));

        assert!(store.complete(id, Ok(response(6))));
        assert!(pending.wait().await.is_ok());
        assert_eq!(store.stats().total_cancelled.load(Ordering::Relaxed), 0);
        assert_eq!(store.stats().total_completed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_cancel_all_resolves_waiters() {
        let store = PendingRequestStore::new();
        let rx1 = store.register(CorrelationId::new(1), &MessageKind::SHOW);
        let rx2 = store.register(CorrelationId::new(2), &MessageKind::SPEAK);

        assert_eq!(store.cancel_all(), 2);
        assert_eq!(rx1.await.unwrap(), Err(SessionError::Cancelled));
        assert_eq!(rx2.await.unwrap(), Err(SessionError::Cancelled));
        assert_eq!(store.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_pending_response_times_out() {
        let store = Arc::new(PendingRequestStore::new());
        let id = CorrelationId::new(5);
        let rx = store.register(id, &MessageKind::SHOW);

        let pending = PendingResponse::new(id, rx, Duration::from_millis(10), store.clone());
        assert!(matches!(pending.wait().await, Err(SessionError::Timeout(_))));

        assert!(!store.is_pending(&id));
        assert_eq!(store.stats().total_timeouts.load(Ordering::Relaxed), 1);
        // A late response is dropped
        assert!(!store.complete(id, Ok(response(5))));
    }

    #[tokio::test]
    async fn test_cancel() {
        let store = PendingRequestStore::new();
        let id = CorrelationId::new(9);
        let _rx = store.register(id, &MessageKind::SHOW);

        assert!(store.cancel(&id));
        assert!(!store.cancel(&id));
    }
}
