//! # Listener Registry
//!
//! Two maps: message kind → ordered handler list, and command id → a single
//! handler.
//!
//! Lookups hand out snapshots. No lock is held while a handler runs, so a
//! handler may register or unregister; the change is seen from the next
//! dispatch pass on.

use crate::errors::HandlerError;
use crate::session::RpcSession;
use parking_lot::RwLock;
use rpc_types::{Envelope, MessageKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Callback invoked with each matching inbound notification.
pub type NotificationHandler =
    Arc<dyn Fn(&Envelope, &RpcSession) -> Result<(), HandlerError> + Send + Sync>;

/// Identifies one kind-level registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(Uuid);

impl HandlerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
pub struct ListenerRegistry {
    by_kind: RwLock<HashMap<MessageKind, Vec<(HandlerId, NotificationHandler)>>>,
    by_command: RwLock<HashMap<u32, NotificationHandler>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for `kind`. Handlers for a kind fire in registration order.
    pub fn register<F>(&self, kind: MessageKind, handler: F) -> HandlerId
    where
        F: Fn(&Envelope, &RpcSession) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let id = HandlerId::new();
        debug!(kind = %kind, handler_id = %id, "Registered notification handler");
        self.by_kind
            .write()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Set the handler for a command id, replacing any previous one.
    ///
    /// Returns true if a handler was replaced.
    pub fn register_command<F>(&self, command_id: u32, handler: F) -> bool
    where
        F: Fn(&Envelope, &RpcSession) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let replaced = self
            .by_command
            .write()
            .insert(command_id, Arc::new(handler))
            .is_some();
        debug!(command_id, replaced, "Registered command handler");
        replaced
    }

    /// Remove one kind-level handler.
    pub fn unregister(&self, id: HandlerId) -> bool {
        let mut by_kind = self.by_kind.write();
        let mut removed = false;
        by_kind.retain(|_, handlers| {
            let before = handlers.len();
            handlers.retain(|(handler_id, _)| *handler_id != id);
            removed |= handlers.len() != before;
            !handlers.is_empty()
        });
        removed
    }

    pub fn unregister_command(&self, command_id: u32) -> bool {
        self.by_command.write().remove(&command_id).is_some()
    }

    /// Remove every kind and command handler.
    pub fn unregister_all(&self) {
        self.by_kind.write().clear();
        self.by_command.write().clear();
    }

    /// Snapshot of the handlers for `kind`, in registration order.
    #[must_use]
    pub fn handlers_for(&self, kind: &MessageKind) -> Vec<NotificationHandler> {
        self.by_kind
            .read()
            .get(kind)
            .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn command_handler(&self, command_id: u32) -> Option<NotificationHandler> {
        self.by_command.read().get(&command_id).cloned()
    }

    #[must_use]
    pub fn has_handlers(&self, kind: &MessageKind) -> bool {
        self.by_kind.read().contains_key(kind)
    }

    /// Total kind-level plus command handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        let kinds: usize = self.by_kind.read().values().map(Vec::len).sum();
        kinds + self.by_command.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{session_for_tests, RecordingTransport};
    use rpc_types::ParamStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ok(_: &Envelope, _: &RpcSession) -> Result<(), HandlerError> {
        Ok(())
    }

    #[test]
    fn test_handlers_fire_in_registration_order() {
        let registry = ListenerRegistry::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for tag in 0..3 {
            let order = order.clone();
            registry.register(MessageKind::ON_HMI_STATUS, move |_, _| {
                order.lock().push(tag);
                Ok(())
            });
        }

        let session = session_for_tests(Arc::new(RecordingTransport::new()));
        let envelope = Envelope::notification(MessageKind::ON_HMI_STATUS, ParamStore::new());
        for handler in registry.handlers_for(&MessageKind::ON_HMI_STATUS) {
            handler(&envelope, &session).unwrap();
        }

        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_snapshot_ignores_later_registration() {
        let registry = ListenerRegistry::new();
        registry.register(MessageKind::ON_COMMAND, ok);

        let snapshot = registry.handlers_for(&MessageKind::ON_COMMAND);
        registry.register(MessageKind::ON_COMMAND, ok);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.handlers_for(&MessageKind::ON_COMMAND).len(), 2);
    }

    #[test]
    fn test_command_handler_replaces() {
        let registry = ListenerRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        assert!(!registry.register_command(7, ok));
        let counter = calls.clone();
        assert!(registry.register_command(7, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        let session = session_for_tests(Arc::new(RecordingTransport::new()));
        let envelope = Envelope::notification(MessageKind::ON_COMMAND, ParamStore::new());
        registry.command_handler(7).unwrap()(&envelope, &session).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.handler_count(), 1);
    }

    #[test]
    fn test_unregister() {
        let registry = ListenerRegistry::new();
        let first = registry.register(MessageKind::SHOW, ok);
        registry.register(MessageKind::SHOW, ok);
        registry.register_command(1, ok);

        assert!(registry.unregister(first));
        assert!(!registry.unregister(first));
        assert_eq!(registry.handlers_for(&MessageKind::SHOW).len(), 1);

        registry.unregister_all();
        assert_eq!(registry.handler_count(), 0);
        assert!(!registry.has_handlers(&MessageKind::SHOW));
        assert!(registry.command_handler(1).is_none());
    }
}
