use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;

use crate::domain::event::{DomainEvent, EventRecord};

// ============================================================================
// Handler Registry - type-keyed handler store
// ============================================================================
//
// Maps an event type to the ordered list of handlers registered for it.
// Insertion order defines invocation order. Nothing stops the same handler
// from being registered twice; it is then invoked once per registration, in
// FIFO order.
//
// ============================================================================

/// A consumer capability invoked for every dispatched event of type `E`.
///
/// Handlers run synchronously on the publisher's thread; a handler that
/// blocks, blocks the publish call.
pub trait EventHandler<E: DomainEvent>: Send + Sync {
    fn handle(&self, event: &EventRecord<E>) -> anyhow::Result<()>;
}

impl<E, F> EventHandler<E> for F
where
    E: DomainEvent,
    F: Fn(&EventRecord<E>) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, event: &EventRecord<E>) -> anyhow::Result<()> {
        self(event)
    }
}

/// Type-erased slot holding an `Arc<dyn EventHandler<E>>`.
struct RegisteredHandler(Box<dyn Any + Send + Sync>);

impl RegisteredHandler {
    fn new<E: DomainEvent>(handler: Arc<dyn EventHandler<E>>) -> Self {
        Self(Box::new(handler))
    }

    fn as_handler<E: DomainEvent>(&self) -> Option<&Arc<dyn EventHandler<E>>> {
        self.0.downcast_ref()
    }
}

/// Shared, concurrently-mutable mapping from event type to handlers.
pub struct HandlerRegistry {
    entries: DashMap<TypeId, Vec<RegisteredHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Append `handler` to the list for `E`.
    pub fn register<E: DomainEvent>(&self, handler: Arc<dyn EventHandler<E>>) {
        self.entries
            .entry(TypeId::of::<E>())
            .or_default()
            .push(RegisteredHandler::new(handler));
    }

    /// Remove the first registration matching `handler` by pointer identity.
    ///
    /// Returns false when the handler was never registered; that is a
    /// tolerated no-op, not an error. A handler registered twice keeps its
    /// remaining registration.
    pub fn unregister<E: DomainEvent>(&self, handler: &Arc<dyn EventHandler<E>>) -> bool {
        let type_id = TypeId::of::<E>();

        let removed = match self.entries.get_mut(&type_id) {
            Some(mut handlers) => {
                let position = handlers.iter().position(|entry| {
                    entry
                        .as_handler::<E>()
                        .is_some_and(|registered| Arc::ptr_eq(registered, handler))
                });
                match position {
                    Some(index) => {
                        handlers.remove(index);
                        true
                    }
                    None => false,
                }
            }
            None => false,
        };

        if removed {
            // Drop the slot once the last handler for the type is gone.
            self.entries.remove_if(&type_id, |_, handlers| handlers.is_empty());
        }

        removed
    }

    /// Clone the handler list for `E` as of this call.
    ///
    /// The shard lock is released before the snapshot is returned, so
    /// callers can invoke handlers (or re-enter register/unregister) without
    /// holding any lock. Registrations made afterwards show up in later
    /// snapshots only.
    pub fn snapshot<E: DomainEvent>(&self) -> Vec<Arc<dyn EventHandler<E>>> {
        self.entries
            .get(&TypeId::of::<E>())
            .map(|handlers| {
                handlers
                    .iter()
                    .filter_map(|entry| entry.as_handler::<E>().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn handler_count<E: DomainEvent>(&self) -> usize {
        self.entries
            .get(&TypeId::of::<E>())
            .map_or(0, |handlers| handlers.len())
    }

    pub fn total_handlers(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct CacheFlushed {
        namespace: String,
    }

    impl DomainEvent for CacheFlushed {
        fn event_type() -> &'static str {
            "CacheFlushed"
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct CacheWarmed;

    impl DomainEvent for CacheWarmed {
        fn event_type() -> &'static str {
            "CacheWarmed"
        }
    }

    fn recording_handler(
        log: Arc<Mutex<Vec<&'static str>>>,
        tag: &'static str,
    ) -> Arc<dyn EventHandler<CacheFlushed>> {
        Arc::new(move |_event: &EventRecord<CacheFlushed>| -> anyhow::Result<()> {
            log.lock().unwrap().push(tag);
            Ok(())
        })
    }

    #[test]
    fn test_snapshot_preserves_registration_order() {
        let registry = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        registry.register(recording_handler(log.clone(), "first"));
        registry.register(recording_handler(log.clone(), "second"));
        registry.register(recording_handler(log.clone(), "third"));

        let event = EventRecord::new(CacheFlushed {
            namespace: "sessions".to_string(),
        });
        for handler in registry.snapshot::<CacheFlushed>() {
            handler.handle(&event).unwrap();
        }

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_snapshot_is_empty_for_unknown_type() {
        let registry = HandlerRegistry::new();
        assert!(registry.snapshot::<CacheWarmed>().is_empty());
        assert_eq!(registry.handler_count::<CacheWarmed>(), 0);
    }

    #[test]
    fn test_unregister_removes_first_occurrence_only() {
        let registry = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let duplicated = recording_handler(log.clone(), "dup");
        registry.register(duplicated.clone());
        registry.register(duplicated.clone());
        assert_eq!(registry.handler_count::<CacheFlushed>(), 2);

        assert!(registry.unregister(&duplicated));
        assert_eq!(registry.handler_count::<CacheFlushed>(), 1);

        assert!(registry.unregister(&duplicated));
        assert_eq!(registry.handler_count::<CacheFlushed>(), 0);
    }

    #[test]
    fn test_unregister_unknown_handler_is_noop() {
        let registry = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let registered = recording_handler(log.clone(), "registered");
        let stranger = recording_handler(log.clone(), "stranger");
        registry.register(registered);

        assert!(!registry.unregister(&stranger));
        assert_eq!(registry.handler_count::<CacheFlushed>(), 1);
    }

    #[test]
    fn test_handlers_are_isolated_per_event_type() {
        let registry = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        registry.register(recording_handler(log.clone(), "flush"));

        let warmed: Arc<dyn EventHandler<CacheWarmed>> =
            Arc::new(|_event: &EventRecord<CacheWarmed>| -> anyhow::Result<()> { Ok(()) });
        registry.register(warmed);

        assert_eq!(registry.handler_count::<CacheFlushed>(), 1);
        assert_eq!(registry.handler_count::<CacheWarmed>(), 1);
        assert_eq!(registry.total_handlers(), 2);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_registration() {
        let registry = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        registry.register(recording_handler(log.clone(), "early"));
        let snapshot = registry.snapshot::<CacheFlushed>();
        registry.register(recording_handler(log.clone(), "late"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.handler_count::<CacheFlushed>(), 2);
    }
}
