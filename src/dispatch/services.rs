use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;

// ============================================================================
// Service Registry - capability lookup for process-wide singletons
// ============================================================================
//
// Holds one shared instance per capability type. Built once at the
// composition root and passed to whatever needs to resolve capabilities;
// there is no hidden global behind it.
//
// ============================================================================

pub struct ServiceRegistry {
    services: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Register `service` as the shared instance for `T`, replacing any
    /// previous registration.
    pub fn register<T: Send + Sync + 'static>(&self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    pub fn is_registered<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value().clone().downcast::<T>().ok())
    }

    /// Return the registered instance for `T`, building one with `init` and
    /// registering it when absent.
    ///
    /// The check and the insert happen under the same shard lock, so racing
    /// first callers all observe the same instance and `init` runs at most
    /// once per type.
    pub fn get_or_register<T: Send + Sync + 'static>(
        &self,
        init: impl FnOnce() -> Arc<T>,
    ) -> Arc<T> {
        let entry = self
            .services
            .entry(TypeId::of::<T>())
            .or_insert_with(|| init() as Arc<dyn Any + Send + Sync>);

        match entry.value().clone().downcast::<T>() {
            Ok(service) => service,
            // The slot keyed by TypeId::of::<T>() only ever holds a T.
            Err(_) => unreachable!("service slot holds a foreign type"),
        }
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
