use std::sync::Arc;

use crate::config::DispatcherConfig;
use crate::domain::event::{DomainEvent, EventRecord};
use crate::metrics::DispatchMetrics;

use super::error::DispatchError;
use super::registry::{EventHandler, HandlerRegistry};
use super::services::ServiceRegistry;

// ============================================================================
// Event Dispatcher - synchronous delivery of typed domain events
// ============================================================================
//
// Routes a published event to every handler registered for its exact type,
// in registration order, on the caller's thread. The dispatcher is built
// explicitly at the composition root and shared via Arc; `from_services`
// covers hosts that pre-register their own instance in a ServiceRegistry.
//
// Both publish variants wrap the one result-returning `dispatch` call:
// `publish` hands the result to the producer, `publish_with` reports it to
// a callback instead.
//
// ============================================================================

/// Outcome of a completed dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers invoked by this call. Zero when nothing was registered for
    /// the event type, which is a normal state rather than an error.
    pub handlers_invoked: usize,
}

pub struct EventDispatcher {
    config: DispatcherConfig,
    handlers: HandlerRegistry,
    metrics: Option<Arc<DispatchMetrics>>,
}

impl EventDispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            handlers: HandlerRegistry::new(),
            metrics: None,
        }
    }

    /// Attach dispatch metrics. Counters are labelled by event type.
    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Resolve the process-wide dispatcher through the capability registry.
    ///
    /// A pre-registered instance is reused, which is how a host substitutes
    /// its own dispatcher; otherwise a default instance is built from
    /// `config` and registered for subsequent callers. Concurrent first
    /// calls converge on a single instance. Callers are expected to hold on
    /// to the returned Arc rather than resolve on every publish.
    pub fn from_services(
        services: &ServiceRegistry,
        config: &DispatcherConfig,
    ) -> Arc<EventDispatcher> {
        services.get_or_register(|| Arc::new(EventDispatcher::new(config.clone())))
    }

    /// Register `handler` for events of type `E`. Registering the same
    /// handler twice means it runs twice per event.
    pub fn subscribe<E: DomainEvent>(&self, handler: Arc<dyn EventHandler<E>>) {
        self.handlers.register(handler);
        if let Some(metrics) = &self.metrics {
            metrics.handlers_registered.inc();
        }
        tracing::debug!(
            dispatcher = %self.config.name,
            event_type = E::event_type(),
            handlers = self.handlers.handler_count::<E>(),
            "Handler subscribed"
        );
    }

    /// Remove the first registration of `handler` for `E`. Unsubscribing a
    /// handler that was never registered is a silent no-op.
    pub fn unsubscribe<E: DomainEvent>(&self, handler: &Arc<dyn EventHandler<E>>) {
        if self.handlers.unregister(handler) {
            if let Some(metrics) = &self.metrics {
                metrics.handlers_registered.dec();
            }
            tracing::debug!(
                dispatcher = %self.config.name,
                event_type = E::event_type(),
                "Handler unsubscribed"
            );
        }
    }

    /// Deliver `event` to every handler registered for `E`, in registration
    /// order, on this thread.
    ///
    /// Handlers observe the same record instance. The first handler error
    /// aborts delivery; handlers that already ran are not rolled back. A
    /// dispatch sees the handler list as of this call; handlers subscribed
    /// concurrently are picked up by later dispatches.
    pub fn dispatch<E: DomainEvent>(
        &self,
        event: &EventRecord<E>,
    ) -> Result<DispatchReport, DispatchError> {
        let snapshot = self.handlers.snapshot::<E>();

        if let Some(metrics) = &self.metrics {
            metrics.record_published(E::event_type());
        }

        if snapshot.is_empty() {
            if self.config.log_unhandled {
                tracing::debug!(
                    dispatcher = %self.config.name,
                    event_type = E::event_type(),
                    event_id = %event.id,
                    "No handlers registered, event not delivered"
                );
            }
            return Ok(DispatchReport {
                handlers_invoked: 0,
            });
        }

        for (position, handler) in snapshot.iter().enumerate() {
            if let Err(source) = handler.handle(event) {
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(E::event_type());
                }
                tracing::warn!(
                    dispatcher = %self.config.name,
                    event_type = E::event_type(),
                    event_id = %event.id,
                    position,
                    error = %source,
                    "Handler failed, aborting delivery"
                );
                return Err(DispatchError::HandlerFailed {
                    event_type: E::event_type(),
                    position,
                    source,
                });
            }
            if let Some(metrics) = &self.metrics {
                metrics.record_invocation(E::event_type());
            }
        }

        tracing::debug!(
            dispatcher = %self.config.name,
            event_type = E::event_type(),
            event_id = %event.id,
            handlers = snapshot.len(),
            "Event delivered"
        );

        Ok(DispatchReport {
            handlers_invoked: snapshot.len(),
        })
    }

    /// Fail-fast publish: a handler failure is the producer's failure.
    pub fn publish<E: DomainEvent>(
        &self,
        event: &EventRecord<E>,
    ) -> Result<DispatchReport, DispatchError> {
        self.dispatch(event)
    }

    /// Failure-isolating publish: never propagates a handler failure.
    ///
    /// The callback is invoked exactly once with the event and the captured
    /// error, or with `None` when every handler ran cleanly. Reporting is
    /// the only recovery offered; nothing is retried.
    pub fn publish_with<E, F>(&self, event: &EventRecord<E>, callback: F)
    where
        E: DomainEvent,
        F: FnOnce(&EventRecord<E>, Option<&DispatchError>),
    {
        match self.dispatch(event) {
            Ok(_) => callback(event, None),
            Err(error) => callback(event, Some(&error)),
        }
    }

    pub fn handler_count<E: DomainEvent>(&self) -> usize {
        self.handlers.handler_count::<E>()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
