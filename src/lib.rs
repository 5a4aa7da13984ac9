//! Typed, in-process publish/subscribe dispatch for domain events.
//!
//! Producers raise strongly-typed events describing a state change on an
//! originating entity. Consumers subscribe per event type and run
//! synchronously, in registration order, on the publisher's thread.
//!
//! The dispatcher is built once at the composition root and shared:
//!
//! ```
//! use std::sync::Arc;
//! use domain_dispatch::{DispatcherConfig, EventDispatcher, EventHandler, EventRecord};
//! use domain_dispatch::domain::order::{OrderItem, OrderPlaced};
//! use uuid::Uuid;
//!
//! let dispatcher = EventDispatcher::new(DispatcherConfig::default());
//!
//! let handler: Arc<dyn EventHandler<OrderPlaced>> =
//!     Arc::new(|event: &EventRecord<OrderPlaced>| -> anyhow::Result<()> {
//!         println!("order from customer {}", event.payload.customer_id);
//!         Ok(())
//!     });
//! dispatcher.subscribe(handler.clone());
//!
//! let event = EventRecord::new(OrderPlaced {
//!     customer_id: Uuid::new_v4(),
//!     items: vec![OrderItem { product_id: Uuid::new_v4(), quantity: 1 }],
//! });
//! dispatcher.publish(&event)?;
//!
//! dispatcher.unsubscribe(&handler);
//! # Ok::<(), domain_dispatch::DispatchError>(())
//! ```
//!
//! A handler failure either propagates to the publisher (`publish`) or is
//! reported to a callback (`publish_with`); both wrap the same dispatch
//! call.

pub mod config;
pub mod dispatch;
pub mod domain;
pub mod metrics;

pub use config::DispatcherConfig;
pub use dispatch::{
    DispatchError, DispatchReport, EventDispatcher, EventHandler, HandlerRegistry,
    ServiceRegistry,
};
pub use domain::entity::{Entity, EntityId};
pub use domain::event::{DomainEvent, EventRecord};
pub use metrics::DispatchMetrics;
