use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use domain_dispatch::domain::order::{
    Order, OrderCancelled, OrderConfirmed, OrderItem, OrderPlaced, OrderShipped, OrderStatus,
};
use domain_dispatch::metrics::{start_metrics_server, DispatchMetrics};
use domain_dispatch::{
    DispatcherConfig, Entity, EntityId, EventDispatcher, EventHandler, EventRecord,
    ServiceRegistry,
};

// ============================================================================
// Demo: an order lifecycle flowing through the in-process dispatcher
// ============================================================================

/// In-memory read model fed by order events. Keyed by the entity that
/// raised each event.
#[derive(Default)]
struct OrderProjection {
    statuses: Mutex<HashMap<EntityId, OrderStatus>>,
}

impl OrderProjection {
    fn status_of(&self, order: EntityId) -> Option<OrderStatus> {
        self.statuses.lock().ok()?.get(&order).copied()
    }

    fn apply(&self, source: Option<EntityId>, status: OrderStatus) -> anyhow::Result<()> {
        let source = source.ok_or_else(|| anyhow::anyhow!("event carries no source"))?;
        let mut statuses = self
            .statuses
            .lock()
            .map_err(|_| anyhow::anyhow!("projection lock poisoned"))?;
        statuses.insert(source, status);
        Ok(())
    }
}

impl EventHandler<OrderPlaced> for OrderProjection {
    fn handle(&self, event: &EventRecord<OrderPlaced>) -> anyhow::Result<()> {
        self.apply(event.source, OrderStatus::Placed)
    }
}

impl EventHandler<OrderConfirmed> for OrderProjection {
    fn handle(&self, event: &EventRecord<OrderConfirmed>) -> anyhow::Result<()> {
        self.apply(event.source, OrderStatus::Confirmed)
    }
}

impl EventHandler<OrderShipped> for OrderProjection {
    fn handle(&self, event: &EventRecord<OrderShipped>) -> anyhow::Result<()> {
        self.apply(event.source, OrderStatus::Shipped)
    }
}

fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter, e.g. RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,domain_dispatch=debug")),
        )
        .init();

    tracing::info!("🚀 Starting domain event dispatch demo");

    // === 1. Initialize Prometheus metrics ===
    let metrics = Arc::new(DispatchMetrics::new()?);

    // Start metrics HTTP server in background thread
    let metrics_handle = metrics.clone();
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("Metrics runtime failed to start: {}", e);
                return;
            }
        };
        rt.block_on(async {
            if let Err(e) = start_metrics_server(metrics_handle, 9090).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 2. Composition root: build the dispatcher once ===
    // Registering it up front means anything that resolves through the
    // service registry reuses this exact instance.
    let config = DispatcherConfig::from_env();
    let services = ServiceRegistry::new();
    services.register(Arc::new(
        EventDispatcher::new(config.clone()).with_metrics(metrics.clone()),
    ));
    let dispatcher = EventDispatcher::from_services(&services, &config);

    // === 3. Publish before anyone subscribed: a normal no-op ===
    let customer_id = Uuid::new_v4();
    let (_early_order, early_placed) = Order::place(
        customer_id,
        vec![OrderItem {
            product_id: Uuid::new_v4(),
            quantity: 1,
        }],
    )?;
    let report = dispatcher.publish(&early_placed)?;
    tracing::info!(
        handlers = report.handlers_invoked,
        "Order placed before any subscriber existed"
    );

    // === 4. Subscribe the projection and an audit log ===
    let projection = Arc::new(OrderProjection::default());
    dispatcher.subscribe::<OrderPlaced>(projection.clone());
    dispatcher.subscribe::<OrderConfirmed>(projection.clone());
    dispatcher.subscribe::<OrderShipped>(projection.clone());

    let audit: Arc<dyn EventHandler<OrderPlaced>> =
        Arc::new(|event: &EventRecord<OrderPlaced>| -> anyhow::Result<()> {
            tracing::info!(
                event_id = %event.id,
                version = event.version,
                items = event.payload.items.len(),
                "📝 Audit: order placed"
            );
            Ok(())
        });
    dispatcher.subscribe(audit.clone());

    // === 5. Walk an order through its lifecycle ===
    let (mut order, placed) = Order::place(
        customer_id,
        vec![
            OrderItem {
                product_id: Uuid::new_v4(),
                quantity: 2,
            },
            OrderItem {
                product_id: Uuid::new_v4(),
                quantity: 1,
            },
        ],
    )?;
    dispatcher.publish(&placed)?;

    let confirmed = order.confirm()?;
    dispatcher.publish(&confirmed)?;

    let shipped = order.ship("TRK-4711".to_string(), "DHL".to_string())?;
    dispatcher.publish(&shipped)?;

    tracing::info!(
        status = ?projection.status_of(order.entity_id()),
        "✅ Projection caught up with the order"
    );

    // === 6. Failure isolation: a refusing handler plus the callback path ===
    let refusing: Arc<dyn EventHandler<OrderCancelled>> =
        Arc::new(|event: &EventRecord<OrderCancelled>| -> anyhow::Result<()> {
            anyhow::bail!(
                "downstream billing rejected cancellation of event {}",
                event.id
            )
        });
    dispatcher.subscribe(refusing.clone());

    let (mut doomed, doomed_placed) = Order::place(
        customer_id,
        vec![OrderItem {
            product_id: Uuid::new_v4(),
            quantity: 3,
        }],
    )?;
    dispatcher.publish(&doomed_placed)?;

    let cancelled = doomed.cancel(Some("changed my mind".to_string()), Some(customer_id))?;
    dispatcher.publish_with(&cancelled, |event, error| match error {
        Some(error) => tracing::warn!(
            event_id = %event.id,
            error = %error,
            "Cancellation delivered with a captured handler failure"
        ),
        None => tracing::info!(event_id = %event.id, "Cancellation delivered cleanly"),
    });

    dispatcher.unsubscribe(&refusing);

    tracing::info!("📊 Metrics available on http://127.0.0.1:9090/metrics");
    std::thread::sleep(Duration::from_secs(3));

    Ok(())
}
