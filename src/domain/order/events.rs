use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::OrderItem;
use crate::domain::event::DomainEvent;

// ============================================================================
// Order Events
// ============================================================================
//
// Each event is its own routed type: a handler subscribed to OrderPlaced is
// never invoked for OrderShipped. There is deliberately no union enum here;
// the dispatcher keys on the exact payload type.
//
// ============================================================================

/// Raised once per order, when a customer places it. Starts the stream.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderPlaced {
    pub customer_id: Uuid,
    pub items: Vec<OrderItem>,
}

impl DomainEvent for OrderPlaced {
    fn event_type() -> &'static str {
        "OrderPlaced"
    }
}

/// The order passed validation and is queued for fulfillment.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderConfirmed {
    pub confirmed_at: DateTime<Utc>,
}

impl DomainEvent for OrderConfirmed {
    fn event_type() -> &'static str {
        "OrderConfirmed"
    }
}

/// The parcel left the warehouse.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderShipped {
    pub tracking_number: String,
    pub carrier: String,
    pub shipped_at: DateTime<Utc>,
}

impl DomainEvent for OrderShipped {
    fn event_type() -> &'static str {
        "OrderShipped"
    }
}

/// The parcel reached the customer.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderDelivered {
    pub delivered_at: DateTime<Utc>,
    pub signature: Option<String>,
}

impl DomainEvent for OrderDelivered {
    fn event_type() -> &'static str {
        "OrderDelivered"
    }
}

/// Terminal event; nothing follows a cancellation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderCancelled {
    pub reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
}

impl DomainEvent for OrderCancelled {
    fn event_type() -> &'static str {
        "OrderCancelled"
    }
}
