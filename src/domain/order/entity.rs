use chrono::Utc;
use uuid::Uuid;

use super::errors::OrderError;
use super::events::{OrderCancelled, OrderConfirmed, OrderDelivered, OrderPlaced, OrderShipped};
use super::value_objects::{OrderItem, OrderStatus};
use crate::domain::entity::{Entity, EntityId};
use crate::domain::event::{DomainEvent, EventRecord};

// ============================================================================
// Order Entity - the producer side of the order event family
// ============================================================================
//
// Validates each transition, then raises the matching event stamped with the
// order's identity and the next version number. The dispatch core never
// sees this type; it only sees the EventRecords it produces.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct Order {
    id: EntityId,
    version: i64,

    pub customer_id: Uuid,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
}

impl Order {
    /// Create a new order and its `OrderPlaced` event.
    pub fn place(
        customer_id: Uuid,
        items: Vec<OrderItem>,
    ) -> Result<(Self, EventRecord<OrderPlaced>), OrderError> {
        validate_items(&items)?;

        let mut order = Self {
            id: EntityId::new(),
            version: 0,
            customer_id,
            items: items.clone(),
            status: OrderStatus::Placed,
        };

        let event = order.raise(OrderPlaced { customer_id, items });
        Ok((order, event))
    }

    pub fn confirm(&mut self) -> Result<EventRecord<OrderConfirmed>, OrderError> {
        match self.status {
            OrderStatus::Placed => {}
            OrderStatus::Confirmed => return Err(OrderError::AlreadyConfirmed),
            other => return Err(OrderError::InvalidStatusTransition(other)),
        }

        self.status = OrderStatus::Confirmed;
        Ok(self.raise(OrderConfirmed {
            confirmed_at: Utc::now(),
        }))
    }

    pub fn ship(
        &mut self,
        tracking_number: String,
        carrier: String,
    ) -> Result<EventRecord<OrderShipped>, OrderError> {
        match self.status {
            OrderStatus::Confirmed => {}
            OrderStatus::Placed => return Err(OrderError::NotConfirmed),
            other => return Err(OrderError::InvalidStatusTransition(other)),
        }

        self.status = OrderStatus::Shipped;
        Ok(self.raise(OrderShipped {
            tracking_number,
            carrier,
            shipped_at: Utc::now(),
        }))
    }

    pub fn deliver(
        &mut self,
        signature: Option<String>,
    ) -> Result<EventRecord<OrderDelivered>, OrderError> {
        if self.status != OrderStatus::Shipped {
            return Err(OrderError::NotShipped);
        }

        self.status = OrderStatus::Delivered;
        Ok(self.raise(OrderDelivered {
            delivered_at: Utc::now(),
            signature,
        }))
    }

    pub fn cancel(
        &mut self,
        reason: Option<String>,
        cancelled_by: Option<Uuid>,
    ) -> Result<EventRecord<OrderCancelled>, OrderError> {
        match self.status {
            OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled),
            OrderStatus::Delivered => {
                return Err(OrderError::InvalidStatusTransition(self.status))
            }
            _ => {} // Can cancel from Placed, Confirmed, or Shipped
        }

        self.status = OrderStatus::Cancelled;
        Ok(self.raise(OrderCancelled {
            reason,
            cancelled_by,
        }))
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    fn raise<E: DomainEvent>(&mut self, payload: E) -> EventRecord<E> {
        self.version += 1;
        EventRecord::raised_by(self, payload).with_version(self.version)
    }
}

impl Entity for Order {
    fn entity_id(&self) -> EntityId {
        self.id
    }
}

fn validate_items(items: &[OrderItem]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyItems);
    }

    for item in items {
        if item.quantity <= 0 {
            return Err(OrderError::InvalidQuantity(item.quantity));
        }
    }

    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn one_item() -> Vec<OrderItem> {
        vec![OrderItem {
            product_id: Uuid::new_v4(),
            quantity: 2,
        }]
    }

    #[test]
    fn test_place_raises_versioned_event() {
        let (order, event) = Order::place(Uuid::new_v4(), one_item()).unwrap();

        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(event.version, 1);
        assert_eq!(event.source, Some(order.entity_id()));
        assert_eq!(event.payload.items.len(), 1);
    }

    #[test]
    fn test_place_rejects_empty_items() {
        let result = Order::place(Uuid::new_v4(), vec![]);
        assert!(matches!(result, Err(OrderError::EmptyItems)));
    }

    #[test]
    fn test_place_rejects_non_positive_quantity() {
        let items = vec![OrderItem {
            product_id: Uuid::new_v4(),
            quantity: 0,
        }];
        let result = Order::place(Uuid::new_v4(), items);
        assert!(matches!(result, Err(OrderError::InvalidQuantity(0))));
    }

    #[test]
    fn test_versions_increase_through_lifecycle() {
        let (mut order, placed) = Order::place(Uuid::new_v4(), one_item()).unwrap();
        let confirmed = order.confirm().unwrap();
        let shipped = order.ship("TRK-1".to_string(), "DHL".to_string()).unwrap();
        let delivered = order.deliver(None).unwrap();

        assert_eq!(placed.version, 1);
        assert_eq!(confirmed.version, 2);
        assert_eq!(shipped.version, 3);
        assert_eq!(delivered.version, 4);
        assert_eq!(order.version(), 4);
    }

    #[test]
    fn test_cannot_confirm_twice() {
        let (mut order, _) = Order::place(Uuid::new_v4(), one_item()).unwrap();
        order.confirm().unwrap();
        assert!(matches!(order.confirm(), Err(OrderError::AlreadyConfirmed)));
    }

    #[test]
    fn test_cannot_ship_before_confirmation() {
        let (mut order, _) = Order::place(Uuid::new_v4(), one_item()).unwrap();
        let result = order.ship("TRK-1".to_string(), "DHL".to_string());
        assert!(matches!(result, Err(OrderError::NotConfirmed)));
    }

    #[test]
    fn test_cannot_cancel_delivered_order() {
        let (mut order, _) = Order::place(Uuid::new_v4(), one_item()).unwrap();
        order.confirm().unwrap();
        order.ship("TRK-1".to_string(), "UPS".to_string()).unwrap();
        order.deliver(Some("sig".to_string())).unwrap();

        let result = order.cancel(None, None);
        assert!(matches!(
            result,
            Err(OrderError::InvalidStatusTransition(OrderStatus::Delivered))
        ));
    }

    #[test]
    fn test_events_from_same_order_share_source() {
        let (mut order, placed) = Order::place(Uuid::new_v4(), one_item()).unwrap();
        let confirmed = order.confirm().unwrap();
        assert_eq!(placed.source, confirmed.source);
    }
}
