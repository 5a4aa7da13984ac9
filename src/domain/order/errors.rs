use super::value_objects::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order was already cancelled")]
    AlreadyCancelled,

    #[error("order was already confirmed")]
    AlreadyConfirmed,

    #[error("order must be confirmed before it can ship")]
    NotConfirmed,

    #[error("order must ship before it can be delivered")]
    NotShipped,

    #[error("no transition allowed out of status {0}")]
    InvalidStatusTransition(OrderStatus),

    #[error("an order needs at least one item")]
    EmptyItems,

    #[error("item quantity must be positive, got {0}")]
    InvalidQuantity(i32),
}
