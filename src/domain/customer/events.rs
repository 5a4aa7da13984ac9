use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::Email;
use crate::domain::event::DomainEvent;

// ============================================================================
// Customer Events
// ============================================================================

/// A customer account came into existence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRegistered {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
}

impl DomainEvent for CustomerRegistered {
    fn event_type() -> &'static str {
        "CustomerRegistered"
    }
}

/// Account suspended, either indefinitely or until `until`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSuspended {
    pub reason: String,
    pub until: Option<DateTime<Utc>>,
}

impl DomainEvent for CustomerSuspended {
    fn event_type() -> &'static str {
        "CustomerSuspended"
    }
}

/// A suspended account was restored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerReactivated {
    pub reactivated_by: Option<Uuid>,
}

impl DomainEvent for CustomerReactivated {
    fn event_type() -> &'static str {
        "CustomerReactivated"
    }
}
