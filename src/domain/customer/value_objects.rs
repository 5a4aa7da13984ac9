use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Customer Value Objects
// ============================================================================

/// Customer email address, normalized to lowercase on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
