// ============================================================================
// Customer Domain
// ============================================================================
//
// A second, independent event family. Handlers subscribed to order events
// never see these and vice versa.
//
// ============================================================================

pub mod events;
pub mod value_objects;

// Re-export for convenience
pub use events::*;
pub use value_objects::*;
