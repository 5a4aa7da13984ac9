// ============================================================================
// Dispatch Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A handler returned an error while an event was being delivered.
    /// Handlers earlier in the registration order have already run and are
    /// not rolled back.
    #[error("handler #{position} for {event_type} failed: {source}")]
    HandlerFailed {
        event_type: &'static str,
        /// Zero-based position of the failing handler in registration order.
        position: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::HandlerFailed { event_type, .. } => event_type,
        }
    }
}
