use std::env;

// ============================================================================
// Dispatcher Configuration
// ============================================================================
//
// Consulted once, when the default dispatcher is constructed. Hosts that
// pre-register their own dispatcher bring their own settings.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Name used in log lines; tells dispatchers apart when a process runs
    /// more than one.
    pub name: String,
    /// Emit a debug log when an event is published with no handlers.
    pub log_unhandled: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            name: "in-process".to_string(),
            log_unhandled: true,
        }
    }
}

impl DispatcherConfig {
    /// Build from environment variables, falling back to defaults.
    ///
    /// `DISPATCHER_NAME` overrides the name; `DISPATCHER_LOG_UNHANDLED`
    /// accepts "0", "false" or "off" to silence unhandled-event logging.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let name = env::var("DISPATCHER_NAME").unwrap_or(defaults.name);
        let log_unhandled = env::var("DISPATCHER_LOG_UNHANDLED")
            .map(|value| !matches!(value.trim(), "0" | "false" | "off"))
            .unwrap_or(defaults.log_unhandled);

        Self {
            name,
            log_unhandled,
        }
    }
}
