//! Event loop configuration

use serde::{Deserialize, Serialize};

/// Event loop configuration
///
/// Every field has a default, so a partial JSON/TOML document is enough:
///
/// ```
/// use event_loop::EventLoopConfig;
///
/// let config: EventLoopConfig = serde_json::from_str(r#"{"audit_capacity": 64}"#).unwrap();
/// assert_eq!(config.max_dispatch_per_schedule, 4);
/// assert_eq!(config.audit_capacity, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLoopConfig {
    /// Ready events dispatched by one `schedule()` call before it returns
    /// to the host (zero is treated as one)
    pub max_dispatch_per_schedule: usize,
    /// Records kept by the audit trail; zero disables it
    pub audit_capacity: usize,
}

impl EventLoopConfig {
    /// Dispatch budget actually applied per `schedule()` call
    pub fn dispatch_budget(&self) -> usize {
        self.max_dispatch_per_schedule.max(1)
    }
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            max_dispatch_per_schedule: 4,
            audit_capacity: 0,
        }
    }
}
