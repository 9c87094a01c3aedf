//! Observability subsystem
//!
//! - Structured logging (JSON lines)
//! - Query counters
//! - Typed lifecycle events
//!
//! Observability is read-only: nothing here changes how a request is
//! answered.
//!
//! # Usage
//!
//! ```ignore
//! use cosmos_sidecar::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::QueryExecuted, &[("count", "42")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

fn severity_for(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_failure() {
        Severity::Error
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_for(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_for(event), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_for_event() {
        assert_eq!(severity_for(Event::BootFailed), Severity::Fatal);
        assert_eq!(severity_for(Event::QueryFailed), Severity::Error);
        assert_eq!(severity_for(Event::QueryExecuted), Severity::Info);
    }

    #[test]
    fn test_log_event() {
        // This just verifies no panic
        log_event(Event::BootStart);
        log_event_with_fields(Event::ConfigLoaded, &[("port", "8080")]);
    }
}
