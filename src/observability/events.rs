//! Observable events for the sidecar
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Startup begins
    BootStart,
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Listener bound, ready for requests
    Serving,
    /// Startup failed
    BootFailed,
    /// Server stopped
    ShutdownComplete,

    // Query path
    /// Query received
    QueryReceived,
    /// Page returned by the provider
    QueryExecuted,
    /// Provider rejected the query
    QueryProviderFault,
    /// Query failed before or outside the provider
    QueryFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "SIDECAR_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::Serving => "SIDECAR_SERVING",
            Event::BootFailed => "SIDECAR_STARTUP_FAILED",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::QueryReceived => "QUERY_BEGIN",
            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::QueryProviderFault => "QUERY_PROVIDER_FAULT",
            Event::QueryFailed => "QUERY_FAILED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::BootFailed)
    }

    /// Returns true if this event reports a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::QueryProviderFault | Event::QueryFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::BootStart,
            Event::ConfigLoaded,
            Event::Serving,
            Event::BootFailed,
            Event::ShutdownComplete,
            Event::QueryReceived,
            Event::QueryExecuted,
            Event::QueryProviderFault,
            Event::QueryFailed,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_classes() {
        assert!(Event::BootFailed.is_fatal());
        assert!(!Event::QueryFailed.is_fatal());
        assert!(Event::QueryProviderFault.is_failure());
        assert!(!Event::QueryExecuted.is_failure());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::QueryExecuted), "QUERY_COMPLETE");
    }
}
