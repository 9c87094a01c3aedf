//! Query Executor
//!
//! The seam to the document database. An executor runs one page of a
//! [`QuerySpec`] against a container and resolves to a [`Page`] or a
//! [`QueryFault`]. It is built once at startup and shared by every request.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use super::model::{QueryOptions, QuerySpec};

/// Future returned by [`QueryExecutor::execute`]
pub type ExecuteFuture<'a> = Pin<Box<dyn Future<Output = Result<Page, QueryFault>> + Send + 'a>>;

/// Trait for the underlying document database client
pub trait QueryExecutor: Send + Sync {
    /// Fetch one page of results
    fn execute<'a>(
        &'a self,
        container: &'a str,
        spec: &'a QuerySpec,
        options: &'a QueryOptions,
    ) -> ExecuteFuture<'a>;
}

/// One page of query results
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub request_charge: f64,
    pub activity_id: String,
    /// Absent on the final page
    pub continuation_token: Option<String>,
}

/// A failure reported by the provider itself
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFault {
    pub status_code: u16,
    pub sub_status: u32,
    pub activity_id: String,
    pub request_charge: f64,
    pub message: String,
    pub retry_after: Option<Duration>,
}

/// Query execution failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryFault {
    /// The call reached the provider and it rejected the query
    #[error("{}", .0.message)]
    Provider(ProviderFault),

    /// The request could not be turned into a query
    #[error("Invalid query request: {0}")]
    InvalidRequest(String),

    /// The provider could not be reached
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The provider answered with something that is not a page
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// Failure without any description
    #[error("Unknown failure")]
    Unknown,
}

impl QueryFault {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Message to surface to the caller, if the failure has one
    pub fn message(&self) -> Option<String> {
        match self {
            QueryFault::Provider(fault) => Some(fault.message.clone()),
            QueryFault::Unknown => None,
            other => Some(other.to_string()),
        }
    }

    /// Provider diagnostics, when the call got that far
    pub fn provider(&self) -> Option<&ProviderFault> {
        match self {
            QueryFault::Provider(fault) => Some(fault),
            _ => None,
        }
    }
}

impl From<ProviderFault> for QueryFault {
    fn from(fault: ProviderFault) -> Self {
        QueryFault::Provider(fault)
    }
}

/// A call observed by [`MockQueryExecutor`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub container: String,
    pub spec: QuerySpec,
    pub options: QueryOptions,
}

/// Scripted executor for testing
///
/// Returns the configured outcome for every call and records what it was
/// asked to run.
#[derive(Debug)]
pub struct MockQueryExecutor {
    outcome: Result<Page, QueryFault>,
    /// Calls received (for testing)
    pub calls: Mutex<Vec<RecordedCall>>,
}

impl MockQueryExecutor {
    pub fn returning(page: Page) -> Self {
        Self {
            outcome: Ok(page),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(fault: QueryFault) -> Self {
        Self {
            outcome: Err(fault),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Get number of calls received
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Most recent call, if any
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().ok().and_then(|c| c.last().cloned())
    }
}

impl QueryExecutor for MockQueryExecutor {
    fn execute<'a>(
        &'a self,
        container: &'a str,
        spec: &'a QuerySpec,
        options: &'a QueryOptions,
    ) -> ExecuteFuture<'a> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                container: container.to_string(),
                spec: spec.clone(),
                options: options.clone(),
            });
        }
        let outcome = self.outcome.clone();
        Box::pin(async move { outcome })
    }
}
