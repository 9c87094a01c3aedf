//! Query Service
//!
//! Runs one request through translator, executor, and normalizer. Every
//! outcome resolves to a [`QueryResponse`]; nothing on this path returns an
//! error to the caller.

use std::sync::Arc;

use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

use super::executor::{QueryExecutor, QueryFault};
use super::model::{QueryOptions, QueryRequest, QueryResponse};
use super::normalizer::{from_failure, from_success};
use super::translator::build_spec;

/// Per-call context that is logged but never acted on
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Caller-supplied correlation id
    pub request_id: Option<String>,
    /// Caller's timeout hint; the executor's own timeout applies
    pub timeout_hint_ms: Option<u64>,
}

/// Query service shared across handlers
pub struct QueryService {
    executor: Arc<dyn QueryExecutor>,
    metrics: Arc<MetricsRegistry>,
}

impl QueryService {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self::with_metrics(executor, Arc::new(MetricsRegistry::new()))
    }

    pub fn with_metrics(executor: Arc<dyn QueryExecutor>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { executor, metrics }
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Execute one page of a query against `container`
    pub async fn execute(
        &self,
        container: &str,
        request: &QueryRequest,
        options: &QueryOptions,
        ctx: &CallContext,
    ) -> QueryResponse {
        let request_id = ctx.request_id.as_deref().unwrap_or("none");
        let timeout_hint = ctx
            .timeout_hint_ms
            .map(|ms| ms.to_string())
            .unwrap_or_else(|| "none".to_string());

        log_event_with_fields(
            Event::QueryReceived,
            &[
                ("container", container),
                ("request_id", request_id),
                ("partition_key_set", bool_str(options.partition_key.is_some())),
                ("continuation", bool_str(options.continuation_token.is_some())),
                ("timeout_hint_ms", timeout_hint.as_str()),
            ],
        );

        let outcome = match build_spec(request) {
            Ok(spec) => self.executor.execute(container, &spec, options).await,
            Err(fault) => Err(fault),
        };

        match outcome {
            Ok(page) => {
                let count = page.items.len();
                let ru = page.request_charge;
                let count_str = count.to_string();
                let ru_str = ru.to_string();
                log_event_with_fields(
                    Event::QueryExecuted,
                    &[
                        ("activity_id", page.activity_id.as_str()),
                        ("container", container),
                        ("count", count_str.as_str()),
                        ("request_id", request_id),
                        ("ru", ru_str.as_str()),
                    ],
                );
                self.metrics.record_success(count, ru);
                from_success(page)
            }
            Err(fault) => {
                self.record_failure(container, request_id, &fault);
                from_failure(&fault)
            }
        }
    }

    /// Resolve a request that could not be read into an envelope
    pub fn reject(&self, container: &str, fault: QueryFault, ctx: &CallContext) -> QueryResponse {
        let request_id = ctx.request_id.as_deref().unwrap_or("none");
        self.record_failure(container, request_id, &fault);
        from_failure(&fault)
    }

    fn record_failure(&self, container: &str, request_id: &str, fault: &QueryFault) {
        if let Some(provider) = fault.provider() {
            let status = provider.status_code.to_string();
            let sub_status = provider.sub_status.to_string();
            log_event_with_fields(
                Event::QueryProviderFault,
                &[
                    ("activity_id", provider.activity_id.as_str()),
                    ("container", container),
                    ("message", provider.message.as_str()),
                    ("request_id", request_id),
                    ("status", status.as_str()),
                    ("sub_status", sub_status.as_str()),
                ],
            );
            self.metrics
                .record_provider_fault(provider.status_code, provider.request_charge);
        } else {
            let message = fault.to_string();
            log_event_with_fields(
                Event::QueryFailed,
                &[
                    ("container", container),
                    ("message", message.as_str()),
                    ("request_id", request_id),
                ],
            );
            self.metrics.record_failure();
        }
    }
}

fn bool_str(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}
