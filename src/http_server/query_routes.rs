//! Query HTTP Routes
//!
//! `POST /query/{container}` (nested under `/cosmos/v1`). Every request,
//! including one with an unreadable body or query string, is answered with a
//! [`QueryResponse`] envelope plus diagnostic headers.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::query::{CallContext, QueryFault, QueryOptions, QueryRequest, QueryResponse, QueryService};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const TIMEOUT_HINT_HEADER: &str = "x-timeout-ms";
pub const RU_HEADER: &str = "x-cosmos-ru";
pub const ACTIVITY_ID_HEADER: &str = "x-cosmos-activity-id";
pub const SUB_STATUS_HEADER: &str = "x-cosmos-substatus";
pub const RETRY_AFTER_HEADER: &str = "x-cosmos-retry-after-ms";

// ==================
// Shared State
// ==================

/// Query state shared across handlers
pub struct QueryState {
    pub service: Arc<QueryService>,
}

impl QueryState {
    pub fn new(service: Arc<QueryService>) -> Self {
        Self { service }
    }
}

// ==================
// Request Types
// ==================

/// Query-string options
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    /// Partition key value
    #[serde(default)]
    pub pk: Option<String>,
    /// Page size; non-positive means unset
    #[serde(default)]
    pub max_item_count: Option<i64>,
    /// Continuation token from a previous page
    #[serde(default)]
    pub ct: Option<String>,
}

// ==================
// Query Routes
// ==================

/// Create query routes
pub fn query_routes(state: Arc<QueryState>) -> Router {
    Router::new()
        .route("/query/:container", post(query_handler))
        .with_state(state)
}

async fn query_handler(
    State(state): State<Arc<QueryState>>,
    Path(container): Path<String>,
    params: Result<Query<QueryParams>, QueryRejection>,
    headers: HeaderMap,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let ctx = call_context(&headers);

    let response = match (params, body) {
        (Ok(Query(params)), Ok(Json(request))) => {
            let options = QueryOptions::new(params.pk, params.max_item_count, params.ct);
            state
                .service
                .execute(&container, &request, &options, &ctx)
                .await
        }
        (Err(rejection), _) => state.service.reject(
            &container,
            QueryFault::invalid_request(rejection.body_text()),
            &ctx,
        ),
        (_, Err(rejection)) => state.service.reject(
            &container,
            QueryFault::invalid_request(rejection.body_text()),
            &ctx,
        ),
    };

    render(response)
}

// ==================
// Helper Functions
// ==================

fn call_context(headers: &HeaderMap) -> CallContext {
    CallContext {
        request_id: headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        timeout_hint_ms: headers
            .get(TIMEOUT_HINT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok()),
    }
}

/// HTTP status for an envelope
pub fn http_status(response: &QueryResponse) -> StatusCode {
    if response.ok {
        return StatusCode::OK;
    }

    match response.cosmos.as_ref().map(|c| c.status_code) {
        Some(400) => StatusCode::BAD_REQUEST,
        Some(404) => StatusCode::NOT_FOUND,
        Some(429) => StatusCode::TOO_MANY_REQUESTS,
        Some(408) => StatusCode::REQUEST_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Diagnostic headers derived from the envelope's provider metadata
pub fn diagnostic_headers(response: &QueryResponse) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Some(cosmos) = &response.cosmos {
        // Debug keeps a fractional digit: 0.0, 2.83
        insert(&mut headers, RU_HEADER, &format!("{:?}", cosmos.request_units));
        insert(&mut headers, ACTIVITY_ID_HEADER, &cosmos.activity_id);
        insert(&mut headers, SUB_STATUS_HEADER, &cosmos.sub_status.to_string());

        if let Some(ms) = cosmos.retry_after_ms {
            insert(&mut headers, RETRY_AFTER_HEADER, &ms.to_string());
        }
    }

    headers
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(HeaderName::from_static(name), value);
    }
}

fn render(response: QueryResponse) -> Response {
    let status = http_status(&response);
    let headers = diagnostic_headers(&response);
    (status, headers, Json(response)).into_response()
}
