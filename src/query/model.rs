//! Query Data Model
//!
//! Request, specification, and response envelope types shared by the
//! translator, the normalizer, and the HTTP surface.
//!
//! Response types serialize with camelCase names and omit absent fields
//! rather than emitting `null`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker every parameter name carries once normalized
pub const PARAM_MARKER: char = '@';

// ==================
// Request Side
// ==================

/// Inbound query request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Provider query text with named placeholders
    #[serde(default)]
    pub sql: String,

    /// Parameter name to value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: None,
        }
    }

    /// Add a parameter (name may or may not carry the marker)
    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params
            .get_or_insert_with(Map::new)
            .insert(name.into(), value);
        self
    }
}

/// A single named query parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlParameter {
    pub name: String,
    pub value: Value,
}

/// Parameterized query ready for the provider
///
/// Built once per request by [`build_spec`](super::translator::build_spec).
/// Every parameter name starts with [`PARAM_MARKER`] and parameters are
/// ordered by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySpec {
    #[serde(rename = "query")]
    sql: String,
    parameters: Vec<SqlParameter>,
}

impl QuerySpec {
    pub(crate) fn new(sql: String, parameters: Vec<SqlParameter>) -> Self {
        Self { sql, parameters }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameters(&self) -> &[SqlParameter] {
        &self.parameters
    }
}

/// Per-request execution options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Routes the query to a single logical partition
    pub partition_key: Option<String>,
    /// Maximum items per page; `None` leaves the provider default
    pub page_size: Option<u32>,
    /// Opaque cursor from a previous page, passed through unmodified
    pub continuation_token: Option<String>,
}

// ==================
// Response Side
// ==================

/// Diagnostics reported by (or synthesized for) the provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmosMetadata {
    /// Request units consumed
    #[serde(rename = "ru")]
    pub request_units: f64,
    pub status_code: u16,
    pub activity_id: String,
    pub sub_status: u32,
    /// Present only when the provider asked the caller to back off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

/// Public error taxonomy, derived only from the provider status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    Throttled,
    Timeout,
    UpstreamError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BadRequest",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::Throttled => "Throttled",
            ErrorCode::Timeout => "Timeout",
            ErrorCode::UpstreamError => "UpstreamError",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error half of the envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

/// Success half of the envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryData {
    pub count: usize,
    pub results: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

/// Uniform response envelope
///
/// Exactly one of `data` / `error` is set, matching `ok`. Use
/// [`QueryResponse::success`] and [`QueryResponse::failure`] to build one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<QueryData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cosmos: Option<CosmosMetadata>,
}

impl QueryResponse {
    pub fn success(data: QueryData, cosmos: CosmosMetadata) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            cosmos: Some(cosmos),
        }
    }

    pub fn failure(error: ErrorInfo, cosmos: CosmosMetadata) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
            cosmos: Some(cosmos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_params_optional() {
        let request: QueryRequest =
            serde_json::from_value(json!({"sql": "SELECT * FROM c"})).unwrap();
        assert_eq!(request.sql, "SELECT * FROM c");
        assert!(request.params.is_none());
    }

    #[test]
    fn test_success_envelope_omits_error_and_absent_token() {
        let response = QueryResponse::success(
            QueryData {
                count: 0,
                results: vec![],
                continuation_token: None,
            },
            CosmosMetadata {
                request_units: 1.0,
                status_code: 200,
                activity_id: "act".to_string(),
                sub_status: 0,
                retry_after_ms: None,
            },
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["ok"], true);
        assert!(json.get("error").is_none());
        assert!(json["data"].get("continuationToken").is_none());
        assert!(json["cosmos"].get("retryAfterMs").is_none());
        assert_eq!(json["cosmos"]["ru"], 1.0);
        assert_eq!(json["cosmos"]["statusCode"], 200);
        assert_eq!(json["cosmos"]["activityId"], "act");
        assert_eq!(json["cosmos"]["subStatus"], 0);
    }

    #[test]
    fn test_error_code_serializes_as_name() {
        let json = serde_json::to_value(ErrorCode::Throttled).unwrap();
        assert_eq!(json, "Throttled");
        assert_eq!(ErrorCode::UpstreamError.to_string(), "UpstreamError");
    }

    #[test]
    fn test_spec_serializes_provider_shape() {
        let spec = QuerySpec::new(
            "SELECT * FROM c WHERE c.id = @id".to_string(),
            vec![SqlParameter {
                name: "@id".to_string(),
                value: json!("1"),
            }],
        );

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["query"], "SELECT * FROM c WHERE c.id = @id");
        assert_eq!(json["parameters"][0]["name"], "@id");
        assert_eq!(json["parameters"][0]["value"], "1");
    }
}
