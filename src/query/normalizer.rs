//! Response Normalizer
//!
//! Maps a settled executor outcome into the public [`QueryResponse`]
//! envelope. The mapping is the same whether the page came from a
//! blocking call or a future; it only looks at the resolved value.

use serde_json::{json, Map};

use super::executor::{Page, ProviderFault, QueryFault};
use super::model::{CosmosMetadata, ErrorCode, ErrorInfo, QueryData, QueryResponse};

/// Message used when a failure carries no description
pub const FALLBACK_MESSAGE: &str = "Internal server error";

/// Activity id reported when the provider was never reached
pub const UNKNOWN_ACTIVITY_ID: &str = "N/A";

/// Map a provider status code onto the error taxonomy
pub fn error_code_for_status(status_code: u16) -> ErrorCode {
    match status_code {
        400 => ErrorCode::BadRequest,
        404 => ErrorCode::NotFound,
        429 => ErrorCode::Throttled,
        408 => ErrorCode::Timeout,
        _ => ErrorCode::UpstreamError,
    }
}

/// Map either outcome of an executor call
pub fn normalize(outcome: Result<Page, QueryFault>) -> QueryResponse {
    match outcome {
        Ok(page) => from_success(page),
        Err(fault) => from_failure(&fault),
    }
}

/// Build the success envelope for a page
pub fn from_success(page: Page) -> QueryResponse {
    let data = QueryData {
        count: page.items.len(),
        results: page.items,
        continuation_token: page.continuation_token,
    };

    let cosmos = CosmosMetadata {
        request_units: page.request_charge,
        status_code: 200,
        activity_id: page.activity_id,
        sub_status: 0,
        retry_after_ms: None,
    };

    QueryResponse::success(data, cosmos)
}

/// Build the error envelope for any failure
pub fn from_failure(fault: &QueryFault) -> QueryResponse {
    match fault {
        QueryFault::Provider(provider) => from_provider_fault(provider),
        other => from_upstream_failure(other.message()),
    }
}

fn from_provider_fault(fault: &ProviderFault) -> QueryResponse {
    let retry_after_ms = fault
        .retry_after
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));

    let mut details = Map::new();
    details.insert("activityId".to_string(), json!(fault.activity_id));
    details.insert("subStatus".to_string(), json!(fault.sub_status));
    if let Some(ms) = retry_after_ms {
        details.insert("retryAfterMs".to_string(), json!(ms));
    }

    let error = ErrorInfo {
        code: error_code_for_status(fault.status_code),
        message: fault.message.clone(),
        details: Some(details),
    };

    let cosmos = CosmosMetadata {
        request_units: fault.request_charge,
        status_code: fault.status_code,
        activity_id: fault.activity_id.clone(),
        sub_status: fault.sub_status,
        retry_after_ms,
    };

    QueryResponse::failure(error, cosmos)
}

fn from_upstream_failure(message: Option<String>) -> QueryResponse {
    let error = ErrorInfo {
        code: ErrorCode::UpstreamError,
        message: message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        details: None,
    };

    QueryResponse::failure(error, synthesized_metadata())
}

/// Placeholder diagnostics for failures that never reached the provider
pub fn synthesized_metadata() -> CosmosMetadata {
    CosmosMetadata {
        request_units: 0.0,
        status_code: 500,
        activity_id: UNKNOWN_ACTIVITY_ID.to_string(),
        sub_status: 0,
        retry_after_ms: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn page(items: Vec<serde_json::Value>, token: Option<&str>) -> Page {
        Page {
            items,
            request_charge: 2.83,
            activity_id: "act-1".to_string(),
            continuation_token: token.map(str::to_string),
        }
    }

    fn provider_fault(status_code: u16) -> ProviderFault {
        ProviderFault {
            status_code,
            sub_status: 0,
            activity_id: "act-2".to_string(),
            request_charge: 1.5,
            message: "provider said no".to_string(),
            retry_after: None,
        }
    }

    #[test]
    fn test_success_round_trip() {
        let a = json!({"id": "A"});
        let b = json!({"id": "B"});
        let response = from_success(page(vec![a.clone(), b.clone()], Some("tok-2")));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            json!({
                "ok": true,
                "data": {"count": 2, "results": [a, b], "continuationToken": "tok-2"},
                "cosmos": {"ru": 2.83, "statusCode": 200, "activityId": "act-1", "subStatus": 0}
            })
        );
    }

    #[test]
    fn test_final_page_has_no_continuation_token() {
        let response = from_success(page(vec![], None));
        let data = response.data.unwrap();
        assert_eq!(data.count, 0);
        assert!(data.continuation_token.is_none());
    }

    #[test]
    fn test_status_taxonomy() {
        assert_eq!(error_code_for_status(400), ErrorCode::BadRequest);
        assert_eq!(error_code_for_status(404), ErrorCode::NotFound);
        assert_eq!(error_code_for_status(429), ErrorCode::Throttled);
        assert_eq!(error_code_for_status(408), ErrorCode::Timeout);
        assert_eq!(error_code_for_status(403), ErrorCode::UpstreamError);
        assert_eq!(error_code_for_status(503), ErrorCode::UpstreamError);
    }

    #[test]
    fn test_throttled_fault() {
        let fault = ProviderFault {
            status_code: 429,
            sub_status: 3200,
            retry_after: Some(Duration::from_millis(5000)),
            ..provider_fault(429)
        };

        let response = from_failure(&QueryFault::Provider(fault));
        assert!(!response.ok);
        assert!(response.data.is_none());

        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::Throttled);
        assert_eq!(error.message, "provider said no");
        let details = error.details.unwrap();
        assert_eq!(details["subStatus"], 3200);
        assert_eq!(details["retryAfterMs"], 5000);
        assert_eq!(details["activityId"], "act-2");

        let cosmos = response.cosmos.unwrap();
        assert_eq!(cosmos.status_code, 429);
        assert_eq!(cosmos.sub_status, 3200);
        assert_eq!(cosmos.retry_after_ms, Some(5000));
        assert_eq!(cosmos.request_units, 1.5);
    }

    #[test]
    fn test_fault_without_retry_after_omits_it() {
        let response = from_failure(&QueryFault::Provider(provider_fault(404)));

        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::NotFound);
        assert!(!error.details.unwrap().contains_key("retryAfterMs"));
        assert!(response.cosmos.unwrap().retry_after_ms.is_none());
    }

    #[test]
    fn test_retry_after_truncated_to_whole_millis() {
        let fault = ProviderFault {
            retry_after: Some(Duration::from_micros(1_500_900)),
            ..provider_fault(429)
        };

        let response = from_failure(&QueryFault::Provider(fault));
        assert_eq!(response.cosmos.unwrap().retry_after_ms, Some(1500));
    }

    #[test]
    fn test_unrelated_failure_without_message() {
        let response = from_failure(&QueryFault::Unknown);

        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::UpstreamError);
        assert_eq!(error.message, FALLBACK_MESSAGE);
        assert!(error.details.is_none());

        let cosmos = response.cosmos.unwrap();
        assert_eq!(cosmos.request_units, 0.0);
        assert_eq!(cosmos.status_code, 500);
        assert_eq!(cosmos.activity_id, "N/A");
        assert_eq!(cosmos.sub_status, 0);
        assert!(cosmos.retry_after_ms.is_none());
    }

    #[test]
    fn test_unrelated_failure_keeps_message() {
        let response = from_failure(&QueryFault::transport("connection reset"));
        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::UpstreamError);
        assert_eq!(error.message, "Transport failure: connection reset");
    }

    #[test]
    fn test_exactly_one_half_populated() {
        let outcomes = vec![
            Ok(page(vec![json!(1)], None)),
            Err(QueryFault::Provider(provider_fault(400))),
            Err(QueryFault::invalid_request("bad")),
            Err(QueryFault::Unknown),
        ];

        for outcome in outcomes {
            let response = normalize(outcome);
            assert_eq!(response.data.is_some(), response.ok);
            assert_eq!(response.error.is_some(), !response.ok);
            assert!(response.cosmos.is_some());
        }
    }
}
