//! Gateway Query Client
//!
//! [`QueryExecutor`] over the provider's REST gateway. One instance (and one
//! pooled `reqwest::Client`) is built at startup and shared by all requests.

use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::config::CosmosConfig;
use crate::query::executor::{ExecuteFuture, Page, ProviderFault, QueryExecutor, QueryFault};
use crate::query::model::{QueryOptions, QuerySpec};

use super::auth::{http_date, MasterKey};
use super::GatewayError;

/// Gateway API version sent with every request
pub const API_VERSION: &str = "2018-12-31";

const QUERY_CONTENT_TYPE: &str = "application/query+json";

// Request headers
const H_DATE: &str = "x-ms-date";
const H_VERSION: &str = "x-ms-version";
const H_IS_QUERY: &str = "x-ms-documentdb-isquery";
const H_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const H_CROSS_PARTITION: &str = "x-ms-documentdb-query-enablecrosspartition";
const H_PARALLELIZE: &str = "x-ms-documentdb-query-parallelizecrosspartitionquery";
const H_MAX_ITEM_COUNT: &str = "x-ms-max-item-count";

// Request and response
const H_CONTINUATION: &str = "x-ms-continuation";

// Response headers
const H_REQUEST_CHARGE: &str = "x-ms-request-charge";
const H_ACTIVITY_ID: &str = "x-ms-activity-id";
const H_SUB_STATUS: &str = "x-ms-substatus";
const H_RETRY_AFTER_MS: &str = "x-ms-retry-after-ms";

/// Successful query feed body
#[derive(Debug, Deserialize)]
struct FeedBody {
    #[serde(rename = "Documents")]
    documents: Vec<Value>,
}

/// Error body; only the message is used
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Query client for the provider's REST gateway
#[derive(Debug, Clone)]
pub struct CosmosGatewayClient {
    http: reqwest::Client,
    endpoint: String,
    database: String,
    key: MasterKey,
    parallel_cross_partition: bool,
}

impl CosmosGatewayClient {
    /// Build the shared client from validated configuration
    pub fn from_config(config: &CosmosConfig) -> Result<Self, GatewayError> {
        let key = MasterKey::from_base64(&config.key)?;

        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(config.connection.max_connections)
            .timeout(Duration::from_millis(config.connection.request_timeout_ms))
            .build()
            .map_err(GatewayError::Client)?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim().trim_end_matches('/').to_string(),
            database: config.database.clone(),
            key,
            parallel_cross_partition: config.max_degree_of_parallelism > 0,
        })
    }

    /// Signature resource link for a container's document feed
    fn resource_link(&self, container: &str) -> String {
        format!("dbs/{}/colls/{}", self.database, container)
    }

    fn docs_url(&self, container: &str) -> String {
        format!(
            "{}/dbs/{}/colls/{}/docs",
            self.endpoint,
            urlencoding::encode(&self.database),
            urlencoding::encode(container)
        )
    }

    fn request_headers(
        &self,
        container: &str,
        options: &QueryOptions,
    ) -> Result<HeaderMap, QueryFault> {
        let date = http_date(Utc::now());
        let authorization =
            self.key
                .authorization("post", "docs", &self.resource_link(container), &date);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value("authorization", &authorization)?);
        headers.insert(H_DATE, header_value(H_DATE, &date)?);
        headers.insert(H_VERSION, HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(QUERY_CONTENT_TYPE));
        headers.insert(H_IS_QUERY, HeaderValue::from_static("True"));

        match &options.partition_key {
            Some(pk) => {
                let encoded = partition_key_header(pk)
                    .map_err(|e| QueryFault::invalid_request(e.to_string()))?;
                headers.insert(H_PARTITION_KEY, header_value(H_PARTITION_KEY, &encoded)?);
            }
            None => {
                headers.insert(H_CROSS_PARTITION, HeaderValue::from_static("True"));
                if self.parallel_cross_partition {
                    headers.insert(H_PARALLELIZE, HeaderValue::from_static("True"));
                }
            }
        }

        if let Some(page_size) = options.page_size {
            headers.insert(H_MAX_ITEM_COUNT, HeaderValue::from(page_size));
        }

        if let Some(token) = &options.continuation_token {
            headers.insert(H_CONTINUATION, header_value(H_CONTINUATION, token)?);
        }

        Ok(headers)
    }

    async fn query_page(
        &self,
        container: &str,
        spec: &QuerySpec,
        options: &QueryOptions,
    ) -> Result<Page, QueryFault> {
        let headers = self.request_headers(container, options)?;
        let body = serde_json::to_vec(spec).map_err(|e| QueryFault::invalid_request(e.to_string()))?;

        let response = self
            .http
            .post(self.docs_url(container))
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(transport_fault)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(transport_fault)?;

        let activity_id = header_string(&headers, H_ACTIVITY_ID).unwrap_or_default();
        let request_charge = header_parse::<f64>(&headers, H_REQUEST_CHARGE).unwrap_or(0.0);

        if !status.is_success() {
            return Err(QueryFault::Provider(ProviderFault {
                status_code: status.as_u16(),
                sub_status: header_parse::<u32>(&headers, H_SUB_STATUS).unwrap_or(0),
                activity_id,
                request_charge,
                message: error_message(status, &body),
                retry_after: header_parse::<u64>(&headers, H_RETRY_AFTER_MS)
                    .map(Duration::from_millis),
            }));
        }

        let feed: FeedBody = serde_json::from_slice(&body)
            .map_err(|e| QueryFault::malformed(format!("query feed: {}", e)))?;

        Ok(Page {
            items: feed.documents,
            request_charge,
            activity_id,
            continuation_token: header_string(&headers, H_CONTINUATION)
                .filter(|t| !t.is_empty()),
        })
    }
}

impl QueryExecutor for CosmosGatewayClient {
    fn execute<'a>(
        &'a self,
        container: &'a str,
        spec: &'a QuerySpec,
        options: &'a QueryOptions,
    ) -> ExecuteFuture<'a> {
        Box::pin(self.query_page(container, spec, options))
    }
}

fn transport_fault(e: reqwest::Error) -> QueryFault {
    if e.is_timeout() {
        QueryFault::transport(format!("request timed out: {}", e))
    } else {
        QueryFault::transport(e.to_string())
    }
}

/// JSON array form of a partition key, with non-ASCII escaped as `\uXXXX`
/// so the header stays visible ASCII
fn partition_key_header(pk: &str) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(&[pk])?;
    let mut escaped = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(escaped)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, QueryFault> {
    HeaderValue::from_str(value)
        .map_err(|_| QueryFault::invalid_request(format!("{} is not a valid header value", name)))
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn header_parse<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    header_string(headers, name).and_then(|s| s.trim().parse().ok())
}

/// Provider message verbatim; raw body or status reason when it has none
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(ErrorBody {
        message: Some(message),
    }) = serde_json::from_slice::<ErrorBody>(body)
    {
        return message;
    }

    let raw = String::from_utf8_lossy(body).trim().to_string();
    if !raw.is_empty() {
        return raw;
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
