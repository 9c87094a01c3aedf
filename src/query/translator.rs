//! Query Translator
//!
//! Turns a [`QueryRequest`] into a [`QuerySpec`] and caller-supplied paging
//! hints into [`QueryOptions`]. Pure: no I/O and no SQL parsing; malformed
//! SQL is left for the provider to reject.

use std::collections::BTreeMap;

use super::executor::QueryFault;
use super::model::{QueryOptions, QueryRequest, QuerySpec, SqlParameter, PARAM_MARKER};

/// Prefix the parameter marker unless the name already carries it
pub fn normalize_param_name(name: &str) -> String {
    if name.starts_with(PARAM_MARKER) {
        name.to_string()
    } else {
        format!("{}{}", PARAM_MARKER, name)
    }
}

/// Build the provider query specification for a request
///
/// `userId` and `@userId` are equivalent. If both spellings appear in one
/// request the marked one wins. Parameters come out ordered by name.
pub fn build_spec(request: &QueryRequest) -> Result<QuerySpec, QueryFault> {
    if request.sql.trim().is_empty() {
        return Err(QueryFault::invalid_request("sql must not be empty"));
    }

    let mut normalized = BTreeMap::new();
    if let Some(params) = &request.params {
        for (name, value) in params {
            let key = normalize_param_name(name);
            if name.starts_with(PARAM_MARKER) {
                normalized.insert(key, value.clone());
            } else {
                normalized.entry(key).or_insert_with(|| value.clone());
            }
        }
    }

    let parameters = normalized
        .into_iter()
        .map(|(name, value)| SqlParameter { name, value })
        .collect();

    Ok(QuerySpec::new(request.sql.clone(), parameters))
}

impl QueryOptions {
    /// Build options from raw caller input
    ///
    /// A non-positive page size is treated as unset.
    pub fn new(
        partition_key: Option<String>,
        page_size: Option<i64>,
        continuation_token: Option<String>,
    ) -> Self {
        Self {
            partition_key,
            page_size: page_size
                .filter(|n| *n > 0)
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX)),
            continuation_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_marker_prepended_once() {
        assert_eq!(normalize_param_name("userId"), "@userId");
        assert_eq!(normalize_param_name("@userId"), "@userId");
    }

    #[test]
    fn test_marked_and_unmarked_inputs_equivalent() {
        let plain = QueryRequest::new("SELECT * FROM c WHERE c.userId = @userId")
            .with_param("userId", json!("x"));
        let marked = QueryRequest::new("SELECT * FROM c WHERE c.userId = @userId")
            .with_param("@userId", json!("x"));

        assert_eq!(build_spec(&plain).unwrap(), build_spec(&marked).unwrap());
    }

    #[test]
    fn test_absent_or_empty_params_yield_no_parameters() {
        let sql = "SELECT * FROM c";
        let absent = build_spec(&QueryRequest::new(sql)).unwrap();
        assert!(absent.parameters().is_empty());
        assert_eq!(absent.sql(), sql);

        let empty = QueryRequest {
            sql: sql.to_string(),
            params: Some(serde_json::Map::new()),
        };
        let spec = build_spec(&empty).unwrap();
        assert!(spec.parameters().is_empty());
        assert_eq!(spec.sql(), sql);
    }

    #[test]
    fn test_empty_sql_rejected() {
        let result = build_spec(&QueryRequest::new("   "));
        assert!(matches!(result, Err(QueryFault::InvalidRequest(_))));
    }

    #[test]
    fn test_marked_spelling_wins_on_collision() {
        let request = QueryRequest::new("SELECT * FROM c WHERE c.a = @a")
            .with_param("a", json!(1))
            .with_param("@a", json!(2));

        let spec = build_spec(&request).unwrap();
        assert_eq!(spec.parameters().len(), 1);
        assert_eq!(spec.parameters()[0].name, "@a");
        assert_eq!(spec.parameters()[0].value, json!(2));
    }

    #[test]
    fn test_values_passed_through_untouched() {
        let request = QueryRequest::new("SELECT * FROM c WHERE c.tags = @tags AND c.n = @n")
            .with_param("tags", json!(["a", "b"]))
            .with_param("n", json!(null));

        let spec = build_spec(&request).unwrap();
        let names: Vec<_> = spec.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["@n", "@tags"]);
        assert_eq!(spec.parameters()[0].value, json!(null));
        assert_eq!(spec.parameters()[1].value, json!(["a", "b"]));
    }

    #[test]
    fn test_page_size_defaulting() {
        assert_eq!(QueryOptions::new(None, Some(25), None).page_size, Some(25));
        assert_eq!(QueryOptions::new(None, Some(0), None).page_size, None);
        assert_eq!(QueryOptions::new(None, Some(-3), None).page_size, None);
        assert_eq!(QueryOptions::new(None, None, None).page_size, None);
    }

    #[test]
    fn test_continuation_token_passed_through() {
        let options = QueryOptions::new(Some("p1".to_string()), None, Some("+RID:~abc==".to_string()));
        assert_eq!(options.partition_key.as_deref(), Some("p1"));
        assert_eq!(options.continuation_token.as_deref(), Some("+RID:~abc=="));
    }
}
