//! Scroll response validation

use serde_json::Value;
use thiserror::Error;

/// A validated page of scroll results
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollPage {
    document: Value,
    scroll_id: String,
}

impl ScrollPage {
    /// Entries of `hits.hits`
    pub fn hits(&self) -> &[Value] {
        self.document["hits"]["hits"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Cursor token returned with this page
    pub fn scroll_id(&self) -> &str {
        &self.scroll_id
    }

    /// `hits.total`, either a plain number or the `{"value": n}` form
    pub fn total_hits(&self) -> Option<u64> {
        let total = &self.document["hits"]["total"];
        total.as_u64().or_else(|| total["value"].as_u64())
    }

    /// The whole response document
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn into_document(self) -> Value {
        self.document
    }
}

/// Why a scroll response was not accepted as a page
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScrollRejection {
    #[error("response is not valid JSON: {0}")]
    Malformed(String),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("response reports an error")]
    ErrorReported,

    #[error("request timed out")]
    TimedOut,

    #[error("no information about failed shards")]
    MissingShards,

    #[error("{0} shards failed")]
    ShardsFailed(u64),

    #[error("hits.hits array is missing")]
    MissingHits,

    #[error("_scroll_id is missing or empty")]
    MissingScrollId,
}

/// Validate a scroll response body and extract the page.
///
/// Pages from timed-out requests or with failed shards are rejected, since
/// their data can not be trusted.
pub fn parse_scroll_response(body: &str) -> Result<ScrollPage, ScrollRejection> {
    let document: Value =
        serde_json::from_str(body).map_err(|e| ScrollRejection::Malformed(e.to_string()))?;
    let root = document.as_object().ok_or(ScrollRejection::NotAnObject)?;

    match root.get("error") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {}
        Some(_) => return Err(ScrollRejection::ErrorReported),
    }

    match root.get("timed_out") {
        None | Some(Value::Bool(false)) => {}
        Some(_) => return Err(ScrollRejection::TimedOut),
    }

    let failed_shards = root
        .get("_shards")
        .and_then(|shards| shards.get("failed"))
        .and_then(Value::as_f64)
        .ok_or(ScrollRejection::MissingShards)?;
    if failed_shards > 0.0 {
        return Err(ScrollRejection::ShardsFailed(failed_shards as u64));
    }

    if !root
        .get("hits")
        .and_then(|hits| hits.get("hits"))
        .is_some_and(Value::is_array)
    {
        return Err(ScrollRejection::MissingHits);
    }

    let scroll_id = root
        .get("_scroll_id")
        .and_then(Value::as_str)
        // an empty token names no server-side cursor
        .filter(|id| !id.is_empty())
        .ok_or(ScrollRejection::MissingScrollId)?
        .to_string();

    Ok(ScrollPage {
        document,
        scroll_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(scroll_id: &str, hits: usize, failed: u64) -> Value {
        json!({
            "_scroll_id": scroll_id,
            "took": 22,
            "timed_out": false,
            "_shards": {"total": 2 + failed, "successful": 2, "failed": failed},
            "hits": {"total": hits, "hits": vec![json!({}); hits]}
        })
    }

    #[test]
    fn test_valid_page() {
        let page = parse_scroll_response(&response("A0", 3, 0).to_string()).unwrap();
        assert_eq!(page.scroll_id(), "A0");
        assert_eq!(page.hits().len(), 3);
        assert_eq!(page.total_hits(), Some(3));
    }

    #[test]
    fn test_total_hits_object_form() {
        let mut doc = response("A0", 1, 0);
        doc["hits"]["total"] = json!({"value": 12, "relation": "eq"});
        let page = parse_scroll_response(&doc.to_string()).unwrap();
        assert_eq!(page.total_hits(), Some(12));
    }

    #[test]
    fn test_rejects_non_json() {
        assert!(matches!(
            parse_scroll_response("Not Found"),
            Err(ScrollRejection::Malformed(_))
        ));
        assert_eq!(parse_scroll_response("[]"), Err(ScrollRejection::NotAnObject));
    }

    #[test]
    fn test_rejects_error_field() {
        let mut doc = response("A0", 1, 0);
        doc["error"] = json!({"type": "search_context_missing_exception"});
        assert_eq!(
            parse_scroll_response(&doc.to_string()),
            Err(ScrollRejection::ErrorReported)
        );

        doc["error"] = json!(false);
        assert!(parse_scroll_response(&doc.to_string()).is_ok());
    }

    #[test]
    fn test_rejects_timed_out() {
        let mut doc = response("A0", 1, 0);
        doc["timed_out"] = json!(true);
        assert_eq!(parse_scroll_response(&doc.to_string()), Err(ScrollRejection::TimedOut));
    }

    #[test]
    fn test_rejects_failed_shards() {
        assert_eq!(
            parse_scroll_response(&response("A3", 0, 1).to_string()),
            Err(ScrollRejection::ShardsFailed(1))
        );
    }

    #[test]
    fn test_rejects_missing_shard_info() {
        let mut doc = response("A0", 1, 0);
        doc["_shards"] = json!({"total": 2});
        assert_eq!(
            parse_scroll_response(&doc.to_string()),
            Err(ScrollRejection::MissingShards)
        );

        doc["_shards"] = json!({"failed": "0"});
        assert_eq!(
            parse_scroll_response(&doc.to_string()),
            Err(ScrollRejection::MissingShards)
        );

        doc.as_object_mut().unwrap().remove("_shards");
        assert_eq!(
            parse_scroll_response(&doc.to_string()),
            Err(ScrollRejection::MissingShards)
        );
    }

    #[test]
    fn test_rejects_missing_hits() {
        let mut doc = response("A0", 1, 0);
        doc["hits"] = json!({"total": 0});
        assert_eq!(parse_scroll_response(&doc.to_string()), Err(ScrollRejection::MissingHits));
    }

    #[test]
    fn test_rejects_missing_scroll_id() {
        let mut doc = response("A0", 1, 0);
        doc["_scroll_id"] = json!(17);
        assert_eq!(
            parse_scroll_response(&doc.to_string()),
            Err(ScrollRejection::MissingScrollId)
        );
    }

    #[test]
    fn test_rejects_empty_scroll_id() {
        assert_eq!(
            parse_scroll_response(&response("", 2, 0).to_string()),
            Err(ScrollRejection::MissingScrollId)
        );
    }
}
