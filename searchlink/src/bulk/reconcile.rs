//! Bulk response reconciliation
//!
//! Expected response shape:
//!
//! ```json
//! {"took": 30,
//!  "errors": false,
//!  "items": [
//!     {"index": {"_index": "idx", "_id": "1", "status": 201}},
//!     {"delete": {"_index": "idx", "_id": "2", "status": 404}}
//!  ]}
//! ```

use serde_json::Value;
use tracing::{info, warn};

const ACTIONS: [&str; 4] = ["create", "index", "update", "delete"];

/// Count failed operations in a `_bulk` response body.
///
/// An unparsable body fails the whole batch. A structurally incomplete body
/// yields the errors found so far; items the response does not cover are
/// neither counted as failed nor as succeeded.
pub fn reconcile(body: &str, expected_items: usize) -> usize {
    let root = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(root)) => root,
        Ok(_) => {
            warn!("Bulk response is not a JSON object, counting whole bulk as failed");
            return expected_items;
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse bulk response, counting whole bulk as failed");
            return expected_items;
        }
    };

    // trust the summary flag, items are only inspected when errors were reported
    if let Some(Value::Bool(false)) = root.get("errors") {
        return 0;
    }

    let items = match root.get("items") {
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!("Bulk response field 'items' is not an array, error count is inaccurate");
            return 0;
        }
        None => {
            warn!("Bulk ran with errors but the response has no items, error count is inaccurate");
            return 0;
        }
    };

    let errors = items.iter().filter(|item| !item_succeeded(item)).count();

    if items.len() < expected_items {
        info!(
            unknown = expected_items - items.len(),
            "Bulk has more items than responses received, their outcome is unknown"
        );
    }

    errors
}

fn item_succeeded(item: &Value) -> bool {
    let Some(item) = item.as_object() else {
        warn!("Bulk item response is not an object");
        return false;
    };

    let mut actions = item.iter().filter(|(key, _)| ACTIONS.contains(&key.as_str()));
    let result = match (actions.next(), actions.next()) {
        (Some((_, result)), None) => result,
        (None, _) => {
            warn!("Bulk item response has no supported action");
            return false;
        }
        (Some(_), Some(_)) => {
            warn!("Bulk item response has more than one action");
            return false;
        }
    };

    match result.get("status").and_then(Value::as_f64) {
        Some(status) => (200.0..300.0).contains(&status),
        None => {
            warn!("Bulk item response has no numeric status");
            false
        }
    }
}
