//! Client observability metrics
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! embedding application installs a recorder.

use std::time::Duration;

/// Record one dispatch attempt that produced a response
pub fn record_request(method: &str, status: u16, duration: Duration) {
    metrics::counter!(
        "searchlink_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);

    metrics::histogram!(
        "searchlink_request_duration_seconds",
        "method" => method.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Record a node marked failed for the running round
pub fn record_host_failure(host: &str) {
    metrics::counter!(
        "searchlink_host_failures_total",
        "host" => host.to_string(),
    )
    .increment(1);
}

/// Record a request round in which every node failed
pub fn record_cluster_unavailable() {
    metrics::counter!("searchlink_cluster_unavailable_total").increment(1);
}

/// Record the outcome of one bulk request
pub fn record_bulk(items: usize, errors: usize) {
    metrics::counter!("searchlink_bulk_items_total").increment(items as u64);
    metrics::counter!("searchlink_bulk_errors_total").increment(errors as u64);
}

/// Record one accepted scroll page
pub fn record_scroll_page(variant: &'static str) {
    metrics::counter!(
        "searchlink_scroll_pages_total",
        "variant" => variant,
    )
    .increment(1);
}
