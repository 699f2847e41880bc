//! Bulk request execution

use super::data::BulkData;
use super::reconcile::reconcile;
use crate::client::{Client, SharedClient};
use crate::error::Result;
use crate::metrics;
use crate::transport::HttpMethod;
use std::time::Duration;
use tracing::{error, info};

/// Sends bulk batches and reports how many operations failed
pub struct Bulk {
    client: SharedClient,
    error_count: usize,
}

impl Bulk {
    pub fn new(client: SharedClient) -> Self {
        Self {
            client,
            error_count: 0,
        }
    }

    /// Create a bulk indexer with its own client for the given nodes
    pub fn with_hosts<I, S>(hosts: I, timeout: Duration) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Client::with_options(hosts, [crate::ClientOption::Timeout(timeout)])?;
        Ok(Self::new(client.into_shared()))
    }

    /// Run the batch and return the number of failed operations.
    ///
    /// An empty batch issues no request. When the cluster is unreachable or
    /// rejects the request as a whole, every operation counts as failed.
    pub fn perform(&mut self, bulk: &dyn BulkData) -> usize {
        self.error_count = 0;
        if bulk.is_empty() {
            return 0;
        }

        let items = bulk.len();
        info!(index = %bulk.index_name(), items, "Going to index bulk");

        let path = format!("{}/_bulk", bulk.index_name());
        let body = bulk.body();
        let response = self
            .client
            .lock()
            .perform_request(HttpMethod::Post, &path, &body);

        self.error_count = match response {
            Ok(response) if response.is_success() => reconcile(&response.body, items),
            Ok(response) => {
                error!(
                    index = %bulk.index_name(),
                    status = response.status,
                    "Cluster did not accept bulk request"
                );
                items
            }
            Err(e) => {
                error!(index = %bulk.index_name(), error = %e, "Cluster failed while indexing bulk");
                items
            }
        };

        metrics::record_bulk(items, self.error_count);
        self.error_count
    }

    /// Failed operations of the last [`perform`](Self::perform)
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn client(&self) -> &SharedClient {
        &self.client
    }
}
