//! Request dispatcher
//!
//! Sends one logical request to the currently selected node and fails over
//! through the cluster until some node answers. A node counts as failed
//! when no response arrives at all or when it answers 503 (overloaded).
//! Every other status, 4xx and 5xx included, is a valid answer handed back
//! to the caller for interpretation.

use crate::error::{Error, Result};
use crate::metrics;
use crate::rotation::{Advance, EndpointRotation};
use crate::transport::{HttpExecutor, HttpMethod, HttpRequest, HttpResponse};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Status a node answers with when it is temporarily overloaded
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// Drives an [`HttpExecutor`] across the endpoints of an [`EndpointRotation`].
///
/// Not synchronized: one dispatcher serves one caller at a time.
pub struct Dispatcher {
    rotation: EndpointRotation,
    executor: Box<dyn HttpExecutor>,
}

impl Dispatcher {
    pub fn new(rotation: EndpointRotation, executor: Box<dyn HttpExecutor>) -> Self {
        Self { rotation, executor }
    }

    pub fn rotation(&self) -> &EndpointRotation {
        &self.rotation
    }

    pub fn executor_mut(&mut self) -> &mut dyn HttpExecutor {
        self.executor.as_mut()
    }

    /// Perform the request on cluster nodes until one of them answers.
    ///
    /// Fails with [`Error::ConnectionFailure`] once every node failed in this round.
    pub fn dispatch(&mut self, method: HttpMethod, path: &str, body: &str) -> Result<HttpResponse> {
        loop {
            if let Some(response) = self.attempt(method, path, body) {
                self.rotation.reset_after_success();
                return Ok(response);
            }

            if self.rotation.advance_after_failure() == Advance::Exhausted {
                error!(method = %method, path = %path, "All hosts failed for request");
                metrics::record_cluster_unavailable();
                return Err(Error::ConnectionFailure(format!(
                    "All hosts failed for {} {}",
                    method, path
                )));
            }
        }
    }

    /// One attempt against the current node; `None` marks the node failed
    fn attempt(&mut self, method: HttpMethod, path: &str, body: &str) -> Option<HttpResponse> {
        let host = self.rotation.current().to_string();
        let request = HttpRequest::new(method, format!("{}{}", host, path), body);
        debug!(method = %method, url = %request.url, "Sending request");

        let started = Instant::now();
        match self.executor.execute(&request) {
            Ok(response) => {
                let elapsed = started.elapsed();
                info!(
                    method = %method,
                    path = %path,
                    host = %host,
                    status = response.status,
                    elapsed_ms = elapsed.as_millis() as u64,
                    size = response.body.len(),
                    "Host responded"
                );
                debug!(body = %response.body, "Host response text");
                metrics::record_request(method.as_str(), response.status, elapsed);

                if response.status == SERVICE_UNAVAILABLE {
                    warn!(host = %host, status = response.status, "Host is unavailable");
                    metrics::record_host_failure(&host);
                    return None;
                }
                Some(response)
            }
            Err(e) => {
                warn!(
                    method = %method,
                    path = %path,
                    host = %host,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "Host is unavailable"
                );
                metrics::record_host_failure(&host);
                None
            }
        }
    }
}
