//! Scroll session state machine
//!
//! ```text
//! Uninitialized --init()--> Initialized --next_page()--> Started
//!       ^                                                   |
//!       +------------------------ clear() ------------------+
//! ```
//!
//! In `Initialized` the next page opens a server-side cursor; in `Started`
//! it continues from the last cursor token. Failed calls leave the state
//! untouched, so a caller may simply call `next_page` again.

use super::parser::{parse_scroll_response, ScrollPage};
use crate::client::{Client, SharedClient};
use crate::error::Result;
use crate::metrics;
use crate::transport::HttpMethod;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_SCROLL_SIZE: usize = 100;
pub const DEFAULT_SCROLL_TTL: &str = "1m";

/// Status a node answers with once a cursor has nothing more to give
const NOT_FOUND: u16 = 404;

/// Wait for the client lock on drop when its timeout can not be read
const DEFAULT_RELEASE_TIMEOUT: Duration = Duration::from_millis(6000);

/// Pagination protocol flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollVariant {
    /// The opening request already returns the first page
    Standard,
    /// Legacy `search_type=scan`: the opening request only yields a cursor
    Scan,
}

impl ScrollVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollVariant::Standard => "standard",
            ScrollVariant::Scan => "scan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    Uninitialized,
    Initialized,
    Started,
}

#[derive(Debug, Clone)]
struct ScrollParams {
    index: String,
    doc_type: String,
    search_body: String,
}

/// Cursor-based pagination over the results of one search.
///
/// Dropping a started session releases its server-side cursor; failures
/// while doing so are only logged. The drop waits for the shared client at
/// most one request timeout, so a lock held by the dropping thread itself
/// costs a bounded delay and leaves the cursor to expire on the server.
pub struct Scroll {
    client: SharedClient,
    release_timeout: Duration,
    page_size: usize,
    ttl: String,
    variant: ScrollVariant,
    params: Option<ScrollParams>,
    scroll_id: Option<String>,
}

impl Scroll {
    /// Standard scroll returning `page_size` hits per page, keeping the
    /// server context alive for `ttl` (Elasticsearch time units, e.g. `1m`)
    pub fn new(client: SharedClient, page_size: usize, ttl: impl Into<String>) -> Self {
        let release_timeout = client
            .try_lock()
            .map(|client| client.config().request_timeout())
            .unwrap_or(DEFAULT_RELEASE_TIMEOUT);
        Self {
            client,
            release_timeout,
            page_size,
            ttl: ttl.into(),
            variant: ScrollVariant::Standard,
            params: None,
            scroll_id: None,
        }
    }

    /// Legacy scan scroll.
    ///
    /// Scan pages hold up to `page_size` hits per primary shard, so a
    /// non-zero `primary_shards` divides the page size to keep pages near
    /// `page_size` in total.
    pub fn scan(
        client: SharedClient,
        page_size: usize,
        ttl: impl Into<String>,
        primary_shards: usize,
    ) -> Self {
        let page_size = if primary_shards == 0 {
            page_size
        } else {
            (page_size / primary_shards).max(1)
        };
        let mut scroll = Self::new(client, page_size, ttl);
        scroll.variant = ScrollVariant::Scan;
        scroll
    }

    /// Standard scroll with its own client for the given nodes
    pub fn with_hosts<I, S>(
        hosts: I,
        page_size: usize,
        ttl: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Client::with_options(hosts, [crate::ClientOption::Timeout(timeout)])?;
        Ok(Self::new(client.into_shared(), page_size, ttl))
    }

    /// Scan scroll with its own client for the given nodes
    pub fn scan_with_hosts<I, S>(
        hosts: I,
        page_size: usize,
        ttl: impl Into<String>,
        primary_shards: usize,
        timeout: Duration,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Client::with_options(hosts, [crate::ClientOption::Timeout(timeout)])?;
        Ok(Self::scan(client.into_shared(), page_size, ttl, primary_shards))
    }

    pub fn client(&self) -> &SharedClient {
        &self.client
    }

    pub fn variant(&self) -> ScrollVariant {
        self.variant
    }

    /// Hits requested per page (per shard for scan)
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn ttl(&self) -> &str {
        &self.ttl
    }

    pub fn state(&self) -> ScrollState {
        match (&self.params, &self.scroll_id) {
            (None, _) => ScrollState::Uninitialized,
            (Some(_), None) => ScrollState::Initialized,
            (Some(_), Some(_)) => ScrollState::Started,
        }
    }

    /// Current cursor token, if a cursor is open
    pub fn scroll_id(&self) -> Option<&str> {
        self.scroll_id.as_deref()
    }

    /// Prepare a new search; a running one is cleared first
    pub fn init(
        &mut self,
        index: impl Into<String>,
        doc_type: impl Into<String>,
        search_body: impl Into<String>,
    ) {
        if self.state() != ScrollState::Uninitialized {
            self.clear();
        }
        self.params = Some(ScrollParams {
            index: index.into(),
            doc_type: doc_type.into(),
            search_body: search_body.into(),
        });
    }

    /// Fetch the next page of results.
    ///
    /// Returns `None` when the session is not initialized, the cluster is
    /// unreachable, the response is rejected, or the cursor is exhausted.
    pub fn next_page(&mut self) -> Option<ScrollPage> {
        match self.state() {
            ScrollState::Uninitialized => {
                warn!("There is no scroll initialized, call init() first");
                None
            }
            ScrollState::Initialized => self.open(),
            ScrollState::Started => self.continue_scroll(),
        }
    }

    fn open(&mut self) -> Option<ScrollPage> {
        let params = self.params.clone()?;
        let mut path = format!(
            "{}/{}/_search?scroll={}&size={}",
            params.index, params.doc_type, self.ttl, self.page_size
        );
        if self.variant == ScrollVariant::Scan {
            path.push_str("&search_type=scan");
        }
        info!(path = %path, variant = self.variant.as_str(), "Scroll (create)");
        info!(body = %params.search_body, "Scroll (create) body");

        let Some(page) = self.run(&path, &params.search_body) else {
            warn!("Scroll (create) did not return a page");
            return None;
        };

        match self.variant {
            ScrollVariant::Standard => Some(page),
            // scan answers the opening request with a cursor only
            ScrollVariant::Scan => self.continue_scroll(),
        }
    }

    fn continue_scroll(&mut self) -> Option<ScrollPage> {
        let scroll_id = self.scroll_id.clone()?;
        let path = format!("_search/scroll?scroll={}", self.ttl);
        info!(path = %path, "Scroll (next)");
        let body = json!({ "scroll_id": scroll_id }).to_string();
        self.run(&path, &body)
    }

    fn run(&mut self, path: &str, body: &str) -> Option<ScrollPage> {
        let response = match self.client.lock().perform_request(HttpMethod::Post, path, body) {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Cluster failed while scrolling");
                return None;
            }
        };

        let parsed = parse_scroll_response(&response.body);
        let page = match (response.is_success(), response.status == NOT_FOUND, parsed) {
            (true, _, Ok(page)) => page,
            (true, _, Err(reason)) => {
                error!(
                    status = response.status,
                    reason = %reason,
                    "Scroll page rejected, response data is corrupted or incomplete"
                );
                return None;
            }
            (false, true, Ok(page)) if !page.hits().is_empty() => page,
            (false, true, Ok(_)) => {
                info!("Scroll has no more results");
                return None;
            }
            (false, true, Err(reason)) => {
                info!(reason = %reason, "Scroll context not found");
                return None;
            }
            (false, false, _) => {
                warn!(status = response.status, "Scroll request failed");
                return None;
            }
        };

        // tokens may change from page to page
        self.scroll_id = Some(page.scroll_id().to_string());
        metrics::record_scroll_page(self.variant.as_str());
        Some(page)
    }

    /// Release the server-side cursor and forget the search.
    ///
    /// Cleanup is best effort: failures are logged and the session is reset
    /// regardless.
    pub fn clear(&mut self) {
        info!("Scroll (clear) called");
        match self.scroll_id.take() {
            Some(scroll_id) => release_cursor(&mut self.client.lock(), &scroll_id),
            None => info!("There is no scroll started"),
        }
        self.params = None;
    }
}

impl Drop for Scroll {
    fn drop(&mut self) {
        let Some(scroll_id) = self.scroll_id.take() else {
            return;
        };
        // the owner may be holding the client lock on this thread
        match self.client.try_lock_for(self.release_timeout) {
            Some(mut client) => release_cursor(&mut client, &scroll_id),
            None => warn!(
                timeout_ms = self.release_timeout.as_millis() as u64,
                "Client is busy, leaving scroll cursor to expire on the server"
            ),
        }
    }
}

fn release_cursor(client: &mut Client, scroll_id: &str) {
    let body = json!({ "scroll_id": [scroll_id] }).to_string();
    match client.perform_request(HttpMethod::Delete, "_search/scroll/", &body) {
        Ok(response) if response.is_success() => {}
        Ok(response) => {
            warn!(
                status = response.status,
                body = %response.body,
                "Scroll delete failed"
            );
        }
        Err(e) => {
            error!(error = %e, "Cluster failed while clearing scroll");
        }
    }
}
