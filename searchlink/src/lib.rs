//! searchlink - resilient client for Elasticsearch-compatible clusters
//!
//! # Architecture
//!
//! - **Rotation**: random start node, circular failover, sticky success
//! - **Dispatch**: one logical request per round over the cluster nodes,
//!   failing only when every node is unreachable or overloaded
//! - **Client**: document REST operations (get, index, remove, search)
//! - **Bulk**: newline-delimited batch accumulation and per-item error
//!   reconciliation
//! - **Scroll**: cursor pagination including the legacy scan variant, with
//!   guaranteed cursor release
//! - **Transport**: pluggable HTTP executor, reqwest by default
//!
//! # Example
//!
//! ```no_run
//! use searchlink::{Bulk, Client, SameIndexBulkData, Scroll};
//!
//! # fn main() -> searchlink::Result<()> {
//! let client = Client::new(["http://es1:9200/", "http://es2:9200/"])?.into_shared();
//!
//! let mut batch = SameIndexBulkData::new("articles")?;
//! batch.index_document("_doc", "1", r#"{"title": "hello"}"#)?;
//! let failed = Bulk::new(client.clone()).perform(&batch);
//! assert_eq!(failed, 0);
//!
//! let mut scroll = Scroll::new(client, 500, "1m");
//! scroll.init("articles", "_doc", r#"{"query": {"match_all": {}}}"#);
//! while let Some(page) = scroll.next_page() {
//!     if page.hits().is_empty() {
//!         break;
//!     }
//!     println!("{} hits", page.hits().len());
//! }
//! scroll.clear();
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod rotation;
pub mod scroll;
pub mod transport;

mod client;

pub use bulk::{Bulk, BulkAction, BulkData, SameIndexBulkData};
pub use client::{Client, SharedClient};
pub use config::{apply_option, ClientConfig, ClientOption, TlsConfig};
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use rotation::{Advance, EndpointRotation, RandomIndex};
pub use scroll::{Scroll, ScrollPage, ScrollState, ScrollVariant};
pub use transport::{
    HttpExecutor, HttpMethod, HttpRequest, HttpResponse, ReqwestExecutor, TransportError,
};
