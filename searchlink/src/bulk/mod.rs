//! Bulk indexing
//!
//! - **Data**: [`SameIndexBulkData`] accumulates operations into a
//!   newline-delimited `_bulk` body
//! - **Indexer**: [`Bulk`] sends a batch through the shared client
//! - **Reconciliation**: [`reconcile`] turns the response into an error count

mod data;
mod indexer;
mod reconcile;

pub use data::{
    create_control, BulkAction, BulkData, BulkItem, SameIndexBulkData, DEFAULT_BULK_SIZE,
};
pub use indexer::Bulk;
pub use reconcile::reconcile;
