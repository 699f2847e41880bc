//! Bulk request accumulation

use crate::error::{Error, Result};
use std::fmt;
use tracing::error;

/// Default number of operations after which a batch reports it is full
pub const DEFAULT_BULK_SIZE: usize = 100;

/// Write operation of one bulk item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkAction {
    Index,
    Create,
    Update,
    Delete,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Index => "index",
            BulkAction::Create => "create",
            BulkAction::Update => "update",
            BulkAction::Delete => "delete",
        }
    }

    /// Whether the action is followed by a document line
    pub fn has_payload(&self) -> bool {
        !matches!(self, BulkAction::Delete)
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of a `_bulk` request body
pub trait BulkData {
    /// Index every operation targets
    fn index_name(&self) -> &str;

    fn is_empty(&self) -> bool;

    /// Number of operations
    fn len(&self) -> usize;

    /// Newline-delimited request body
    fn body(&self) -> String;
}

/// One operation: the action line and, except for deletes, the document line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItem {
    pub control: String,
    pub payload: Option<String>,
}

/// Bulk operations sent to a single index.
///
/// The desired size is advisory: adding past it is allowed, the add
/// methods merely report that the batch is due for a flush.
#[derive(Debug, Clone)]
pub struct SameIndexBulkData {
    index_name: String,
    desired_size: usize,
    items: Vec<BulkItem>,
}

impl SameIndexBulkData {
    pub fn new(index_name: impl Into<String>) -> Result<Self> {
        Self::with_size(index_name, DEFAULT_BULK_SIZE)
    }

    pub fn with_size(index_name: impl Into<String>, desired_size: usize) -> Result<Self> {
        let index_name = index_name.into();
        if index_name.is_empty() {
            return Err(Error::InvalidArgument(
                "Bulk index name can not be empty".to_string(),
            ));
        }
        Ok(Self {
            index_name,
            desired_size,
            items: Vec::with_capacity(desired_size),
        })
    }

    pub fn desired_size(&self) -> usize {
        self.desired_size
    }

    pub fn items(&self) -> &[BulkItem] {
        &self.items
    }

    /// Add one operation; returns true once the desired size is reached.
    ///
    /// `payload` is ignored for deletes. Documents must be single-line JSON.
    pub fn add_document(
        &mut self,
        action: BulkAction,
        doc_type: &str,
        id: &str,
        payload: &str,
    ) -> Result<bool> {
        let payload = if action.has_payload() {
            validate_document(payload, id)?;
            Some(payload.to_string())
        } else {
            if id.is_empty() {
                return Err(Error::InvalidDocument(
                    "Delete operation requires a document id".to_string(),
                ));
            }
            None
        };

        self.items.push(BulkItem {
            control: create_control(action, doc_type, id),
            payload,
        });
        Ok(self.items.len() >= self.desired_size)
    }

    /// Index a document, replacing any existing one; empty id lets the cluster assign it
    pub fn index_document(&mut self, doc_type: &str, id: &str, doc: &str) -> Result<bool> {
        self.add_document(BulkAction::Index, doc_type, id, doc)
    }

    /// Create a document, failing server-side if the id exists
    pub fn create_document(&mut self, doc_type: &str, id: &str, doc: &str) -> Result<bool> {
        self.add_document(BulkAction::Create, doc_type, id, doc)
    }

    /// Partially update a document
    pub fn update_document(&mut self, doc_type: &str, id: &str, doc: &str) -> Result<bool> {
        self.add_document(BulkAction::Update, doc_type, id, doc)
    }

    pub fn delete_document(&mut self, doc_type: &str, id: &str) -> Result<bool> {
        self.add_document(BulkAction::Delete, doc_type, id, "")
    }

    /// Drop all operations; index name and desired size are kept
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl BulkData for SameIndexBulkData {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn body(&self) -> String {
        let mut body = String::new();
        for item in &self.items {
            body.push_str(&item.control);
            body.push('\n');
            if let Some(payload) = &item.payload {
                body.push_str(payload);
                body.push('\n');
            }
        }
        body
    }
}

/// Action line `{"<action>": {"_type": "<type>", "_id": "<id>"}}`, `_id` omitted when empty
pub fn create_control(action: BulkAction, doc_type: &str, id: &str) -> String {
    let mut control = format!(
        "{{\"{}\": {{\"_type\": {}",
        action.as_str(),
        json_string(doc_type)
    );
    if !id.is_empty() {
        control.push_str(", \"_id\": ");
        control.push_str(&json_string(id));
    }
    control.push_str("}}");
    control
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn validate_document(doc: &str, id: &str) -> Result<()> {
    if doc.contains(['\n', '\r']) {
        error!(id = %id, "Document contains newline character");
        return Err(Error::InvalidDocument(format!(
            "Document '{}' contains a newline character",
            id
        )));
    }
    Ok(())
}
