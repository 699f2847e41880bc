//! Bulk loading of JSONL files

use super::document::preview;
use anyhow::{Context, Result};
use searchlink::{Bulk, BulkAction, BulkData, SameIndexBulkData, SharedClient};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::Instant;

/// Source for documents to load
pub enum DocumentSource {
    FromFile(PathBuf),
    FromStdin,
}

impl DocumentSource {
    pub fn reader(&self) -> io::Result<Box<dyn BufRead>> {
        match self {
            DocumentSource::FromFile(path) => {
                let file = File::open(path)?;
                Ok(Box::new(BufReader::new(file)))
            }
            DocumentSource::FromStdin => Ok(Box::new(BufReader::new(io::stdin()))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BulkOptions {
    pub index: String,
    pub doc_type: String,
    pub batch_size: usize,
    pub id_field: Option<String>,
    pub create: bool,
    pub no_progress: bool,
}

impl BulkOptions {
    fn action(&self) -> BulkAction {
        if self.create {
            BulkAction::Create
        } else {
            BulkAction::Index
        }
    }
}

/// Progress tracking for a bulk load
struct BulkProgress {
    docs_sent: usize,
    docs_failed: usize,
    bytes_processed: usize,
    batches: usize,
    start_time: Instant,
}

impl BulkProgress {
    fn new() -> Self {
        Self {
            docs_sent: 0,
            docs_failed: 0,
            bytes_processed: 0,
            batches: 0,
            start_time: Instant::now(),
        }
    }

    fn add(&mut self, docs: usize, failed: usize, bytes: usize) {
        self.docs_sent += docs;
        self.docs_failed += failed;
        self.bytes_processed += bytes;
        self.batches += 1;
    }

    fn print_progress(&self) {
        let elapsed = self.start_time.elapsed().as_secs_f64();

        if elapsed > 0.0 {
            let docs_per_sec = self.docs_sent as f64 / elapsed;
            let mb_per_sec = (self.bytes_processed as f64 / 1_000_000.0) / elapsed;
            eprint!(
                "\r  Sent {} docs, {} failed ({:.1} docs/s, {:.2} MB/s)    ",
                self.docs_sent, self.docs_failed, docs_per_sec, mb_per_sec
            );
        }
    }

    fn finish(&self) {
        let elapsed = self.start_time.elapsed();

        eprintln!();
        println!("Bulk load completed:");
        println!("  Documents: {}", self.docs_sent);
        println!("  Failed:    {}", self.docs_failed);
        println!("  Batches:   {}", self.batches);
        println!("  Bytes:     {:.2} MB", self.bytes_processed as f64 / 1_000_000.0);
        println!("  Time:      {:.2}s", elapsed.as_secs_f64());
        if elapsed.as_secs_f64() > 0.0 {
            println!(
                "  Throughput: {:.1} docs/s, {:.2} MB/s",
                self.docs_sent as f64 / elapsed.as_secs_f64(),
                (self.bytes_processed as f64 / 1_000_000.0) / elapsed.as_secs_f64()
            );
        }
    }
}

/// Run bulk command; returns the total number of failed documents
pub fn run_bulk(client: SharedClient, source: DocumentSource, options: &BulkOptions) -> Result<usize> {
    anyhow::ensure!(options.batch_size > 0, "--batch-size must be at least 1");

    let mut bulk = Bulk::new(client);
    let mut batch = SameIndexBulkData::with_size(&options.index, options.batch_size)?;
    let mut progress = BulkProgress::new();
    let mut batch_bytes = 0usize;
    let mut last_progress = Instant::now();

    tracing::info!(
        index = %options.index,
        doc_type = %options.doc_type,
        batch_size = options.batch_size,
        "Starting bulk load"
    );

    let reader = source.reader().context("Failed to open input")?;
    for (line_no, line_result) in reader.lines().enumerate() {
        let line = line_result.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }

        let doc: serde_json::Value = serde_json::from_str(&line).with_context(|| {
            format!("Failed to parse JSON on line {}: {}", line_no + 1, preview(&line))
        })?;
        let id = document_id(&doc, options.id_field.as_deref());
        // compact form keeps every document on a single line
        let payload = doc.to_string();

        batch_bytes += payload.len();
        let full = batch
            .add_document(options.action(), &options.doc_type, &id, &payload)
            .with_context(|| format!("Rejected document on line {}", line_no + 1))?;

        if full {
            let failed = bulk.perform(&batch);
            progress.add(batch.len(), failed, batch_bytes);
            batch.clear();
            batch_bytes = 0;

            if !options.no_progress && last_progress.elapsed().as_millis() > 100 {
                progress.print_progress();
                last_progress = Instant::now();
            }
        }
    }

    // Send remaining documents
    if !batch.is_empty() {
        let failed = bulk.perform(&batch);
        progress.add(batch.len(), failed, batch_bytes);
    }

    if !options.no_progress {
        progress.finish();
    }
    if progress.docs_failed > 0 {
        tracing::warn!(failed = progress.docs_failed, "Some documents were not indexed");
    }

    Ok(progress.docs_failed)
}

/// Id taken from a top-level string or number field; empty lets the cluster assign one
fn document_id(doc: &serde_json::Value, id_field: Option<&str>) -> String {
    match id_field.map(|field| &doc[field]) {
        Some(serde_json::Value::String(id)) => id.clone(),
        Some(serde_json::Value::Number(id)) => id.to_string(),
        _ => String::new(),
    }
}
