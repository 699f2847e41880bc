//! Export of search results through a scroll cursor

use anyhow::{Context, Result};
use searchlink::{Scroll, SharedClient};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct ScrollOptions {
    pub index: String,
    pub doc_type: String,
    pub query: String,
    pub size: usize,
    pub ttl: String,
    pub scan: bool,
    pub shards: usize,
    pub output: Option<PathBuf>,
}

/// Run scroll command; returns the number of exported hits
pub fn run_scroll(client: SharedClient, options: &ScrollOptions) -> Result<usize> {
    serde_json::from_str::<serde_json::Value>(&options.query).context("Query is not valid JSON")?;

    let mut writer: Box<dyn Write> = match &options.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut scroll = if options.scan {
        Scroll::scan(client, options.size, options.ttl.as_str(), options.shards)
    } else {
        Scroll::new(client, options.size, options.ttl.as_str())
    };
    scroll.init(
        options.index.as_str(),
        options.doc_type.as_str(),
        options.query.as_str(),
    );

    let start = Instant::now();
    let exported = export_pages(&mut scroll, &mut writer)?;
    scroll.clear();
    writer.flush().context("Failed to flush output")?;

    tracing::info!(
        hits = exported,
        elapsed_ms = start.elapsed().as_millis() as u64,
        variant = scroll.variant().as_str(),
        "Scroll export finished"
    );
    Ok(exported)
}

/// Write every hit of every page as one JSON line until the cursor runs dry
fn export_pages(scroll: &mut Scroll, writer: &mut dyn Write) -> Result<usize> {
    let mut exported = 0usize;
    let mut total_reported = false;

    while let Some(page) = scroll.next_page() {
        if !total_reported {
            if let Some(total) = page.total_hits() {
                tracing::info!(total, "Scroll opened");
            }
            total_reported = true;
        }
        if page.hits().is_empty() {
            break;
        }
        for hit in page.hits() {
            serde_json::to_writer(&mut *writer, hit).context("Failed to write hit")?;
            writer.write_all(b"\n").context("Failed to write hit")?;
        }
        exported += page.hits().len();
    }

    Ok(exported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchlink::{
        Client, ClientConfig, HttpExecutor, HttpRequest, HttpResponse, TransportError,
    };
    use serde_json::json;

    /// Serves `pages` hits pages, then an empty one
    struct PagedCluster {
        pages: usize,
        served: usize,
    }

    impl HttpExecutor for PagedCluster {
        fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            if request.url.contains("_search/scroll/") {
                return Ok(HttpResponse::new(200, "{}"));
            }
            let hits: Vec<_> = if self.served < self.pages {
                (0..2).map(|i| json!({"_id": format!("{}-{}", self.served, i)})).collect()
            } else {
                Vec::new()
            };
            self.served += 1;
            let body = json!({
                "_scroll_id": format!("S{}", self.served),
                "timed_out": false,
                "_shards": {"total": 1, "successful": 1, "failed": 0},
                "hits": {"total": self.pages * 2, "hits": hits}
            });
            Ok(HttpResponse::new(200, body.to_string()))
        }
    }

    #[test]
    fn test_export_writes_one_line_per_hit() {
        let client = Client::with_executor(
            ClientConfig::new(["http://node0:9200/"]),
            Box::new(PagedCluster { pages: 3, served: 0 }),
        )
        .unwrap();
        let mut scroll = Scroll::new(client.into_shared(), 2, "1m");
        scroll.init("idx", "_doc", "{}");

        let mut out = Vec::new();
        let exported = export_pages(&mut scroll, &mut out).unwrap();
        assert_eq!(exported, 6);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], r#"{"_id":"0-0"}"#);
        assert_eq!(lines[5], r#"{"_id":"2-1"}"#);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("hits.jsonl");
        let client = Client::with_executor(
            ClientConfig::new(["http://node0:9200/"]),
            Box::new(PagedCluster { pages: 1, served: 0 }),
        )
        .unwrap();
        let options = ScrollOptions {
            index: "idx".into(),
            doc_type: "_doc".into(),
            query: r#"{"query": {"match_all": {}}}"#.into(),
            size: 10,
            ttl: "1m".into(),
            scan: false,
            shards: 0,
            output: Some(output.clone()),
        };

        assert_eq!(run_scroll(client.into_shared(), &options).unwrap(), 2);
        let written = std::fs::read_to_string(output).unwrap();
        assert_eq!(written.lines().count(), 2);
    }
}
